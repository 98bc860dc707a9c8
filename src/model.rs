use chrono::{DateTime, Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_LIST_NAME: &str = "Family list";
pub const DEFAULT_QUANTITY: &str = "1";
pub const DEFAULT_CATEGORY: &str = "Other";

/// Shift applied to item timestamps when they are rendered; storage keeps UTC.
pub const DISPLAY_OFFSET_HOURS: i64 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingList {
    pub id: i64,
    pub name: String,
    pub share_id: String,
    pub created_at: String,
}

/// A stored row of `list_items`, timestamps exactly as persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub id: i64,
    pub list_id: i64,
    pub text: String,
    pub quantity: String,
    pub category: String,
    pub added_by: String,
    pub description: Option<String>,
    pub image_filename: Option<String>,
    pub completed: bool,
    pub urgent: bool,
    pub created_at: String,
}

/// Column values written on insert and on full-replace update.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFields {
    pub text: String,
    pub quantity: String,
    pub category: String,
    pub added_by: String,
    pub description: String,
    pub urgent: bool,
}

/// JSON rendering of an item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemView {
    pub id: i64,
    pub text: String,
    pub quantity: String,
    pub category: String,
    pub added_by: String,
    pub created_at: String,
    pub description: Option<String>,
    pub image_filename: Option<String>,
    pub completed: bool,
    pub urgent: bool,
}

impl From<ListItem> for ItemView {
    fn from(item: ListItem) -> Self {
        ItemView {
            created_at: display_timestamp(&item.created_at),
            id: item.id,
            text: item.text,
            quantity: item.quantity,
            category: item.category,
            added_by: item.added_by,
            description: item.description,
            image_filename: item.image_filename,
            completed: item.completed,
            urgent: item.urgent,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListStats {
    pub total_items: usize,
    pub completed_items: usize,
    pub categories: BTreeMap<String, usize>,
}

impl ListStats {
    pub fn from_items(items: &[ListItem]) -> Self {
        let mut stats = ListStats {
            total_items: 0,
            completed_items: 0,
            categories: BTreeMap::new(),
        };

        for item in items {
            stats.total_items += 1;
            if item.completed {
                stats.completed_items += 1;
            }
            *stats.categories.entry(item.category.clone()).or_insert(0) += 1;
        }

        stats
    }
}

/// Renders a stored timestamp shifted by [`DISPLAY_OFFSET_HOURS`], without an offset suffix.
/// Values that do not parse are passed through untouched.
pub fn display_timestamp(stored: &str) -> String {
    let naive = DateTime::parse_from_rfc3339(stored)
        .map(|dt| dt.naive_utc())
        .or_else(|_| NaiveDateTime::parse_from_str(stored, "%Y-%m-%d %H:%M:%S%.f"));

    match naive {
        Ok(ts) => (ts + Duration::hours(DISPLAY_OFFSET_HOURS))
            .format("%Y-%m-%dT%H:%M:%S%.3f")
            .to_string(),
        Err(_) => stored.to_string(),
    }
}
