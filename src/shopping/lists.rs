use rand::{Rng, distributions::Alphanumeric};

use crate::db::Database;
use crate::error::{ShopError, ShopResult};
use crate::model::{DEFAULT_LIST_NAME, ListStats, ShoppingList};

pub const SHARE_ID_LEN: usize = 10;

/// Random URL-safe share id. Collisions are left to the unique index.
pub fn generate_share_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SHARE_ID_LEN)
        .map(char::from)
        .collect()
}

pub struct ListService<'a> {
    db: &'a Database,
}

impl<'a> ListService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn create_list(&self) -> ShopResult<String> {
        let share_id = generate_share_id();
        let list = self.db.create_list(&share_id, DEFAULT_LIST_NAME).await?;
        tracing::info!(share_id = %list.share_id, list_id = list.id, "created list");
        Ok(list.share_id)
    }

    pub async fn get_list(&self, share_id: &str) -> ShopResult<ShoppingList> {
        self.db
            .get_list_by_share_id(share_id)
            .await?
            .ok_or(ShopError::NotFound("list"))
    }

    pub async fn get_statistics(&self, share_id: &str) -> ShopResult<ListStats> {
        let list = self.get_list(share_id).await?;
        let items = self.db.list_items(list.id).await?;
        Ok(ListStats::from_items(&items))
    }

    /// Deletes the list and all of its items. Image files stay on disk.
    pub async fn delete_list(&self, share_id: &str) -> ShopResult<()> {
        let list = self.get_list(share_id).await?;
        self.db.delete_list(list.id).await?;
        tracing::info!(share_id, list_id = list.id, "deleted list");
        Ok(())
    }
}
