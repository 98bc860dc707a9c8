use crate::config::{Config, resolve_path};
use crate::model::*;
use anyhow::Result;
use libsql::{Builder, Connection, Database as LibsqlDatabase};
use std::path::Path;
use std::time::Duration;
use tokio::sync::Mutex;

const SYSTEM_MIGRATIONS: &[(&str, &str)] =
    &[("system/000_migrations_table.sql", include_str!("migrations/system/000_migrations_table.sql"))];

const MIGRATIONS: &[(&str, &str)] = &[("001_schema.sql", include_str!("migrations/001_schema.sql"))];

const LIST_COLUMNS: &str = "id, name, share_id, created_at";

const ITEM_COLUMNS: &str = "id, list_id, text, quantity, category, added_by, description, \
                            image_filename, completed, urgent, created_at";

/// Remote primary for libsql embedded-replica mode.
#[derive(Debug, Clone)]
pub struct Replica {
    pub url: String,
    pub auth_token: String,
    pub sync_interval: Duration,
}

pub struct Database {
    db: LibsqlDatabase,
    conn: Connection,
    /// Serializes BEGIN..COMMIT blocks on the shared connection. Plain statements
    /// from other requests do not take it and can land inside an open transaction.
    tx_lock: Mutex<()>,
    replica: bool,
}

impl Database {
    pub async fn sync(&self) -> Result<()> {
        if self.replica {
            self.db
                .sync()
                .await
                .map_err(|e| anyhow::anyhow!("sync failed: {}", e))?;
        }
        Ok(())
    }

    async fn is_migration_applied(conn: &Connection, name: &str) -> Result<bool> {
        let query = "SELECT 1 FROM _migrations WHERE name = ?";
        match conn.query(query, libsql::params![name]).await {
            Ok(mut rows) => Ok(rows.next().await?.is_some()),
            Err(e) => {
                if e.to_string().contains("no such table") {
                    Ok(false)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn record_migration(conn: &Connection, name: &str) -> Result<()> {
        let query = r#"
            INSERT INTO _migrations (name, applied_at)
            VALUES (?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        "#;
        conn.execute(query, libsql::params![name]).await?;
        Ok(())
    }

    async fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
        if Self::is_migration_applied(conn, name).await? {
            tracing::debug!("migration {} already applied, skipping", name);
            return Ok(());
        }

        tracing::info!("applying migration: {}", name);
        conn.execute_batch(sql)
            .await
            .map_err(|e| anyhow::anyhow!("failed to execute migration {name}: {e}"))?;

        Self::record_migration(conn, name).await?;
        Ok(())
    }

    /// Opens the database named in `cfg`, resolving a relative path against `data_dir`.
    pub async fn new(cfg: &Config, data_dir: &Path) -> Result<Self> {
        let path = resolve_path(data_dir, Path::new(cfg.app.get_db()));

        let replica = match (&cfg.app.turso_url, &cfg.app.turso_auth_token) {
            (Some(url), Some(token)) => Some(Replica {
                url: url.clone(),
                auth_token: token.clone(),
                sync_interval: Duration::from_secs(cfg.app.sync_interval_seconds),
            }),
            _ => None,
        };

        Self::open(&path, replica).await
    }

    pub async fn open(path: &Path, replica: Option<Replica>) -> Result<Self> {
        let is_replica = replica.is_some();
        let db = match replica {
            Some(replica) => {
                tracing::info!("[db] running in synced database mode (offline writes)");
                Builder::new_synced_database(path, replica.url, replica.auth_token)
                    .sync_interval(replica.sync_interval)
                    .build()
                    .await?
            }
            None => Builder::new_local(path).build().await?,
        };

        let conn = db.connect()?;
        conn.query("SELECT 1", ()).await?;

        for (filename, sql) in SYSTEM_MIGRATIONS {
            Self::run_migration(&conn, filename, sql).await?;
        }

        for (filename, sql) in MIGRATIONS {
            Self::run_migration(&conn, filename, sql).await?;
        }

        Ok(Database {
            db,
            conn,
            tx_lock: Mutex::new(()),
            replica: is_replica,
        })
    }

    pub async fn create_list(&self, share_id: &str, name: &str) -> Result<ShoppingList> {
        let query = format!(
            "INSERT INTO shopping_lists (share_id, name) VALUES (?, ?) RETURNING {LIST_COLUMNS}"
        );
        let mut rows = self.conn.query(&query, libsql::params![share_id, name]).await?;

        if let Some(row) = rows.next().await? {
            Self::row_to_list(&row)
        } else {
            anyhow::bail!("Failed to create list {}", share_id)
        }
    }

    pub async fn get_list_by_share_id(&self, share_id: &str) -> Result<Option<ShoppingList>> {
        let query = format!("SELECT {LIST_COLUMNS} FROM shopping_lists WHERE share_id = ?");
        let mut rows = self.conn.query(&query, libsql::params![share_id]).await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_list(&row)?)),
            None => Ok(None),
        }
    }

    /// Removes a list and its items in one transaction, items first.
    pub async fn delete_list(&self, list_id: i64) -> Result<()> {
        let _guard = self.tx_lock.lock().await;

        self.conn.execute("BEGIN TRANSACTION", ()).await?;

        let result = async {
            self.conn
                .execute("DELETE FROM list_items WHERE list_id = ?", libsql::params![list_id])
                .await?;
            self.conn
                .execute("DELETE FROM shopping_lists WHERE id = ?", libsql::params![list_id])
                .await?;
            Ok::<(), anyhow::Error>(())
        }
        .await;

        match result {
            Ok(_) => {
                self.conn.execute("COMMIT", ()).await?;
                Ok(())
            }
            Err(e) => {
                let _ = self.conn.execute("ROLLBACK", ()).await;
                Err(e)
            }
        }
    }

    pub async fn list_items(&self, list_id: i64) -> Result<Vec<ListItem>> {
        let query = format!("SELECT {ITEM_COLUMNS} FROM list_items WHERE list_id = ? ORDER BY id");
        let mut rows = self.conn.query(&query, libsql::params![list_id]).await?;
        let mut items = Vec::new();

        while let Some(row) = rows.next().await? {
            items.push(Self::row_to_item(&row)?);
        }

        Ok(items)
    }

    pub async fn get_item(&self, item_id: i64) -> Result<Option<ListItem>> {
        let query = format!("SELECT {ITEM_COLUMNS} FROM list_items WHERE id = ?");
        let mut rows = self.conn.query(&query, libsql::params![item_id]).await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_item(&row)?)),
            None => Ok(None),
        }
    }

    /// Looks an item up only within the given list.
    pub async fn get_item_in_list(&self, list_id: i64, item_id: i64) -> Result<Option<ListItem>> {
        let query = format!("SELECT {ITEM_COLUMNS} FROM list_items WHERE id = ? AND list_id = ?");
        let mut rows = self.conn.query(&query, libsql::params![item_id, list_id]).await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_item(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn insert_item(
        &self,
        list_id: i64,
        fields: &ItemFields,
        image_filename: Option<&str>,
    ) -> Result<ListItem> {
        let query = format!(
            r#"
            INSERT INTO list_items (list_id, text, quantity, category, added_by, description, image_filename, urgent)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {ITEM_COLUMNS}
            "#
        );

        let mut rows = self
            .conn
            .query(
                &query,
                libsql::params![
                    list_id,
                    fields.text.as_str(),
                    fields.quantity.as_str(),
                    fields.category.as_str(),
                    fields.added_by.as_str(),
                    fields.description.as_str(),
                    image_filename.map(|s| s.to_string()),
                    fields.urgent as i64
                ],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Self::row_to_item(&row)
        } else {
            anyhow::bail!("Failed to create item")
        }
    }

    /// Overwrites every editable column of an item.
    pub async fn update_item(
        &self,
        item_id: i64,
        fields: &ItemFields,
        image_filename: Option<&str>,
    ) -> Result<Option<ListItem>> {
        let query = format!(
            r#"
            UPDATE list_items
            SET text = ?, quantity = ?, category = ?, added_by = ?, description = ?,
                image_filename = ?, urgent = ?
            WHERE id = ?
            RETURNING {ITEM_COLUMNS}
            "#
        );

        let mut rows = self
            .conn
            .query(
                &query,
                libsql::params![
                    fields.text.as_str(),
                    fields.quantity.as_str(),
                    fields.category.as_str(),
                    fields.added_by.as_str(),
                    fields.description.as_str(),
                    image_filename.map(|s| s.to_string()),
                    fields.urgent as i64,
                    item_id
                ],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_item(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn set_completed(&self, item_id: i64, completed: bool) -> Result<bool> {
        let affected = self
            .conn
            .execute(
                "UPDATE list_items SET completed = ? WHERE id = ?",
                libsql::params![completed as i64, item_id],
            )
            .await?;
        Ok(affected > 0)
    }

    pub async fn delete_item(&self, item_id: i64) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM list_items WHERE id = ?", libsql::params![item_id])
            .await?;
        Ok(affected > 0)
    }

    fn row_to_list(row: &libsql::Row) -> Result<ShoppingList> {
        Ok(ShoppingList {
            id: row.get(0)?,
            name: row.get(1)?,
            share_id: row.get(2)?,
            created_at: row.get(3)?,
        })
    }

    fn row_to_item(row: &libsql::Row) -> Result<ListItem> {
        Ok(ListItem {
            id: row.get(0)?,
            list_id: row.get(1)?,
            text: row.get(2)?,
            quantity: row.get(3)?,
            category: row.get(4)?,
            added_by: row.get(5)?,
            description: row.get::<Option<String>>(6)?,
            image_filename: row.get::<Option<String>>(7)?,
            completed: row.get::<i64>(8)? != 0,
            urgent: row.get::<i64>(9)? != 0,
            created_at: row.get(10)?,
        })
    }
}
