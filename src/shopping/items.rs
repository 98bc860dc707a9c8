use crate::db::Database;
use crate::error::{ShopError, ShopResult};
use crate::images::ImageStore;
use crate::model::ItemView;

use super::form::{ImageUpload, ItemForm};
use super::lists::ListService;

pub struct ItemService<'a> {
    db: &'a Database,
    images: &'a ImageStore,
}

impl<'a> ItemService<'a> {
    pub fn new(db: &'a Database, images: &'a ImageStore) -> Self {
        Self { db, images }
    }

    pub async fn list_items(&self, share_id: &str) -> ShopResult<Vec<ItemView>> {
        let list = ListService::new(self.db).get_list(share_id).await?;
        let items = self.db.list_items(list.id).await?;
        Ok(items.into_iter().map(ItemView::from).collect())
    }

    /// Stores an uploaded image if it is acceptable. Rejected images are dropped
    /// silently and the item goes on without one.
    async fn store_image(&self, image: Option<&ImageUpload>) -> ShopResult<Option<String>> {
        match image {
            Some(upload) => Ok(self.images.save(&upload.data, upload.filename.as_deref()).await?),
            None => Ok(None),
        }
    }

    pub async fn create_item(
        &self,
        share_id: &str,
        form: &ItemForm,
        image: Option<&ImageUpload>,
    ) -> ShopResult<ItemView> {
        let list = ListService::new(self.db).get_list(share_id).await?;
        let fields = form.to_fields()?;

        let image_filename = self.store_image(image).await?;
        let item = self
            .db
            .insert_item(list.id, &fields, image_filename.as_deref())
            .await?;

        tracing::info!(share_id, item_id = item.id, "created item");
        Ok(item.into())
    }

    /// Full replace of the item named by the form's `item_id`, which must belong to
    /// `share_id`'s list. Items of other lists are reported as not found.
    pub async fn update_item(
        &self,
        share_id: &str,
        form: &ItemForm,
        image: Option<&ImageUpload>,
    ) -> ShopResult<ItemView> {
        let list = ListService::new(self.db).get_list(share_id).await?;
        let item_id = form.item_id()?;
        let existing = self
            .db
            .get_item_in_list(list.id, item_id)
            .await?
            .ok_or(ShopError::NotFound("item"))?;
        let fields = form.to_fields()?;

        let mut image_filename = existing.image_filename.clone();
        if let Some(stored) = self.store_image(image).await? {
            if let Some(old) = &existing.image_filename {
                self.images.delete(old).await?;
            }
            image_filename = Some(stored);
        } else if form.remove_image {
            if let Some(old) = &existing.image_filename {
                self.images.delete(old).await?;
            }
            image_filename = None;
        }

        let item = self
            .db
            .update_item(existing.id, &fields, image_filename.as_deref())
            .await?
            .ok_or(ShopError::NotFound("item"))?;

        tracing::info!(share_id, item_id, "updated item");
        Ok(item.into())
    }

    pub async fn set_completed(&self, item_id: i64, completed: bool) -> ShopResult<()> {
        if !self.db.set_completed(item_id, completed).await? {
            return Err(ShopError::NotFound("item"));
        }
        Ok(())
    }

    /// Deletes the row only; an attached image file is left in the store.
    pub async fn delete_item(&self, item_id: i64) -> ShopResult<()> {
        if !self.db.delete_item(item_id).await? {
            return Err(ShopError::NotFound("item"));
        }
        tracing::info!(item_id, "deleted item");
        Ok(())
    }
}
