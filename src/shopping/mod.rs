//! Shopping lists and their items.
//!
//! A list is addressed only by its share id; whoever has the link can read and
//! edit it. Items carry free-form quantity, category and attribution text plus
//! an optional image kept in the [`ImageStore`](crate::images::ImageStore).
//!
//! # Usage
//!
//! ```rust,ignore
//! use sharelist::shopping;
//!
//! let app = Router::new()
//!     .nest("/api", shopping::routes())
//!     .with_state(app_state);
//!
//! // Or use the services directly
//! let share_id = shopping::ListService::new(&db).create_list().await?;
//! let item = shopping::ItemService::new(&db, &images)
//!     .create_item(&share_id, &form, None)
//!     .await?;
//! ```

pub mod form;
mod handler;
mod items;
mod lists;
mod routes;

pub use form::{ImageUpload, ItemForm, ItemSubmission};
pub use handler::{CompletedRequest, SuccessResponse};
pub use items::ItemService;
pub use lists::{ListService, SHARE_ID_LEN, generate_share_id};
pub use routes::routes;
