use axum::{
    Router,
    routing::{delete, get, post, put},
};

use super::handler;
use crate::handler::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/list/:share_id", get(handler::get_list))
        .route("/list/:share_id", delete(handler::delete_list))
        .route("/list/:share_id/items", get(handler::list_items))
        .route("/list/:share_id/items", post(handler::create_item))
        .route("/list/:share_id/items", put(handler::update_item))
        .route("/list/:share_id/stats", get(handler::get_statistics))
        .route("/item/:item_id", put(handler::set_completed))
        .route("/item/:item_id", delete(handler::delete_item))
}
