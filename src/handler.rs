use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde_json::json;
use tracing::info;

use crate::assets;
use crate::db::Database;
use crate::error::ShopError;
use crate::images::ImageStore;
use crate::shopping::ListService;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub images: Arc<ImageStore>,
}

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    Json(json!({ "status": "ok" }))
}

pub async fn home_page() -> Response {
    assets::page("index.html")
}

pub async fn create_list(State(state): State<AppState>) -> Response {
    match ListService::new(&state.db).create_list().await {
        Ok(share_id) => Redirect::to(&format!("/list/{share_id}")).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to create list");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to create list: {e}"),
            )
                .into_response()
        }
    }
}

pub async fn show_list(State(state): State<AppState>, Path(share_id): Path<String>) -> Response {
    match ListService::new(&state.db).get_list(&share_id).await {
        Ok(list) => assets::render_list_page(&list),
        Err(ShopError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Html("<!doctype html><title>Not found</title><p>This list does not exist.</p>"),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, share_id = %share_id, "failed to load list");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to load list: {e}"),
            )
                .into_response()
        }
    }
}
