//! HTTP handlers for the list and item API

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};

use super::form::{ItemSubmission, parse_item_id};
use super::{ItemService, ListService};
use crate::error::{ShopError, ShopResult};
use crate::handler::AppState;
use crate::model::{ItemView, ListStats, ShoppingList};

#[derive(Debug, Deserialize)]
pub struct CompletedRequest {
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SuccessResponse {
    pub success: bool,
}

fn success() -> Json<SuccessResponse> {
    Json(SuccessResponse { success: true })
}

pub async fn get_list(
    State(state): State<AppState>,
    Path(share_id): Path<String>,
) -> ShopResult<Json<ShoppingList>> {
    let list = ListService::new(&state.db).get_list(&share_id).await?;
    Ok(Json(list))
}

pub async fn delete_list(
    State(state): State<AppState>,
    Path(share_id): Path<String>,
) -> ShopResult<Json<SuccessResponse>> {
    ListService::new(&state.db).delete_list(&share_id).await?;
    Ok(success())
}

pub async fn get_statistics(
    State(state): State<AppState>,
    Path(share_id): Path<String>,
) -> ShopResult<Json<ListStats>> {
    let stats = ListService::new(&state.db).get_statistics(&share_id).await?;
    Ok(Json(stats))
}

pub async fn list_items(
    State(state): State<AppState>,
    Path(share_id): Path<String>,
) -> ShopResult<Json<Vec<ItemView>>> {
    let items = ItemService::new(&state.db, &state.images)
        .list_items(&share_id)
        .await?;
    Ok(Json(items))
}

pub async fn create_item(
    State(state): State<AppState>,
    Path(share_id): Path<String>,
    submission: ItemSubmission,
) -> ShopResult<Json<ItemView>> {
    let item = ItemService::new(&state.db, &state.images)
        .create_item(&share_id, &submission.form, submission.image.as_ref())
        .await?;
    Ok(Json(item))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path(share_id): Path<String>,
    submission: ItemSubmission,
) -> ShopResult<Json<ItemView>> {
    let item = ItemService::new(&state.db, &state.images)
        .update_item(&share_id, &submission.form, submission.image.as_ref())
        .await?;
    Ok(Json(item))
}

pub async fn set_completed(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
    payload: Result<Json<CompletedRequest>, JsonRejection>,
) -> ShopResult<Json<SuccessResponse>> {
    let item_id = parse_item_id(&item_id)?;
    let Json(payload) = payload.map_err(|e| ShopError::Validation(e.body_text()))?;
    ItemService::new(&state.db, &state.images)
        .set_completed(item_id, payload.completed)
        .await?;
    Ok(success())
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> ShopResult<Json<SuccessResponse>> {
    ItemService::new(&state.db, &state.images)
        .delete_item(parse_item_id(&item_id)?)
        .await?;
    Ok(success())
}
