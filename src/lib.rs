use std::error::Error;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::Method,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::config::UploadConfig;
use crate::handler::{AppState, create_list, healthcheck, home_page, show_list};

pub mod assets;
pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod images;
pub mod model;
pub mod shopping;

/// Joins an error and its chain of sources into one `outer: inner: ...` line.
pub fn unpack_error(err: &(dyn Error)) -> String {
    let mut parts = Vec::new();
    parts.push(err.to_string());
    let mut current = err.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    parts.join(": ")
}

/// Full application router: pages, the JSON API, uploaded images, and embedded assets.
pub fn build_router(state: AppState, uploads: &UploadConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let images_dir = state.images.dir().to_path_buf();

    Router::new()
        .route("/", get(home_page))
        .route("/healthz", get(healthcheck))
        .route("/create_list", post(create_list))
        .route("/list/:share_id", get(show_list))
        .nest("/api", shopping::routes())
        .nest_service("/static/uploads", ServeDir::new(images_dir))
        .fallback(assets::serve_embedded)
        .layer(DefaultBodyLimit::max(uploads.max_bytes))
        .layer(cors)
        .with_state(state)
}
