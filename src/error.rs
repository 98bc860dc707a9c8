use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::unpack_error;

#[derive(Debug, thiserror::Error)]
pub enum ShopError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("database error: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("image store error: {0}")]
    Image(#[from] std::io::Error),
}

pub type ShopResult<T> = Result<T, ShopError>;

impl ShopError {
    pub fn status(&self) -> StatusCode {
        use ShopError::*;
        match self {
            NotFound(_) => StatusCode::NOT_FOUND,
            Validation(_) => StatusCode::BAD_REQUEST,
            Storage(_) | Image(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ShopError {
    /// Client-facing message; server errors carry their whole source chain.
    pub fn message(&self) -> String {
        match self {
            ShopError::Storage(e) => {
                let err: &(dyn std::error::Error + 'static) = e.as_ref();
                format!("database error: {}", unpack_error(err))
            }
            ShopError::Image(e) => format!("image store error: {}", unpack_error(e)),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// JSON `{"error": ...}` body with the given status.
pub fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorResponse { error: message })).into_response()
}

impl IntoResponse for ShopError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!(error = %message, "request failed");
        }

        error_response(status, message)
    }
}
