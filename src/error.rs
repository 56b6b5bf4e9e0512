use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use thiserror::Error;
use tracing::error;

use crate::models::MessageResponse;

pub const GENERIC_FAILURE: &str = "Something went wrong, please try again later";
pub const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(&'static str),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The message is shown to the client as-is; log the cause before
    /// building this variant.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) | AppError::Precondition(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::Unauthorized(msg) => msg.to_string(),
            AppError::Validation(msg) | AppError::Precondition(msg) => msg,
            AppError::Database(e) => {
                error!("database error: {}", e);
                GENERIC_FAILURE.to_string()
            }
            AppError::Internal(msg) => msg,
        };

        (status, Json(MessageResponse::failure(message))).into_response()
    }
}
