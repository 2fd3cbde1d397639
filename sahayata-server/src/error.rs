//! Server error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sahayata_core::ValidationErrors;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("User already registered")]
    EmailAlreadyExists,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Row not found")]
    RowNotFound,

    #[error("Duplicate row id: {0}")]
    DuplicateRow(String),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ValidationErrors> for ServerError {
    fn from(errors: ValidationErrors) -> Self {
        ServerError::Validation(errors)
    }
}

impl From<rusqlite::Error> for ServerError {
    fn from(e: rusqlite::Error) -> Self {
        ServerError::Internal(e.to_string())
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(e: serde_json::Error) -> Self {
        ServerError::Internal(e.to_string())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid login credentials".to_string())
            }
            ServerError::EmailAlreadyExists => {
                (StatusCode::CONFLICT, "User already registered".to_string())
            }
            ServerError::NotAuthenticated => {
                (StatusCode::UNAUTHORIZED, "Not authenticated".to_string())
            }
            ServerError::Forbidden(msg) => {
                tracing::debug!("Permission denied: {}", msg);
                (StatusCode::FORBIDDEN, msg.clone())
            }
            ServerError::UnknownCollection(name) => (
                StatusCode::NOT_FOUND,
                format!("relation \"{}\" does not exist", name),
            ),
            ServerError::RowNotFound => (StatusCode::NOT_FOUND, "Row not found".to_string()),
            ServerError::DuplicateRow(_) => (
                StatusCode::CONFLICT,
                "duplicate key value violates unique constraint".to_string(),
            ),
            ServerError::Validation(errors) => {
                let body = json!({
                    "success": false,
                    "reason": "Validation failed",
                    "errors": errors,
                });
                return (StatusCode::BAD_REQUEST, axum::Json(body)).into_response();
            }
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServerError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = json!({ "success": false, "reason": message });
        (status, axum::Json(body)).into_response()
    }
}
