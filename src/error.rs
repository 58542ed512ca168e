use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Post already liked")]
    AlreadyLiked,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    /// The primary effect committed but a dependent step did not
    #[error("Partial failure for {resource} {id}: {reason}")]
    PartialFailure {
        resource: &'static str,
        id: String,
        reason: String,
    },

    #[error("Store call timed out")]
    Timeout,

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, .. } => AppError::NotFound(match collection {
                crate::store::Collection::Users => "User",
                crate::store::Collection::Posts => "Post",
                crate::store::Collection::Notifications => "Notification",
                crate::store::Collection::Sessions => "Session",
                crate::store::Collection::History => "History entry",
            }),
            StoreError::Conflict { reason, .. } => AppError::Conflict(reason),
            StoreError::Timeout { .. } => AppError::Timeout,
            other => AppError::StoreUnavailable(other.to_string()),
        }
    }
}

/// Implement IntoResponse to convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InvalidInput(ref msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            AppError::UserAlreadyExists => (StatusCode::CONFLICT, "User already exists".into()),
            AppError::AlreadyLiked => (StatusCode::CONFLICT, "Post already liked".into()),
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".into()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".into()),
            AppError::PartialFailure {
                resource,
                ref id,
                ref reason,
            } => {
                tracing::warn!("Partial failure for {} {}: {}", resource, id, reason);
                let body = Json(json!({
                    "error": format!("The {resource} change was saved, but a follow-up update failed"),
                    "id": id,
                }));
                return (StatusCode::MULTI_STATUS, body).into_response();
            }
            AppError::Timeout => {
                tracing::error!("Store call timed out");
                (StatusCode::GATEWAY_TIMEOUT, "Request timed out".into())
            }
            AppError::StoreUnavailable(ref e) => {
                tracing::error!("Store error: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Storage temporarily unavailable".into(),
                )
            }
            AppError::Internal(ref e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".into(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;
