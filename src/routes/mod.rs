pub mod auth;
pub mod health;
pub mod notifications;
pub mod posts;
pub mod users;

pub use health::health_check;

use crate::constants::{ERR_INVALID_ID, ERR_INVALID_PASSWORD};
use crate::error::{AppError, Result};
use crate::models::User;

/// Parse a path segment into a typed record id
pub(crate) fn parse_id<T>(raw: &str, parse: impl FnOnce(&str) -> Option<T>) -> Result<T> {
    parse(raw).ok_or_else(|| {
        tracing::warn!("Invalid id in path: {}", raw);
        AppError::InvalidInput(ERR_INVALID_ID.to_string())
    })
}

pub(crate) fn validate_password(password: &str) -> Result<()> {
    if User::validate_password(password) {
        Ok(())
    } else {
        Err(AppError::InvalidInput(ERR_INVALID_PASSWORD.to_string()))
    }
}
