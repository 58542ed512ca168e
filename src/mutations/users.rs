use chrono::Utc;

use super::Mutations;
use crate::constants::ERR_INVALID_NAME;
use crate::error::{AppError, Result};
use crate::models::{User, UserId, UserUpdate};
use crate::store::StoreError;

/// Name collisions surface as `UserAlreadyExists`; everything else maps as usual
fn map_name_conflict(err: StoreError) -> AppError {
    match err {
        StoreError::Conflict { .. } => AppError::UserAlreadyExists,
        other => other.into(),
    }
}

impl Mutations {
    /// Create a user from an already-hashed password
    pub async fn register(&self, name: String, password_hash: String) -> Result<User> {
        if !User::validate_name(&name) {
            return Err(AppError::InvalidInput(ERR_INVALID_NAME.into()));
        }

        let user = User::new(name, password_hash, Utc::now());
        self.store
            .insert_user(&user)
            .await
            .map_err(map_name_conflict)?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Apply a partial profile update. Fields absent from `update` are kept.
    pub async fn update_profile(&self, user_id: UserId, update: UserUpdate) -> Result<User> {
        if let Some(name) = &update.name
            && !User::validate_name(name)
        {
            return Err(AppError::InvalidInput(ERR_INVALID_NAME.into()));
        }

        let user = self
            .store
            .update_user(user_id, &update, Utc::now())
            .await
            .map_err(map_name_conflict)?;

        tracing::info!(
            user_id = %user_id,
            name_changed = update.name.is_some(),
            password_changed = update.password_hash.is_some(),
            avatar_changed = update.avatar.is_some(),
            "Profile updated"
        );
        Ok(user)
    }

    /// Remove a user record.
    ///
    /// Posts, likes and notifications that reference the user are left as is.
    pub async fn delete_user(&self, user_id: UserId) -> Result<()> {
        self.store.delete_user(user_id).await?;
        tracing::info!(user_id = %user_id, "User deleted");
        Ok(())
    }
}
