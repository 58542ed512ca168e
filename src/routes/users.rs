use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use super::{parse_id, validate_password};
use crate::AppState;
use crate::constants::{ERR_AVATAR_TOO_LARGE, ERR_INVALID_AVATAR, MAX_AVATAR_BYTES};
use crate::error::{AppError, Result};
use crate::identity::Principal;
use crate::models::{Avatar, UserId, UserProfile, UserUpdate};

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserProfile>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct AvatarPayload {
    pub content_type: String,
    /// Base64-encoded image bytes
    pub data: String,
}

/// Profile edit. Missing or empty fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub avatar: Option<AvatarPayload>,
}

fn decode_avatar(payload: AvatarPayload) -> Result<Avatar> {
    if !payload.content_type.starts_with("image/") {
        return Err(AppError::InvalidInput(ERR_INVALID_AVATAR.to_string()));
    }
    let encoded = payload.data.trim();
    // Reject before decoding anything obviously oversized
    if encoded.len() / 4 * 3 > MAX_AVATAR_BYTES + 2 {
        return Err(AppError::InvalidInput(ERR_AVATAR_TOO_LARGE.to_string()));
    }

    let data = STANDARD
        .decode(encoded)
        .map_err(|_| AppError::InvalidInput(ERR_INVALID_AVATAR.to_string()))?;
    if data.len() > MAX_AVATAR_BYTES {
        return Err(AppError::InvalidInput(ERR_AVATAR_TOO_LARGE.to_string()));
    }

    Ok(Avatar {
        content_type: payload.content_type,
        data,
    })
}

fn require_self(principal: &Principal, target: UserId) -> Result<()> {
    if principal.user_id != target {
        tracing::warn!(caller = %principal.user_id, target = %target, "Rejected change to another user");
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub async fn list_users(
    State(state): State<AppState>,
    _principal: Principal,
) -> Result<Json<UserListResponse>> {
    let users: Vec<UserProfile> = state
        .store
        .list_users()
        .await?
        .iter()
        .map(UserProfile::from)
        .collect();

    Ok(Json(UserListResponse {
        count: users.len(),
        users,
    }))
}

pub async fn me(principal: Principal) -> Json<UserProfile> {
    Json(UserProfile::from(&principal.user))
}

pub async fn get_user(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>> {
    let id = parse_id(&id, UserId::parse)?;
    let user = state.store.get_user(id).await?;
    Ok(Json(UserProfile::from(&user)))
}

/// Partially update the caller's own profile
pub async fn update_user(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>> {
    let id = parse_id(&id, UserId::parse)?;
    require_self(&principal, id)?;

    let mut update = UserUpdate {
        name: payload.name.filter(|name| !name.is_empty()),
        ..Default::default()
    };

    if let Some(password) = payload.password.filter(|p| !p.is_empty()) {
        validate_password(&password)?;
        update.password_hash = Some(state.identity.hash_password(password).await?);
    }

    if let Some(avatar) = payload.avatar.filter(|a| !a.data.is_empty()) {
        update.avatar = Some(decode_avatar(avatar)?);
    }

    let user = state.mutations.update_profile(id, update).await?;
    Ok(Json(UserProfile::from(&user)))
}

/// Delete the caller's own account
pub async fn delete_user(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = parse_id(&id, UserId::parse)?;
    require_self(&principal, id)?;

    state.mutations.delete_user(id).await?;
    if let Err(e) = state.identity.logout(&principal).await {
        tracing::warn!(user_id = %id, "Account deleted but session not closed: {}", e);
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Raw avatar bytes with their stored content type
pub async fn get_avatar(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = parse_id(&id, UserId::parse)?;
    let avatar = state
        .store
        .get_user(id)
        .await?
        .avatar
        .ok_or(AppError::NotFound("Avatar"))?;

    Ok(([(header::CONTENT_TYPE, avatar.content_type)], avatar.data))
}
