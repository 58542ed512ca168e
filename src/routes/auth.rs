use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validate_password;
use crate::AppState;
use crate::error::Result;
use crate::identity::Principal;
use crate::models::UserId;

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub name: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: UserId,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Register a new user
///
/// Returns 409 Conflict if the name is taken.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    validate_password(&payload.password)?;

    let password_hash = state.identity.hash_password(payload.password).await?;
    let user = state.mutations.register(payload.name, password_hash).await?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { id: user.id })))
}

/// Exchange a name and password for a bearer token
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<LoginResponse>> {
    let issued = state.identity.login(&payload.name, payload.password).await?;

    Ok(Json(LoginResponse {
        token: issued.token,
        expires_at: issued.expires_at,
    }))
}

pub async fn logout(State(state): State<AppState>, principal: Principal) -> Result<StatusCode> {
    state.identity.logout(&principal).await?;
    Ok(StatusCode::NO_CONTENT)
}
