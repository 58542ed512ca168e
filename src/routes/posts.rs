use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use super::parse_id;
use crate::AppState;
use crate::constants::WARN_PROFILE_LAGGING;
use crate::error::Result;
use crate::identity::Principal;
use crate::models::{Post, PostFilter, PostId, PostUpdate, UserId};
use crate::mutations::{LikeReceipt, UserIndex};

#[derive(Debug, Deserialize)]
pub struct PostRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: PostId,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub data: Post,
}

#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub data: Vec<Post>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub detail: &'static str,
    #[serde(flatten)]
    pub receipt: LikeReceipt,
}

impl From<Vec<Post>> for PostListResponse {
    fn from(data: Vec<Post>) -> Self {
        Self {
            count: data.len(),
            data,
        }
    }
}

/// Create a post authored by the caller
///
/// Returns 207 with the post id if the post was stored but could not be
/// linked into the author's profile.
pub async fn create_post(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<PostRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    let post = state
        .mutations
        .create_post(principal.user_id, payload.content)
        .await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id: post.id })))
}

pub async fn list_posts(
    State(state): State<AppState>,
    _principal: Principal,
) -> Result<Json<PostListResponse>> {
    let posts = state.store.find_posts(PostFilter::All).await?;
    Ok(Json(posts.into()))
}

pub async fn get_post(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<PostResponse>> {
    let id = parse_id(&id, PostId::parse)?;
    let post = state.store.get_post(id).await?;
    Ok(Json(PostResponse { data: post }))
}

/// Posts written by one user, oldest first
pub async fn list_profile_posts(
    State(state): State<AppState>,
    _principal: Principal,
    Path(profile_id): Path<String>,
) -> Result<Json<PostListResponse>> {
    let profile_id = parse_id(&profile_id, UserId::parse)?;
    // 404 for unknown profiles rather than an empty list
    state.store.get_user(profile_id).await?;

    let posts = state
        .store
        .find_posts(PostFilter::ByAuthor(profile_id))
        .await?;
    Ok(Json(posts.into()))
}

pub async fn update_post(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    Json(payload): Json<PostRequest>,
) -> Result<Json<PostResponse>> {
    let id = parse_id(&id, PostId::parse)?;
    let update = PostUpdate {
        content: Some(payload.content),
    };

    let post = state
        .mutations
        .update_post(principal.user_id, id, update)
        .await?;
    Ok(Json(PostResponse { data: post }))
}

pub async fn delete_post(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = parse_id(&id, PostId::parse)?;
    state.mutations.delete_post(principal.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Like a post as the caller
///
/// Returns 409 if the caller already liked it.
pub async fn like_post(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<LikeResponse>> {
    let id = parse_id(&id, PostId::parse)?;
    let receipt = state.mutations.like_post(id, principal.user_id).await?;

    let detail = match receipt.user_index {
        UserIndex::Synced => "Post liked successfully",
        UserIndex::Lagging => WARN_PROFILE_LAGGING,
    };

    Ok(Json(LikeResponse { detail, receipt }))
}
