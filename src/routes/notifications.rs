use axum::{Json, extract::State};
use serde::Serialize;

use crate::AppState;
use crate::error::Result;
use crate::identity::Principal;
use crate::models::Notification;

#[derive(Debug, Serialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<Notification>,
    pub count: usize,
    pub purged: bool,
}

/// Deliver and clear the caller's notifications
pub async fn read_notifications(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<NotificationsResponse>> {
    let batch = state
        .mutations
        .read_and_clear_notifications(principal.user_id)
        .await?;

    Ok(Json(NotificationsResponse {
        count: batch.notifications.len(),
        notifications: batch.notifications,
        purged: batch.purged,
    }))
}
