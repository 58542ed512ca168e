use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::AppState;

/// Health check endpoint
///
/// Reports whether the store answers a ping within the point timeout.
/// Used by load balancers and monitoring systems.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let db_status = match state.store.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::error!("Store health check failed: {}", e);
            "disconnected"
        }
    };

    Json(json!({
        "status": if db_status == "connected" { "healthy" } else { "unhealthy" },
        "database": db_status,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
