//! Liveness and readiness checks for the auction service.

use super::AppState;
use crate::db::migrations::{latest_version, schema_version};
use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::warn;

/// The process is up and serving requests.
pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok", "service": env!("CARGO_PKG_NAME")}))
}

/// The auction database answers and carries the schema this build expects.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match schema_version(state.repo().pool()).await {
        Ok(version) if version == latest_version() => (
            StatusCode::OK,
            Json(json!({"status": "ready", "schemaVersion": version})),
        ),
        Ok(version) => {
            warn!(schema_version = version, "Auction database schema is out of date");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "unavailable", "schemaVersion": version})),
            )
        }
        Err(e) => {
            warn!("Readiness check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "unavailable"})),
            )
        }
    }
}
