// ============================
// signaling-lib/src/handlers/admin.rs
// ============================
//! Read-only admin endpoints. Neither mutates any state.

use crate::registry::RegistryStats;
use crate::AppState;
use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().timestamp_millis(),
    }))
}

/// `GET /stats`
pub async fn stats(State(state): State<Arc<AppState>>) -> Json<RegistryStats> {
    Json(state.registry.stats())
}
