//! Liveness and generator status routes.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new().route("/status", get(status))
}

/// GET /health
async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "apiKeyConfigured": state.service.is_some(),
        "provider": state.llm.active_provider,
    }))
}

/// GET /api/status
async fn status(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let models = state
        .service
        .as_ref()
        .map(|service| service.generator().models().clone());

    Json(serde_json::json!({
        "generatorReady": state.service.is_some(),
        "provider": state.llm.active_provider,
        "preferredProvider": state.llm.preferred_provider,
        "models": models,
        "llm": state.llm,
        "uptimeSeconds": state.started_at.elapsed().as_secs(),
    }))
}
