//! Mindmap generation and markup validation routes.

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use super::error_response;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/generate", post(generate))
        .route("/validate", post(validate))
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub markup: String,
}

/// POST /api/generate: run the pipeline for one prompt.
async fn generate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Response {
    let service = match state.service() {
        Ok(service) => service,
        Err(e) => return error_response(&e),
    };
    if let Err(e) = state.config.check_prompt(&req.prompt) {
        return error_response(&e);
    }

    let preview: String = req.prompt.chars().take(50).collect();
    info!("Generating mindmap for prompt: '{}'", preview);

    match service.generate(&req.prompt).await {
        Ok(response) => {
            info!(
                "Mindmap generated in {:.2}s ({} nodes)",
                response.processing_time_seconds, response.metadata.total_nodes
            );
            Json(response).into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// POST /api/validate: parse check with one model repair attempt.
async fn validate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ValidateRequest>,
) -> Response {
    match state.service() {
        Ok(service) => Json(service.validate_markup(&req.markup).await).into_response(),
        Err(e) => error_response(&e),
    }
}
