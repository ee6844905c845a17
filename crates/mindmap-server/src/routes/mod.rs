//! HTTP route handlers.

pub mod generate;
pub mod health;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health::routes())
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(generate::routes())
        .merge(health::api_routes())
}

/// JSON `{ "error": ... }` with a status derived from the error kind.
pub(crate) fn error_response(err: &mindmap_core::Error) -> Response {
    let status = match err {
        mindmap_core::Error::EmptyPrompt | mindmap_core::Error::InvalidPrompt(_) => {
            StatusCode::BAD_REQUEST
        }
        mindmap_core::Error::MissingCredential(_) => StatusCode::SERVICE_UNAVAILABLE,
        mindmap_core::Error::Config(_) | mindmap_core::Error::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
}
