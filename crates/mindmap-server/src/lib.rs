//! HTTP server for the mindmap generator.

pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
