//! Mindmap generator: prompt in, mindmap XML out.

use std::path::PathBuf;
use std::sync::Arc;

use mindmap_core::MindmapConfig;
use mindmap_llm::LLMConfig;
use mindmap_server::{build_router, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn resolve_data_dir() -> PathBuf {
    std::env::var("MINDMAP_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = MindmapConfig::from_env(&data_dir)?;
    let llm_config = LLMConfig::load(&config.data_paths.llm_config_file);
    let addr = config.bind_addr();

    let state = Arc::new(AppState::new(config, &llm_config));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Mindmap server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
