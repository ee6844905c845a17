//! Shared application state.

use std::sync::Arc;
use std::time::Instant;

use mindmap_core::MindmapConfig;
use mindmap_llm::{LLMConfig, LlmClient, ProviderSummary};
use mindmap_pipeline::{MindmapGenerator, MindmapService};
use tracing::{info, warn};

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: MindmapConfig,
    /// Provider selection as resolved at startup (no API keys).
    pub llm: ProviderSummary,
    /// `None` when no LLM credential is configured.
    pub service: Option<MindmapService>,
    pub started_at: Instant,
}

impl AppState {
    /// Build state from loaded configuration, wiring the HTTP completion
    /// client when a provider resolves.
    pub fn new(config: MindmapConfig, llm_config: &LLMConfig) -> Self {
        let service = match llm_config.require_provider() {
            Ok(resolved) => match LlmClient::new(&resolved) {
                Ok(client) => {
                    info!(
                        provider = %resolved.provider,
                        primary = %resolved.models.primary,
                        fast = %resolved.models.fast,
                        "LLM provider configured"
                    );
                    let generator = MindmapGenerator::new(Arc::new(client), resolved.models);
                    Some(MindmapService::new(generator))
                }
                Err(e) => {
                    warn!("Failed to build LLM client: {}", e);
                    None
                }
            },
            Err(e) => {
                warn!("{}", e);
                None
            }
        };

        Self::with_service(config, llm_config.summary(), service)
    }

    pub fn with_service(
        config: MindmapConfig,
        llm: ProviderSummary,
        service: Option<MindmapService>,
    ) -> Self {
        Self {
            config,
            llm,
            service,
            started_at: Instant::now(),
        }
    }

    pub fn service(&self) -> mindmap_core::Result<&MindmapService> {
        self.service.as_ref().ok_or_else(|| {
            mindmap_core::Error::MissingCredential(
                "set ANTHROPIC_API_KEY, OPENAI_API_KEY or GROQ_API_KEY".into(),
            )
        })
    }
}
