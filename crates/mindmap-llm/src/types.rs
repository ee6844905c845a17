//! Provider and model types shared by the config and the client.

use serde::{Deserialize, Serialize};

/// LLM provider identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LLMProvider {
    OpenAI,
    Anthropic,
    Groq,
}

impl LLMProvider {
    /// API root used when no base URL override is configured.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            LLMProvider::OpenAI => "https://api.openai.com/v1",
            LLMProvider::Anthropic => "https://api.anthropic.com/v1",
            LLMProvider::Groq => "https://api.groq.com/openai/v1",
        }
    }
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::Groq => write!(f, "groq"),
        }
    }
}

/// Which of a provider's two models a call should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    /// Larger model for open-ended generation.
    Primary,
    /// Cheaper model for restructuring and checking.
    Fast,
}

/// The pair of model ids a pipeline run draws from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageModels {
    pub primary: String,
    pub fast: String,
}

impl StageModels {
    pub fn new(primary: impl Into<String>, fast: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            fast: fast.into(),
        }
    }

    pub fn for_tier(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Primary => &self.primary,
            ModelTier::Fast => &self.fast,
        }
    }
}

/// Everything needed to build a client for one provider.
#[derive(Debug, Clone)]
pub struct ResolvedProvider {
    pub provider: LLMProvider,
    pub api_key: String,
    pub models: StageModels,
    pub base_url: String,
    pub timeout_secs: u64,
}

/// Public view of the active provider (no API keys exposed).
#[derive(Debug, Clone, Serialize)]
pub struct ProviderSummary {
    #[serde(rename = "preferredProvider")]
    pub preferred_provider: String,
    #[serde(rename = "activeProvider")]
    pub active_provider: Option<String>,
    #[serde(rename = "anthropicConfigured")]
    pub anthropic_configured: bool,
    #[serde(rename = "openaiConfigured")]
    pub openai_configured: bool,
    #[serde(rename = "groqConfigured")]
    pub groq_configured: bool,
    pub models: Option<StageModels>,
}
