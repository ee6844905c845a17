//! LLM configuration persistence and provider selection.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::types::{LLMProvider, ProviderSummary, ResolvedProvider, StageModels};

pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_ANTHROPIC_FAST_MODEL: &str = "claude-3-5-haiku-20241022";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_OPENAI_FAST_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_GROQ_FAST_MODEL: &str = "llama-3.1-8b-instant";

pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// LLM configuration read from llm-config.json.
#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    #[serde(default = "default_preferred")]
    pub preferred_provider: String,
    #[serde(default)]
    pub anthropic_api_key: Option<String>,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub groq_api_key: Option<String>,
    #[serde(default = "default_anthropic_model")]
    pub anthropic_model: String,
    #[serde(default = "default_anthropic_fast_model")]
    pub anthropic_fast_model: String,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_openai_fast_model")]
    pub openai_fast_model: String,
    #[serde(default = "default_groq_model")]
    pub groq_model: String,
    #[serde(default = "default_groq_fast_model")]
    pub groq_fast_model: String,
    /// Overrides the provider's API root (proxies, tests).
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_preferred() -> String {
    "auto".into()
}
fn default_anthropic_model() -> String {
    DEFAULT_ANTHROPIC_MODEL.into()
}
fn default_anthropic_fast_model() -> String {
    DEFAULT_ANTHROPIC_FAST_MODEL.into()
}
fn default_openai_model() -> String {
    DEFAULT_OPENAI_MODEL.into()
}
fn default_openai_fast_model() -> String {
    DEFAULT_OPENAI_FAST_MODEL.into()
}
fn default_groq_model() -> String {
    DEFAULT_GROQ_MODEL.into()
}
fn default_groq_fast_model() -> String {
    DEFAULT_GROQ_FAST_MODEL.into()
}
fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            preferred_provider: default_preferred(),
            anthropic_api_key: None,
            openai_api_key: None,
            groq_api_key: None,
            anthropic_model: default_anthropic_model(),
            anthropic_fast_model: default_anthropic_fast_model(),
            openai_model: default_openai_model(),
            openai_fast_model: default_openai_fast_model(),
            groq_model: default_groq_model(),
            groq_fast_model: default_groq_fast_model(),
            base_url: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl LLMConfig {
    /// Load config from file, falling back to env vars and defaults.
    pub fn load(config_path: &Path) -> Self {
        let mut config: LLMConfig = match std::fs::read_to_string(config_path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!("Ignoring unreadable {}: {}", config_path.display(), e);
                LLMConfig::default()
            }),
            Err(_) => {
                debug!("No LLM config at {}, using defaults", config_path.display());
                LLMConfig::default()
            }
        };

        // Env vars as fallback for API keys
        if config.anthropic_api_key.is_none() {
            config.anthropic_api_key = non_empty_env("ANTHROPIC_API_KEY");
        }
        if config.openai_api_key.is_none() {
            config.openai_api_key = non_empty_env("OPENAI_API_KEY");
        }
        if config.groq_api_key.is_none() {
            config.groq_api_key = non_empty_env("GROQ_API_KEY");
        }

        config
    }

    fn credentials(&self, provider: LLMProvider) -> Option<(&String, StageModels)> {
        let (key, primary, fast) = match provider {
            LLMProvider::Anthropic => (
                &self.anthropic_api_key,
                &self.anthropic_model,
                &self.anthropic_fast_model,
            ),
            LLMProvider::OpenAI => (&self.openai_api_key, &self.openai_model, &self.openai_fast_model),
            LLMProvider::Groq => (&self.groq_api_key, &self.groq_model, &self.groq_fast_model),
        };
        key.as_ref()
            .filter(|k| !k.trim().is_empty())
            .map(|k| (k, StageModels::new(primary.clone(), fast.clone())))
    }

    /// Resolve which provider, key and models to use.
    pub fn resolve_provider(&self) -> Option<ResolvedProvider> {
        let provider = match self.preferred_provider.as_str() {
            "anthropic" => Some(LLMProvider::Anthropic),
            "openai" => Some(LLMProvider::OpenAI),
            "groq" => Some(LLMProvider::Groq),
            "auto" => {
                // Auto mode: Anthropic > Groq > OpenAI
                [LLMProvider::Anthropic, LLMProvider::Groq, LLMProvider::OpenAI]
                    .into_iter()
                    .find(|p| self.credentials(*p).is_some())
            }
            _ => None,
        }?;

        let (api_key, models) = self.credentials(provider)?;
        Some(ResolvedProvider {
            provider,
            api_key: api_key.clone(),
            models,
            base_url: self
                .base_url
                .clone()
                .unwrap_or_else(|| provider.default_base_url().to_string()),
            timeout_secs: self.request_timeout_secs,
        })
    }

    /// Like [`resolve_provider`](Self::resolve_provider), but a missing key is an error.
    pub fn require_provider(&self) -> mindmap_core::Result<ResolvedProvider> {
        self.resolve_provider().ok_or_else(|| {
            mindmap_core::Error::MissingCredential(format!(
                "no API key for provider '{}' (set ANTHROPIC_API_KEY, OPENAI_API_KEY or GROQ_API_KEY)",
                self.preferred_provider
            ))
        })
    }

    /// Build the public summary (no API keys exposed).
    pub fn summary(&self) -> ProviderSummary {
        let resolved = self.resolve_provider();
        ProviderSummary {
            preferred_provider: self.preferred_provider.clone(),
            active_provider: resolved.as_ref().map(|r| r.provider.to_string()),
            anthropic_configured: self.credentials(LLMProvider::Anthropic).is_some(),
            openai_configured: self.credentials(LLMProvider::OpenAI).is_some(),
            groq_configured: self.credentials(LLMProvider::Groq).is_some(),
            models: resolved.map(|r| r.models),
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyless() -> LLMConfig {
        LLMConfig::default()
    }

    #[test]
    fn test_no_keys_resolves_nothing() {
        let config = keyless();
        assert!(config.resolve_provider().is_none());
        assert!(matches!(
            config.require_provider(),
            Err(mindmap_core::Error::MissingCredential(_))
        ));
    }

    #[test]
    fn test_auto_prefers_anthropic() {
        let config = LLMConfig {
            openai_api_key: Some("sk-openai".into()),
            anthropic_api_key: Some("sk-ant".into()),
            ..keyless()
        };
        let resolved = config.resolve_provider().unwrap();
        assert_eq!(resolved.provider, LLMProvider::Anthropic);
        assert_eq!(resolved.models.primary, DEFAULT_ANTHROPIC_MODEL);
        assert_eq!(resolved.models.fast, DEFAULT_ANTHROPIC_FAST_MODEL);
        assert_eq!(resolved.base_url, "https://api.anthropic.com/v1");
    }

    #[test]
    fn test_auto_groq_before_openai() {
        let config = LLMConfig {
            openai_api_key: Some("sk-openai".into()),
            groq_api_key: Some("gsk".into()),
            ..keyless()
        };
        assert_eq!(config.resolve_provider().unwrap().provider, LLMProvider::Groq);
    }

    #[test]
    fn test_explicit_provider_without_key() {
        let config = LLMConfig {
            preferred_provider: "openai".into(),
            anthropic_api_key: Some("sk-ant".into()),
            ..keyless()
        };
        assert!(config.resolve_provider().is_none());
    }

    #[test]
    fn test_blank_key_is_missing() {
        let config = LLMConfig {
            anthropic_api_key: Some("   ".into()),
            ..keyless()
        };
        assert!(config.resolve_provider().is_none());
        assert!(!config.summary().anthropic_configured);
    }

    #[test]
    fn test_base_url_override() {
        let config = LLMConfig {
            groq_api_key: Some("gsk".into()),
            base_url: Some("http://127.0.0.1:9999".into()),
            ..keyless()
        };
        assert_eq!(
            config.resolve_provider().unwrap().base_url,
            "http://127.0.0.1:9999"
        );
    }

    #[test]
    fn test_load_reads_file_models() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("llm-config.json");
        std::fs::write(
            &path,
            r#"{"preferred_provider": "anthropic", "anthropic_api_key": "sk-ant-file", "anthropic_fast_model": "claude-custom-fast"}"#,
        )
        .unwrap();

        let loaded = LLMConfig::load(&path);
        assert_eq!(loaded.preferred_provider, "anthropic");
        assert_eq!(loaded.anthropic_api_key.as_deref(), Some("sk-ant-file"));
        assert_eq!(loaded.anthropic_fast_model, "claude-custom-fast");
        assert_eq!(loaded.anthropic_model, DEFAULT_ANTHROPIC_MODEL);
    }

    #[test]
    fn test_malformed_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("llm-config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(LLMConfig::load(&path).preferred_provider, "auto");
    }

    #[test]
    fn test_summary_flags_each_provider() {
        let config = LLMConfig {
            groq_api_key: Some("gsk".into()),
            openai_api_key: Some("sk-openai".into()),
            ..keyless()
        };
        let summary = config.summary();
        assert!(!summary.anthropic_configured);
        assert!(summary.groq_configured);
        assert!(summary.openai_configured);
        assert_eq!(summary.active_provider.as_deref(), Some("groq"));
        assert_eq!(
            summary.models.map(|m| m.fast),
            Some(DEFAULT_GROQ_FAST_MODEL.to_string())
        );
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("llm-config.json");
        std::fs::write(&path, r#"{"preferred_provider": "groq"}"#).unwrap();

        let loaded = LLMConfig::load(&path);
        assert_eq!(loaded.preferred_provider, "groq");
        assert_eq!(loaded.groq_model, DEFAULT_GROQ_MODEL);
        assert_eq!(loaded.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
    }
}
