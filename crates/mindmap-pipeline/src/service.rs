//! Inbound operations: generate a mindmap, validate user-edited markup.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::markup;
use crate::pipeline::MindmapGenerator;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationMetadata {
    pub domain: String,
    pub complexity: String,
    pub total_nodes: usize,
    pub max_depth: u32,
    pub prompt_length: usize,
    pub markup_length: usize,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub markup: String,
    pub processing_time_seconds: f64,
    pub metadata: GenerationMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub valid: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrected_markup: Option<String>,
}

#[derive(Clone)]
pub struct MindmapService {
    generator: MindmapGenerator,
}

impl MindmapService {
    pub fn new(generator: MindmapGenerator) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &MindmapGenerator {
        &self.generator
    }

    /// Run the pipeline and describe the result.
    ///
    /// Metadata is read back out of the markup; fields the markup does not
    /// carry (or markup that does not parse) fall back to
    /// `general`/`intermediate`/0/0.
    pub async fn generate(&self, prompt: &str) -> mindmap_core::Result<GenerateResponse> {
        if prompt.trim().is_empty() {
            return Err(mindmap_core::Error::EmptyPrompt);
        }

        let started = Instant::now();
        let markup = self.generator.generate(prompt).await;
        let processing_time_seconds = started.elapsed().as_secs_f64();

        let summary = match markup::inspect(&markup) {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, "Could not read metadata from generated markup");
                Default::default()
            }
        };

        let metadata = GenerationMetadata {
            domain: summary.domain.unwrap_or_else(|| "general".into()),
            complexity: summary.complexity.unwrap_or_else(|| "intermediate".into()),
            total_nodes: summary.total_nodes.unwrap_or(0),
            max_depth: summary.max_depth.unwrap_or(0),
            prompt_length: prompt.chars().count(),
            markup_length: markup.chars().count(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        Ok(GenerateResponse {
            markup,
            processing_time_seconds,
            metadata,
        })
    }

    /// Check that `markup` parses. If it does not, ask the model once for a
    /// syntactic repair and re-check the result.
    pub async fn validate_markup(&self, markup: &str) -> ValidateResponse {
        let error = match markup::inspect(markup) {
            Ok(_) => {
                return ValidateResponse {
                    valid: true,
                    message: "Markup is valid".into(),
                    corrected_markup: Some(markup.to_string()),
                }
            }
            Err(e) => e,
        };
        info!(error = %error, "Markup invalid, requesting repair");

        match self.generator.repair_markup(markup).await {
            Ok(repaired) => match markup::inspect(&repaired) {
                Ok(_) => {
                    return ValidateResponse {
                        valid: true,
                        message: "Markup was invalid but has been auto-corrected".into(),
                        corrected_markup: Some(repaired),
                    }
                }
                Err(e) => warn!(error = %e, "Repaired markup is still invalid"),
            },
            Err(e) => warn!(error = %e, "Markup repair failed"),
        }

        ValidateResponse {
            valid: false,
            message: format!("Markup validation failed: {error}"),
            corrected_markup: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::{models, ok, ScriptedClient, CONCEPT_JSON, LAYOUT_JSON, MARKUP_XML};

    fn service(client: &Arc<ScriptedClient>) -> MindmapService {
        MindmapService::new(MindmapGenerator::new(client.clone(), models()))
    }

    #[tokio::test]
    async fn test_generate_reads_metadata_from_markup() {
        let client = Arc::new(ScriptedClient::new([
            ok(CONCEPT_JSON),
            ok(LAYOUT_JSON),
            ok(MARKUP_XML),
            ok(MARKUP_XML),
        ]));
        let prompt = "Explain how a coffee shop orders inventory";
        let response = service(&client).generate(prompt).await.unwrap();

        assert_eq!(response.markup, MARKUP_XML);
        assert_eq!(response.metadata.domain, "business_strategy");
        assert_eq!(response.metadata.complexity, "beginner");
        assert_eq!(response.metadata.total_nodes, 2);
        assert_eq!(response.metadata.max_depth, 1);
        assert_eq!(response.metadata.prompt_length, prompt.len());
        assert_eq!(response.metadata.markup_length, MARKUP_XML.len());
        assert!(response.processing_time_seconds >= 0.0);
    }

    #[tokio::test]
    async fn test_generate_defaults_when_markup_unreadable() {
        let client = Arc::new(ScriptedClient::new([
            ok(CONCEPT_JSON),
            ok(LAYOUT_JSON),
            ok("<mindmap>"),
            ok("<mindmap>"),
        ]));
        let response = service(&client)
            .generate("Explain how a coffee shop orders inventory")
            .await
            .unwrap();

        assert_eq!(response.markup, "<mindmap>");
        assert_eq!(response.metadata.domain, "general");
        assert_eq!(response.metadata.complexity, "intermediate");
        assert_eq!(response.metadata.total_nodes, 0);
        assert_eq!(response.metadata.max_depth, 0);
    }

    #[tokio::test]
    async fn test_generate_rejects_blank_prompt() {
        let client = Arc::new(ScriptedClient::failing());
        let err = service(&client).generate("   ").await.unwrap_err();
        assert!(matches!(err, mindmap_core::Error::EmptyPrompt));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_generate_response_is_camel_case() {
        let client = Arc::new(ScriptedClient::failing());
        let response = service(&client)
            .generate("Explain how a coffee shop orders inventory")
            .await
            .unwrap();
        let json = serde_json::to_value(&response).unwrap();

        assert!(json["processingTimeSeconds"].is_number());
        assert_eq!(json["metadata"]["totalNodes"], 1);
        assert_eq!(json["metadata"]["domain"], "general");
        assert!(json["metadata"]["promptLength"].is_number());
    }

    #[tokio::test]
    async fn test_validate_accepts_well_formed() {
        let client = Arc::new(ScriptedClient::failing());
        let response = service(&client).validate_markup(MARKUP_XML).await;

        assert!(response.valid);
        assert_eq!(response.message, "Markup is valid");
        assert_eq!(response.corrected_markup.as_deref(), Some(MARKUP_XML));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_validate_repairs_once() {
        let client = Arc::new(ScriptedClient::new([ok(MARKUP_XML)]));
        let response = service(&client).validate_markup("<mindmap><nodes></mindmap>").await;

        assert!(response.valid);
        assert_eq!(
            response.message,
            "Markup was invalid but has been auto-corrected"
        );
        assert_eq!(response.corrected_markup.as_deref(), Some(MARKUP_XML));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_validate_reports_unrepairable() {
        let client = Arc::new(ScriptedClient::new([ok("<still><broken>")]));
        let response = service(&client).validate_markup("<mindmap>").await;

        assert!(!response.valid);
        assert!(response.message.starts_with("Markup validation failed: "));
        assert!(response.corrected_markup.is_none());
        assert_eq!(client.call_count(), 1);

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("correctedMarkup").is_none());
    }

    #[tokio::test]
    async fn test_validate_repair_transport_failure() {
        let client = Arc::new(ScriptedClient::failing());
        let response = service(&client).validate_markup("<mindmap>").await;
        assert!(!response.valid);
        assert_eq!(client.call_count(), 1);
    }
}
