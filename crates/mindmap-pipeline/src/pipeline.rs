//! Stage controller: prompt -> concepts -> layout -> markup -> checked markup.
//!
//! Stages 1 and 2 run a call/sanitize/parse/validate cycle up to
//! `max_attempts` times and then fall back to a deterministic generator.
//! Stages 3 and 4 make a single call. No stage ever fails the request.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use mindmap_llm::{CompletionClient, ModelTier, ServiceError, StageModels};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::fallback;
use crate::markup::{self, MarkupDocument};
use crate::prompts;
use crate::sanitize;
use crate::types::{ConceptGraph, LayoutGraph};
use crate::validate::{validate_concept_graph, validate_layout_graph, ValidationError};

pub const DEFAULT_MAX_ATTEMPTS: usize = 3;
pub const REPAIR_MAX_TOKENS: usize = 4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ConceptExtraction,
    LayoutStructuring,
    MarkupGeneration,
    MarkupValidation,
}

impl Stage {
    pub fn max_tokens(&self) -> usize {
        match self {
            Stage::ConceptExtraction | Stage::LayoutStructuring => 4000,
            Stage::MarkupGeneration | Stage::MarkupValidation => 6000,
        }
    }

    pub fn tier(&self) -> ModelTier {
        match self {
            Stage::ConceptExtraction | Stage::MarkupGeneration => ModelTier::Primary,
            Stage::LayoutStructuring | Stage::MarkupValidation => ModelTier::Fast,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::ConceptExtraction => write!(f, "concept_extraction"),
            Stage::LayoutStructuring => write!(f, "layout_structuring"),
            Stage::MarkupGeneration => write!(f, "markup_generation"),
            Stage::MarkupValidation => write!(f, "markup_validation"),
        }
    }
}

/// Why one attempt at a JSON stage was discarded.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Transport(#[from] ServiceError),
    #[error("response is not valid JSON: {0}")]
    Parse(String),
    #[error("response failed validation: {0}")]
    Validation(#[from] ValidationError),
}

/// Runs the four generation stages against one completion client.
///
/// Cheap to clone; concurrent requests share the client handle.
#[derive(Clone)]
pub struct MindmapGenerator {
    client: Arc<dyn CompletionClient>,
    models: StageModels,
    max_attempts: usize,
}

impl MindmapGenerator {
    pub fn new(client: Arc<dyn CompletionClient>, models: StageModels) -> Self {
        Self {
            client,
            models,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Attempt ceiling for the JSON stages; at least one.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn models(&self) -> &StageModels {
        &self.models
    }

    /// Turn a prompt into mindmap markup.
    ///
    /// Always returns text. Model failures are absorbed by each stage's
    /// fallback, so the result may be a minimal one-node document.
    pub async fn generate(&self, prompt: &str) -> String {
        let span = info_span!("generate", request_id = %Uuid::new_v4());
        async move {
            let started = Instant::now();
            info!(prompt_chars = prompt.chars().count(), "Generating mindmap");

            let concepts = self.extract_concepts(prompt).await;
            let layout = self.structure_layout(&concepts, prompt).await;
            let draft = self.generate_markup(&layout, prompt).await;
            let markup = self.validate_markup(&draft).await;
            report_markup(&markup);

            info!(
                nodes = layout.metadata.total_nodes,
                markup_len = markup.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Mindmap generated"
            );
            markup
        }
        .instrument(span)
        .await
    }

    /// Stage 1.
    pub async fn extract_concepts(&self, prompt: &str) -> ConceptGraph {
        let instruction = prompts::concept_extraction(prompt);
        match self
            .attempt_json(Stage::ConceptExtraction, &instruction, validate_concept_graph)
            .await
        {
            Some(graph) => {
                if let Err(e) = graph.check_hierarchy() {
                    warn!(error = %e, "Concept hierarchy is inconsistent");
                }
                info!(concepts = graph.concepts.len(), domain = %graph.domain, "Concepts extracted");
                graph
            }
            None => {
                warn!("Concept extraction exhausted, using fallback graph");
                fallback::concept_graph(prompt)
            }
        }
    }

    /// Stage 2. Node count and depth are always recomputed from the nodes.
    pub async fn structure_layout(&self, concepts: &ConceptGraph, prompt: &str) -> LayoutGraph {
        let instruction = prompts::layout_structuring(concepts, prompt);
        let mut layout = match self
            .attempt_json(Stage::LayoutStructuring, &instruction, validate_layout_graph)
            .await
        {
            Some(layout) => layout,
            None => {
                warn!("Layout structuring exhausted, using fallback layout");
                fallback::layout_graph(concepts)
            }
        };
        layout.refresh_metadata();
        layout
    }

    /// Stage 3. Falls back to a one-node document on transport failure only.
    pub async fn generate_markup(&self, layout: &LayoutGraph, prompt: &str) -> String {
        let instruction = prompts::markup_generation(layout, prompt);
        match self.call(Stage::MarkupGeneration, &instruction).await {
            Ok(text) => sanitize::strip_markup_fences(&text),
            Err(e) => {
                warn!(error = %e, "Markup generation failed, using minimal document");
                MarkupDocument::minimal(layout, prompt).render()
            }
        }
    }

    /// Stage 4. On transport failure the input is returned unchanged.
    pub async fn validate_markup(&self, markup: &str) -> String {
        let instruction = prompts::markup_validation(markup);
        match self.call(Stage::MarkupValidation, &instruction).await {
            Ok(text) => sanitize::strip_markup_fences(&text),
            Err(e) => {
                warn!(error = %e, "Markup validation failed, passing markup through");
                markup.to_string()
            }
        }
    }

    /// One-shot syntactic repair with the fast model.
    pub async fn repair_markup(&self, markup: &str) -> Result<String, ServiceError> {
        let instruction = prompts::markup_repair(markup);
        let model = self.models.for_tier(ModelTier::Fast);
        debug!(model, "Requesting markup repair");
        let text = self
            .client
            .complete(model, REPAIR_MAX_TOKENS, &instruction)
            .await?;
        Ok(sanitize::strip_markup_fences(&text))
    }

    async fn call(&self, stage: Stage, instruction: &str) -> Result<String, ServiceError> {
        let model = self.models.for_tier(stage.tier());
        debug!(%stage, model, "Calling model");
        let text = self
            .client
            .complete(model, stage.max_tokens(), instruction)
            .await?;
        Ok(text.trim().to_string())
    }

    async fn attempt_json<T>(
        &self,
        stage: Stage,
        instruction: &str,
        validate: fn(&Value) -> Result<T, ValidationError>,
    ) -> Option<T> {
        for attempt in 1..=self.max_attempts {
            match self.try_json(stage, instruction, validate).await {
                Ok(value) => return Some(value),
                Err(e) => warn!(
                    %stage,
                    attempt,
                    max_attempts = self.max_attempts,
                    error = %e,
                    "Stage attempt failed"
                ),
            }
        }
        None
    }

    async fn try_json<T>(
        &self,
        stage: Stage,
        instruction: &str,
        validate: fn(&Value) -> Result<T, ValidationError>,
    ) -> Result<T, StageError> {
        let raw = self.call(stage, instruction).await?;
        let cleaned = sanitize::clean_json_response(&raw);
        let value: Value =
            serde_json::from_str(&cleaned).map_err(|e| StageError::Parse(e.to_string()))?;
        Ok(validate(&value)?)
    }
}

/// Log structural problems in the final markup. Never alters it.
fn report_markup(markup: &str) {
    match markup::inspect(markup) {
        Ok(summary) => {
            for issue in summary.issues() {
                warn!(%issue, "Markup convention violated");
            }
        }
        Err(e) => warn!(error = %e, "Final markup is not well-formed"),
    }
}
