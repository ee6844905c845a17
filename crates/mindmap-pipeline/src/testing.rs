//! Canned completion clients for pipeline tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use mindmap_llm::{CompletionClient, ServiceError, StageModels};
use parking_lot::Mutex;

pub(crate) fn models() -> StageModels {
    StageModels::new("primary-model", "fast-model")
}

/// One recorded `complete` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Call {
    pub model: String,
    pub max_tokens: usize,
    pub prompt: String,
}

/// Replays queued replies in order; errors once the queue is empty.
#[derive(Default)]
pub(crate) struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String, ServiceError>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedClient {
    pub fn new<I>(replies: I) -> Self
    where
        I: IntoIterator<Item = Result<String, ServiceError>>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A client whose every call fails at the transport layer.
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

pub(crate) fn ok(text: impl Into<String>) -> Result<String, ServiceError> {
    Ok(text.into())
}

pub(crate) fn unavailable() -> Result<String, ServiceError> {
    Err(ServiceError::Api {
        status: 529,
        body: "overloaded".into(),
    })
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(
        &self,
        model: &str,
        max_tokens: usize,
        prompt: &str,
    ) -> Result<String, ServiceError> {
        self.calls.lock().push(Call {
            model: model.to_string(),
            max_tokens,
            prompt: prompt.to_string(),
        });
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ServiceError::Request("connection refused".into())))
    }
}

pub(crate) const CONCEPT_JSON: &str = r#"{
  "main_topic": "Coffee Shop Inventory",
  "topic_description": "How a coffee shop keeps stock on hand",
  "mindmap_type": "flowchart",
  "domain": "business_strategy",
  "complexity_level": "beginner",
  "workflow_type": "sequential",
  "concepts": [
    {"id": "root", "title": "Inventory", "description": "Stock control", "level": 0, "parent": null,
     "node_type": "start", "what": "Track stock", "why": "Avoid stockouts", "how": "Par levels",
     "examples": ["Beans"], "metrics": ["Stockouts per week"]},
    {"id": "order", "title": "Ordering", "description": "Weekly orders", "level": 1, "parent": "root",
     "node_type": "process", "what": "Place orders", "why": "Refill", "how": "Supplier portal",
     "examples": ["Milk"], "metrics": ["Lead time"]}
  ],
  "relationships": [{"from": "root", "to": "order", "type": "leads_to", "description": "then"}]
}"#;

pub(crate) const LAYOUT_JSON: &str = r##"{
  "title": "Coffee Shop Inventory",
  "description": "How a coffee shop keeps stock on hand",
  "layout_type": "hierarchical",
  "domain": "business_strategy",
  "complexity": "beginner",
  "metadata": {"total_nodes": 99, "max_depth": 7, "creation_context": "model"},
  "nodes": [
    {"id": "root", "title": "Inventory", "description": "Stock control", "level": 0, "x": 400, "y": 200,
     "details": ["Par levels"], "processes": ["Count"], "considerations": ["Waste"], "expanded": true},
    {"id": "order", "title": "Ordering", "description": "Weekly orders", "level": 1, "x": 200, "y": 350,
     "details": [], "processes": [], "considerations": []}
  ],
  "edges": [{"id": "edge1", "from": "root", "to": "order", "label": "leads_to"}]
}"##;

pub(crate) const MARKUP_XML: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<mindmap version="2.0" editable="true">
  <metadata>
    <title>Coffee Shop Inventory</title>
    <domain>business_strategy</domain>
    <complexity>beginner</complexity>
    <total_nodes>2</total_nodes>
    <max_depth>1</max_depth>
  </metadata>
  <nodes>
    <node id="root" level="0"><position x="400" y="200"/><style color="#2c3e50"/></node>
    <node id="order" level="1"><position x="200" y="350"/><style color="#3498db"/></node>
  </nodes>
  <edges>
    <edge id="edge1" source="root" target="order"/>
  </edges>
</mindmap>"##;
