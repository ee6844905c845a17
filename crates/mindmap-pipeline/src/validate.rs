//! Shallow key-presence checks on parsed model output.
//!
//! A check passes when the required top-level keys exist, the main
//! collection is a non-empty array and its first entry carries the detail
//! keys. Extra keys are ignored. A passing value is then deserialized into
//! its typed record.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::types::{ConceptGraph, LayoutGraph};

pub const CONCEPT_GRAPH_KEYS: &[&str] = &[
    "main_topic",
    "topic_description",
    "mindmap_type",
    "concepts",
    "relationships",
];

pub const FIRST_CONCEPT_KEYS: &[&str] = &[
    "id",
    "title",
    "description",
    "level",
    "what",
    "why",
    "how",
    "examples",
    "metrics",
];

pub const LAYOUT_GRAPH_KEYS: &[&str] = &["title", "description", "layout_type", "nodes", "edges"];

pub const FIRST_NODE_KEYS: &[&str] = &[
    "id",
    "title",
    "description",
    "x",
    "y",
    "details",
    "processes",
    "considerations",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("expected a JSON object")]
    NotAnObject,
    #[error("missing required key '{0}'")]
    MissingKey(&'static str),
    #[error("'{0}' must be a non-empty array")]
    EmptyCollection(&'static str),
    #[error("first entry of '{collection}' is missing '{key}'")]
    MissingEntryKey {
        collection: &'static str,
        key: &'static str,
    },
    #[error("shape mismatch: {0}")]
    Shape(String),
}

fn check_shape(
    value: &Value,
    keys: &[&'static str],
    collection: &'static str,
    entry_keys: &[&'static str],
) -> Result<(), ValidationError> {
    let object = value.as_object().ok_or(ValidationError::NotAnObject)?;

    if let Some(missing) = keys.iter().copied().find(|k| !object.contains_key(*k)) {
        return Err(ValidationError::MissingKey(missing));
    }

    let first = object
        .get(collection)
        .and_then(Value::as_array)
        .and_then(|items| items.first())
        .ok_or(ValidationError::EmptyCollection(collection))?;

    let first = first.as_object().ok_or(ValidationError::MissingEntryKey {
        collection,
        key: entry_keys.first().copied().unwrap_or("id"),
    })?;
    if let Some(missing) = entry_keys.iter().copied().find(|k| !first.contains_key(*k)) {
        return Err(ValidationError::MissingEntryKey {
            collection,
            key: missing,
        });
    }

    Ok(())
}

/// Stage-1 check: concept graph keys, then typed decode.
pub fn validate_concept_graph(value: &Value) -> Result<ConceptGraph, ValidationError> {
    check_shape(value, CONCEPT_GRAPH_KEYS, "concepts", FIRST_CONCEPT_KEYS)?;
    ConceptGraph::deserialize(value).map_err(|e| ValidationError::Shape(e.to_string()))
}

/// Stage-2 check: layout graph keys, then typed decode.
pub fn validate_layout_graph(value: &Value) -> Result<LayoutGraph, ValidationError> {
    check_shape(value, LAYOUT_GRAPH_KEYS, "nodes", FIRST_NODE_KEYS)?;
    LayoutGraph::deserialize(value).map_err(|e| ValidationError::Shape(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn concept_graph() -> Value {
        json!({
            "main_topic": "Coffee Shop Inventory",
            "topic_description": "How stock is reordered",
            "mindmap_type": "flowchart",
            "concepts": [{
                "id": "root",
                "title": "Inventory",
                "description": "Overview",
                "level": 0,
                "parent": null,
                "what": "w",
                "why": "y",
                "how": "h",
                "examples": ["beans"],
                "metrics": ["stockouts"]
            }],
            "relationships": []
        })
    }

    fn layout_graph() -> Value {
        json!({
            "title": "Inventory",
            "description": "Overview",
            "layout_type": "hierarchical",
            "nodes": [{
                "id": "root",
                "title": "Inventory",
                "description": "Overview",
                "x": 400,
                "y": 200,
                "details": [],
                "processes": [],
                "considerations": []
            }],
            "edges": []
        })
    }

    #[test]
    fn test_concept_graph_accepts_minimal() {
        let graph = validate_concept_graph(&concept_graph()).unwrap();
        assert_eq!(graph.main_topic, "Coffee Shop Inventory");
        assert_eq!(graph.concepts.len(), 1);
    }

    #[test]
    fn test_concept_graph_rejects_each_missing_key() {
        for key in CONCEPT_GRAPH_KEYS {
            let mut value = concept_graph();
            value.as_object_mut().unwrap().remove(*key);
            assert_eq!(
                validate_concept_graph(&value).unwrap_err(),
                ValidationError::MissingKey(*key),
                "removing {key} should be rejected"
            );
        }
    }

    #[test]
    fn test_concept_graph_rejects_empty_concepts() {
        let mut value = concept_graph();
        value["concepts"] = json!([]);
        assert_eq!(
            validate_concept_graph(&value).unwrap_err(),
            ValidationError::EmptyCollection("concepts")
        );
    }

    #[test]
    fn test_concept_graph_rejects_thin_first_concept() {
        let mut value = concept_graph();
        value["concepts"][0].as_object_mut().unwrap().remove("metrics");
        assert_eq!(
            validate_concept_graph(&value).unwrap_err(),
            ValidationError::MissingEntryKey {
                collection: "concepts",
                key: "metrics"
            }
        );
    }

    #[test]
    fn test_concept_graph_accepts_superset() {
        let mut value = concept_graph();
        value["extra_field"] = json!({"anything": [1, 2, 3]});
        value["concepts"][0]["confidence"] = json!(0.9);
        value["concepts"][0]["level"] = json!("0");
        assert!(validate_concept_graph(&value).is_ok());
    }

    #[test]
    fn test_concept_graph_null_relationships_is_empty() {
        let mut value = concept_graph();
        value["relationships"] = Value::Null;
        let graph = validate_concept_graph(&value).unwrap();
        assert!(graph.relationships.is_empty());
    }

    #[test]
    fn test_concept_graph_drops_concept_without_id() {
        let mut value = concept_graph();
        value["concepts"]
            .as_array_mut()
            .unwrap()
            .push(json!({"title": "Orphan", "level": 1, "parent": "root"}));
        let graph = validate_concept_graph(&value).unwrap();
        assert_eq!(graph.concepts.len(), 1);
        assert_eq!(graph.concepts[0].id, "root");
    }

    #[test]
    fn test_concept_graph_reads_source_target_relationships() {
        let mut value = concept_graph();
        value["relationships"] = json!([
            {"source": "root", "target": "beans", "type": "leads_to"},
            {"description": "no endpoints"}
        ]);
        let graph = validate_concept_graph(&value).unwrap();
        assert_eq!(graph.relationships.len(), 1);
        assert_eq!(graph.relationships[0].from, "root");
        assert_eq!(graph.relationships[0].to, "beans");
        assert_eq!(graph.relationships[0].kind, "leads_to");
    }

    #[test]
    fn test_layout_null_edges_is_empty() {
        let mut value = layout_graph();
        value["edges"] = Value::Null;
        let layout = validate_layout_graph(&value).unwrap();
        assert!(layout.edges.is_empty());
        assert_eq!(layout.nodes.len(), 1);
    }

    #[test]
    fn test_layout_drops_node_without_id_and_reads_source_target() {
        let mut value = layout_graph();
        value["nodes"]
            .as_array_mut()
            .unwrap()
            .push(json!({"title": "Nameless", "x": 10, "y": 10}));
        value["edges"] = json!([{"id": "e1", "source": "root", "target": "root"}]);
        let layout = validate_layout_graph(&value).unwrap();
        assert_eq!(layout.nodes.len(), 1);
        assert_eq!(layout.edges[0].from, "root");
        assert_eq!(layout.edges[0].to, "root");
    }

    #[test]
    fn test_not_an_object() {
        assert_eq!(
            validate_concept_graph(&json!([1, 2])).unwrap_err(),
            ValidationError::NotAnObject
        );
    }

    #[test]
    fn test_layout_rejects_each_missing_key() {
        for key in LAYOUT_GRAPH_KEYS {
            let mut value = layout_graph();
            value.as_object_mut().unwrap().remove(*key);
            assert_eq!(
                validate_layout_graph(&value).unwrap_err(),
                ValidationError::MissingKey(*key)
            );
        }
    }

    #[test]
    fn test_layout_rejects_empty_nodes() {
        let mut value = layout_graph();
        value["nodes"] = json!([]);
        assert_eq!(
            validate_layout_graph(&value).unwrap_err(),
            ValidationError::EmptyCollection("nodes")
        );
    }

    #[test]
    fn test_layout_rejects_nodes_not_array() {
        let mut value = layout_graph();
        value["nodes"] = json!({"root": {}});
        assert_eq!(
            validate_layout_graph(&value).unwrap_err(),
            ValidationError::EmptyCollection("nodes")
        );
    }

    #[test]
    fn test_layout_accepts_float_coordinates() {
        let mut value = layout_graph();
        value["nodes"][0]["x"] = json!(400.4);
        let layout = validate_layout_graph(&value).unwrap();
        assert_eq!(layout.nodes[0].x, 400);
    }
}
