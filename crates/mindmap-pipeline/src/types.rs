//! Request-scoped data shapes produced by the first two stages.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lenient;

/// Flowchart role of a concept, used for fallback colors and shapes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Start,
    #[default]
    Process,
    Decision,
    Outcome,
    Checkpoint,
    End,
}

impl NodeType {
    /// Fallback palette keyed by flowchart role.
    pub fn color(&self) -> &'static str {
        match self {
            NodeType::Start => "#2c3e50",
            NodeType::Process => "#3498db",
            NodeType::Decision => "#e74c3c",
            NodeType::Outcome => "#27ae60",
            NodeType::Checkpoint => "#f39c12",
            NodeType::End => "#9b59b6",
        }
    }
}

/// Node outline drawn by the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    #[default]
    Rectangle,
    RoundedRectangle,
    Circle,
    Ellipse,
    Diamond,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Rectangle => "rectangle",
            Shape::RoundedRectangle => "rounded_rectangle",
            Shape::Circle => "circle",
            Shape::Ellipse => "ellipse",
            Shape::Diamond => "diamond",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl LineStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineStyle::Solid => "solid",
            LineStyle::Dashed => "dashed",
            LineStyle::Dotted => "dotted",
        }
    }
}

// ---------------------------------------------------------------
// Stage 1: concept graph
// ---------------------------------------------------------------

/// One idea in the concept graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::level")]
    pub level: u32,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub parent: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient::tag")]
    pub node_type: NodeType,
    #[serde(default, deserialize_with = "lenient::string")]
    pub what: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub why: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub how: String,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub examples: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub metrics: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub details: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub processes: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub considerations: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub tools_technologies: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub stakeholders: Vec<String>,
}

/// Directed, labelled link between two concepts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(alias = "source", deserialize_with = "lenient::string")]
    pub from: String,
    #[serde(alias = "target", deserialize_with = "lenient::string")]
    pub to: String,
    #[serde(rename = "type", default, deserialize_with = "lenient::string")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,
}

/// Output of stage 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptGraph {
    #[serde(deserialize_with = "lenient::string")]
    pub main_topic: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub topic_description: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub mindmap_type: String,
    #[serde(default = "default_domain", deserialize_with = "lenient::string")]
    pub domain: String,
    #[serde(default = "default_complexity", deserialize_with = "lenient::string")]
    pub complexity_level: String,
    #[serde(default = "default_workflow", deserialize_with = "lenient::string")]
    pub workflow_type: String,
    #[serde(deserialize_with = "lenient::list")]
    pub concepts: Vec<Concept>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub relationships: Vec<Relationship>,
}

fn default_domain() -> String {
    "general".into()
}
fn default_complexity() -> String {
    "intermediate".into()
}
fn default_workflow() -> String {
    "sequential".into()
}

/// Ways a concept graph can break its parent/level hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    #[error("expected exactly one root concept, found {0}")]
    RootCount(usize),
    #[error("root concept '{0}' must have level 0")]
    RootLevel(String),
    #[error("duplicate concept id '{0}'")]
    DuplicateId(String),
    #[error("concept '{id}' references unknown parent '{parent}'")]
    UnknownParent { id: String, parent: String },
    #[error("concept '{id}' has level {level}, expected {expected}")]
    LevelMismatch { id: String, level: u32, expected: u32 },
    #[error("relationship {from} -> {to} references an unknown concept")]
    DanglingRelationship { from: String, to: String },
}

impl ConceptGraph {
    pub fn concept(&self, id: &str) -> Option<&Concept> {
        self.concepts.iter().find(|c| c.id == id)
    }

    /// Verify ids are unique, there is one level-0 root, every parent
    /// exists one level up, and relationships point at known concepts.
    pub fn check_hierarchy(&self) -> Result<(), HierarchyError> {
        let mut by_id: HashMap<&str, &Concept> = HashMap::with_capacity(self.concepts.len());
        for concept in &self.concepts {
            if by_id.insert(concept.id.as_str(), concept).is_some() {
                return Err(HierarchyError::DuplicateId(concept.id.clone()));
            }
        }

        let roots: Vec<&Concept> = self.concepts.iter().filter(|c| c.parent.is_none()).collect();
        if roots.len() != 1 {
            return Err(HierarchyError::RootCount(roots.len()));
        }
        if let Some(root) = roots.first() {
            if root.level != 0 {
                return Err(HierarchyError::RootLevel(root.id.clone()));
            }
        }

        for concept in &self.concepts {
            let Some(parent_id) = &concept.parent else {
                continue;
            };
            let parent = by_id.get(parent_id.as_str()).ok_or_else(|| {
                HierarchyError::UnknownParent {
                    id: concept.id.clone(),
                    parent: parent_id.clone(),
                }
            })?;
            let expected = parent.level.saturating_add(1);
            if concept.level != expected {
                return Err(HierarchyError::LevelMismatch {
                    id: concept.id.clone(),
                    level: concept.level,
                    expected,
                });
            }
        }

        for rel in &self.relationships {
            if !by_id.contains_key(rel.from.as_str()) || !by_id.contains_key(rel.to.as_str()) {
                return Err(HierarchyError::DanglingRelationship {
                    from: rel.from.clone(),
                    to: rel.to.clone(),
                });
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------
// Stage 2: layout graph
// ---------------------------------------------------------------

/// A positioned, styled node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutNode {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::level")]
    pub level: u32,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub x: i64,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub y: i64,
    #[serde(default = "default_width", deserialize_with = "lenient::integer")]
    pub width: i64,
    #[serde(default = "default_height", deserialize_with = "lenient::integer")]
    pub height: i64,
    #[serde(default = "default_node_color", deserialize_with = "lenient::string")]
    pub color: String,
    #[serde(default, deserialize_with = "lenient::tag")]
    pub shape: Shape,
    #[serde(default, deserialize_with = "lenient::string")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient::tag")]
    pub node_type: NodeType,
    #[serde(default, deserialize_with = "lenient::string")]
    pub what: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub why: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub how: String,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub examples: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub metrics: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub details: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub processes: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub considerations: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub tools_technologies: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub stakeholders: Vec<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub expanded: bool,
}

fn default_width() -> i64 {
    180
}
fn default_height() -> i64 {
    70
}
fn default_node_color() -> String {
    "#3498db".into()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutEdge {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(alias = "source", deserialize_with = "lenient::string")]
    pub from: String,
    #[serde(alias = "target", deserialize_with = "lenient::string")]
    pub to: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub label: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(default = "default_edge_color", deserialize_with = "lenient::string")]
    pub color: String,
    #[serde(default = "default_weight", deserialize_with = "lenient::integer")]
    pub weight: i64,
    #[serde(default, deserialize_with = "lenient::tag")]
    pub style: LineStyle,
}

fn default_edge_color() -> String {
    "#7f8c8d".into()
}
fn default_weight() -> i64 {
    2
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutMetadata {
    #[serde(default, deserialize_with = "lenient::count")]
    pub total_nodes: usize,
    #[serde(default, deserialize_with = "lenient::level")]
    pub max_depth: u32,
    #[serde(default, deserialize_with = "lenient::string")]
    pub creation_context: String,
}

/// Output of stage 2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutGraph {
    #[serde(deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub layout_type: String,
    #[serde(default = "default_domain", deserialize_with = "lenient::string")]
    pub domain: String,
    #[serde(default = "default_complexity", deserialize_with = "lenient::string")]
    pub complexity: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub metadata: LayoutMetadata,
    #[serde(deserialize_with = "lenient::list")]
    pub nodes: Vec<LayoutNode>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub edges: Vec<LayoutEdge>,
}

impl LayoutGraph {
    /// Overwrite `metadata.total_nodes` and `metadata.max_depth` from the node list.
    pub fn refresh_metadata(&mut self) {
        self.metadata.total_nodes = self.nodes.len();
        self.metadata.max_depth = self.nodes.iter().map(|n| n.level).max().unwrap_or(0);
    }
}
