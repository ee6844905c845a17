//! Mindmap XML: rendering and read-back inspection.
//!
//! [`MarkupDocument`] renders the document the pipeline falls back to when
//! markup generation fails. [`inspect`] parses any markup (usually model
//! output), checks it is well formed and pulls out the metadata and the
//! node/edge references needed for [`MarkupSummary::issues`].

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use quick_xml::escape::escape;
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use thiserror::Error;

use crate::types::{LayoutGraph, LineStyle, Shape};

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").unwrap());

const INDENT: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct MarkupMetadata {
    pub title: String,
    pub description: String,
    pub created_at: String,
    pub layout_type: String,
    pub domain: String,
    pub complexity: String,
    pub total_nodes: usize,
    pub total_edges: usize,
    pub max_depth: u32,
    pub generation_context: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkupNode {
    pub id: String,
    pub level: u32,
    pub category: String,
    pub expanded: bool,
    pub title: String,
    pub description: String,
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
    pub color: String,
    pub shape: Shape,
    pub border: LineStyle,
    pub details: Vec<String>,
    pub processes: Vec<String>,
    pub considerations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkupEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub label: String,
    pub description: String,
    pub color: String,
    pub weight: i64,
    pub line_style: LineStyle,
}

/// A `<mindmap version="2.0" editable="true">` document.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkupDocument {
    pub metadata: MarkupMetadata,
    pub nodes: Vec<MarkupNode>,
    pub edges: Vec<MarkupEdge>,
}

impl MarkupDocument {
    /// One-node document titled from `layout`, with boilerplate content.
    pub fn minimal(layout: &LayoutGraph, prompt: &str) -> Self {
        let root = MarkupNode {
            id: "root".into(),
            level: 0,
            category: "core".into(),
            expanded: true,
            title: layout.title.clone(),
            description: layout.description.clone(),
            x: 400,
            y: 300,
            width: 200,
            height: 80,
            color: "#2c3e50".into(),
            shape: Shape::Rectangle,
            border: LineStyle::Solid,
            details: vec![
                "Core concept requiring systematic approach".into(),
                "Multiple interconnected components".into(),
            ],
            processes: vec![
                "Initial analysis and planning".into(),
                "Implementation and execution".into(),
            ],
            considerations: vec![
                "Consider stakeholder requirements".into(),
                "Ensure scalable solution".into(),
            ],
        };

        Self {
            metadata: MarkupMetadata {
                title: layout.title.clone(),
                description: layout.description.clone(),
                created_at: chrono::Utc::now().to_rfc3339(),
                layout_type: "hierarchical".into(),
                domain: "general".into(),
                complexity: "intermediate".into(),
                total_nodes: 1,
                total_edges: 0,
                max_depth: 0,
                generation_context: format!("Generated from: {prompt}"),
            },
            nodes: vec![root],
            edges: Vec::new(),
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str("<mindmap version=\"2.0\" editable=\"true\">\n");

        let meta = &self.metadata;
        open(&mut out, 1, "metadata");
        leaf(&mut out, 2, "title", &meta.title);
        leaf(&mut out, 2, "description", &meta.description);
        leaf(&mut out, 2, "created_at", &meta.created_at);
        leaf(&mut out, 2, "layout_type", &meta.layout_type);
        leaf(&mut out, 2, "domain", &meta.domain);
        leaf(&mut out, 2, "complexity", &meta.complexity);
        leaf(&mut out, 2, "total_nodes", &meta.total_nodes.to_string());
        leaf(&mut out, 2, "total_edges", &meta.total_edges.to_string());
        leaf(&mut out, 2, "max_depth", &meta.max_depth.to_string());
        leaf(&mut out, 2, "generation_context", &meta.generation_context);
        close(&mut out, 1, "metadata");

        open(&mut out, 1, "nodes");
        for node in &self.nodes {
            render_node(&mut out, node);
        }
        close(&mut out, 1, "nodes");

        open(&mut out, 1, "edges");
        for edge in &self.edges {
            render_edge(&mut out, edge);
        }
        close(&mut out, 1, "edges");

        out.push_str("</mindmap>\n");
        out
    }
}

fn pad(depth: usize) -> String {
    " ".repeat(depth * INDENT)
}

fn line(out: &mut String, depth: usize, text: &str) {
    out.push_str(&pad(depth));
    out.push_str(text);
    out.push('\n');
}

fn open(out: &mut String, depth: usize, name: &str) {
    line(out, depth, &format!("<{name}>"));
}

fn close(out: &mut String, depth: usize, name: &str) {
    line(out, depth, &format!("</{name}>"));
}

fn leaf(out: &mut String, depth: usize, name: &str, text: &str) {
    line(out, depth, &format!("<{name}>{}</{name}>", escape(text)));
}

fn list(out: &mut String, depth: usize, name: &str, item: &str, values: &[String]) {
    open(out, depth, name);
    for value in values {
        leaf(out, depth + 1, item, value);
    }
    close(out, depth, name);
}

fn render_node(out: &mut String, node: &MarkupNode) {
    line(
        out,
        2,
        &format!(
            "<node id=\"{}\" level=\"{}\" category=\"{}\" expanded=\"{}\">",
            escape(&node.id),
            node.level,
            escape(&node.category),
            node.expanded
        ),
    );
    open(out, 3, "content");
    leaf(out, 4, "title", &node.title);
    leaf(out, 4, "description", &node.description);
    close(out, 3, "content");
    line(
        out,
        3,
        &format!(
            "<position x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"/>",
            node.x,
            node.y,
            node.width,
            node.height
        ),
    );
    line(
        out,
        3,
        &format!(
            "<style color=\"{}\" shape=\"{}\" border=\"{}\"/>",
            escape(&node.color),
            node.shape.as_str(),
            node.border.as_str()
        ),
    );
    list(out, 3, "details", "item", &node.details);
    list(out, 3, "processes", "step", &node.processes);
    list(out, 3, "considerations", "point", &node.considerations);
    close(out, 2, "node");
}

fn render_edge(out: &mut String, edge: &MarkupEdge) {
    line(
        out,
        2,
        &format!(
            "<edge id=\"{}\" source=\"{}\" target=\"{}\">",
            escape(&edge.id),
            escape(&edge.source),
            escape(&edge.target)
        ),
    );
    leaf(out, 3, "label", &edge.label);
    leaf(out, 3, "description", &edge.description);
    line(
        out,
        3,
        &format!(
            "<style color=\"{}\" weight=\"{}\" line_style=\"{}\"/>",
            escape(&edge.color),
            edge.weight,
            edge.line_style.as_str()
        ),
    );
    close(out, 2, "edge");
}

// ---------------------------------------------------------------
// Inspection
// ---------------------------------------------------------------

/// Reasons markup is not a well-formed XML document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    #[error("malformed markup: {0}")]
    Syntax(String),
    #[error("document has no root element")]
    NoRoot,
    #[error("more than one root element")]
    MultipleRoots,
    #[error("text outside the root element")]
    StrayText,
    #[error("element <{0}> is never closed")]
    Unclosed(String),
    #[error("closing tag </{found}> does not match <{expected}>")]
    Mismatched { expected: String, found: String },
}

impl From<quick_xml::Error> for MarkupError {
    fn from(err: quick_xml::Error) -> Self {
        MarkupError::Syntax(err.to_string())
    }
}

impl From<AttrError> for MarkupError {
    fn from(err: AttrError) -> Self {
        MarkupError::Syntax(err.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeRef {
    pub id: Option<String>,
    pub x: Option<String>,
    pub y: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeRef {
    pub id: Option<String>,
    pub source: Option<String>,
    pub target: Option<String>,
    pub color: Option<String>,
}

/// What [`inspect`] read out of a well-formed document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkupSummary {
    pub root: String,
    pub title: Option<String>,
    pub domain: Option<String>,
    pub complexity: Option<String>,
    pub total_nodes: Option<usize>,
    pub total_edges: Option<usize>,
    pub max_depth: Option<u32>,
    pub nodes: Vec<NodeRef>,
    pub edges: Vec<EdgeRef>,
}

/// Structural problems in a well-formed document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupIssue {
    #[error("root element is <{0}>, expected <mindmap>")]
    UnexpectedRoot(String),
    #[error("node #{0} has no id")]
    MissingNodeId(usize),
    #[error("duplicate node id '{0}'")]
    DuplicateNodeId(String),
    #[error("edge '{edge}' references unknown node '{endpoint}'")]
    DanglingEdge { edge: String, endpoint: String },
    #[error("node '{node}' has non-integer coordinate '{value}'")]
    NonIntegerCoordinate { node: String, value: String },
    #[error("'{owner}' has invalid color '{value}'")]
    InvalidColor { owner: String, value: String },
    #[error("metadata declares {declared} nodes, document has {actual}")]
    NodeCountMismatch { declared: usize, actual: usize },
}

impl MarkupSummary {
    fn record_element(&mut self, stack: &[String], name: &str, mut attrs: HashMap<String, String>) {
        let parent = stack.last().map(String::as_str);
        match (parent, name) {
            (Some("nodes"), "node") => self.nodes.push(NodeRef {
                id: attrs.remove("id"),
                ..Default::default()
            }),
            (Some("node"), "position") => {
                if let Some(node) = self.nodes.last_mut() {
                    node.x = attrs.remove("x");
                    node.y = attrs.remove("y");
                }
            }
            (Some("node"), "style") => {
                if let Some(node) = self.nodes.last_mut() {
                    node.color = attrs.remove("color");
                }
            }
            (Some("edges"), "edge") => self.edges.push(EdgeRef {
                id: attrs.remove("id"),
                source: attrs.remove("source"),
                target: attrs.remove("target"),
                color: None,
            }),
            (Some("edge"), "style") => {
                if let Some(edge) = self.edges.last_mut() {
                    edge.color = attrs.remove("color");
                }
            }
            _ => {}
        }
    }

    fn record_text(&mut self, stack: &[String], text: &str) {
        let [_, section, field] = stack else {
            return;
        };
        if section != "metadata" {
            return;
        }
        let text = text.trim();
        match field.as_str() {
            "title" => self.title = Some(text.to_string()),
            "domain" => self.domain = Some(text.to_string()),
            "complexity" => self.complexity = Some(text.to_string()),
            "total_nodes" => self.total_nodes = text.parse().ok(),
            "total_edges" => self.total_edges = text.parse().ok(),
            "max_depth" => self.max_depth = text.parse().ok(),
            _ => {}
        }
    }

    /// Violations of the mindmap conventions: unique node ids, edges that
    /// point at existing nodes, integer coordinates and `#RRGGBB` colors.
    pub fn issues(&self) -> Vec<MarkupIssue> {
        let mut issues = Vec::new();

        if self.root != "mindmap" {
            issues.push(MarkupIssue::UnexpectedRoot(self.root.clone()));
        }

        let mut ids = HashSet::new();
        for (i, node) in self.nodes.iter().enumerate() {
            let Some(id) = &node.id else {
                issues.push(MarkupIssue::MissingNodeId(i));
                continue;
            };
            if !ids.insert(id.as_str()) {
                issues.push(MarkupIssue::DuplicateNodeId(id.clone()));
            }
            for value in [&node.x, &node.y].into_iter().flatten() {
                if value.trim().parse::<i64>().is_err() {
                    issues.push(MarkupIssue::NonIntegerCoordinate {
                        node: id.clone(),
                        value: value.clone(),
                    });
                }
            }
            if let Some(color) = &node.color {
                if !HEX_COLOR.is_match(color) {
                    issues.push(MarkupIssue::InvalidColor {
                        owner: id.clone(),
                        value: color.clone(),
                    });
                }
            }
        }

        for edge in &self.edges {
            let label = edge.id.clone().unwrap_or_default();
            for endpoint in [&edge.source, &edge.target] {
                let endpoint = endpoint.as_deref().unwrap_or_default();
                if !ids.contains(endpoint) {
                    issues.push(MarkupIssue::DanglingEdge {
                        edge: label.clone(),
                        endpoint: endpoint.to_string(),
                    });
                }
            }
            if let Some(color) = &edge.color {
                if !HEX_COLOR.is_match(color) {
                    issues.push(MarkupIssue::InvalidColor {
                        owner: label.clone(),
                        value: color.clone(),
                    });
                }
            }
        }

        if let Some(declared) = self.total_nodes {
            if declared != self.nodes.len() {
                issues.push(MarkupIssue::NodeCountMismatch {
                    declared,
                    actual: self.nodes.len(),
                });
            }
        }

        issues
    }
}

fn element_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

fn attributes(start: &BytesStart<'_>) -> Result<HashMap<String, String>, MarkupError> {
    let mut attrs = HashMap::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attrs.insert(key, value);
    }
    Ok(attrs)
}

fn open_element(
    start: &BytesStart<'_>,
    stack: &[String],
    summary: &mut MarkupSummary,
) -> Result<String, MarkupError> {
    let name = element_name(start);
    let attrs = attributes(start)?;

    if stack.is_empty() {
        if !summary.root.is_empty() {
            return Err(MarkupError::MultipleRoots);
        }
        summary.root = name.clone();
    }
    summary.record_element(stack, &name, attrs);
    Ok(name)
}

/// Parse `markup` and check it is a single well-formed XML element tree.
pub fn inspect(markup: &str) -> Result<MarkupSummary, MarkupError> {
    let mut reader = Reader::from_str(markup);
    reader.config_mut().trim_text(true);

    let mut summary = MarkupSummary::default();
    let mut stack: Vec<String> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let name = open_element(&start, &stack, &mut summary)?;
                stack.push(name);
            }
            Event::Empty(start) => {
                open_element(&start, &stack, &mut summary)?;
            }
            Event::End(end) => {
                let found = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                match stack.pop() {
                    Some(expected) if expected == found => {}
                    Some(expected) => return Err(MarkupError::Mismatched { expected, found }),
                    None => return Err(MarkupError::Syntax(format!("unexpected </{found}>"))),
                }
            }
            Event::Text(text) => {
                let text = text.unescape()?;
                if stack.is_empty() {
                    if !text.trim().is_empty() {
                        return Err(MarkupError::StrayText);
                    }
                } else {
                    summary.record_text(&stack, &text);
                }
            }
            Event::CData(data) => {
                if stack.is_empty() {
                    return Err(MarkupError::StrayText);
                }
                summary.record_text(&stack, &String::from_utf8_lossy(&data));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(MarkupError::Unclosed(open));
    }
    if summary.root.is_empty() {
        return Err(MarkupError::NoRoot);
    }
    Ok(summary)
}
