//! Deterministic substitutes for the model-backed stages.
//!
//! Used when a stage exhausts its attempts. Output is built to satisfy the
//! matching validator and the concept hierarchy invariant.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::types::{
    Concept, ConceptGraph, LayoutEdge, LayoutGraph, LayoutMetadata, LayoutNode, LineStyle,
    NodeType, Relationship, Shape,
};

/// Subject area inferred from the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    MachineLearning,
    SoftwareArchitecture,
    BusinessStrategy,
    Education,
    General,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::MachineLearning => "machine_learning",
            Domain::SoftwareArchitecture => "software_architecture",
            Domain::BusinessStrategy => "business_strategy",
            Domain::Education => "education",
            Domain::General => "general",
        }
    }

    /// Human-readable form, e.g. "machine learning".
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }

    /// Keywords checked in order; the first domain with a hit wins.
    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Domain::MachineLearning => &[
                "machine learning",
                "ml",
                "ai",
                "model",
                "algorithm",
                "data",
            ],
            Domain::SoftwareArchitecture => &["architecture", "system", "software", "api", "database"],
            Domain::BusinessStrategy => &["business", "strategy", "marketing", "sales", "revenue"],
            Domain::Education => &["learn", "learning", "education", "course", "study", "training"],
            Domain::General => &[],
        }
    }

    pub fn tools(&self) -> &'static [&'static str] {
        match self {
            Domain::MachineLearning => &["Python", "TensorFlow", "scikit-learn", "MLflow"],
            Domain::SoftwareArchitecture => &["Docker", "Kubernetes", "AWS/Azure", "MongoDB"],
            Domain::BusinessStrategy => &["Excel", "Tableau", "Salesforce", "HubSpot"],
            Domain::Education => &[
                "LMS Platform",
                "Assessment Tools",
                "Video Conferencing",
                "Analytics",
            ],
            Domain::General => &["Generic Tool 1", "Platform 2", "Framework 3"],
        }
    }

    pub fn stakeholders(&self) -> &'static [&'static str] {
        match self {
            Domain::MachineLearning => &["Data Scientists", "ML Engineers", "Product Managers"],
            Domain::SoftwareArchitecture => {
                &["Software Architects", "DevOps Engineers", "QA Team"]
            }
            Domain::BusinessStrategy => &["Business Analysts", "Executive Team", "Marketing"],
            Domain::Education => &["Instructors", "Students", "Academic Administration"],
            Domain::General => &["Project Manager", "Technical Team", "Stakeholders"],
        }
    }

    /// Fixed stage names; empty for `General`, whose stages come from the prompt.
    fn process_flow(&self) -> &'static [&'static str] {
        match self {
            Domain::MachineLearning => &[
                "Data Collection",
                "Feature Engineering",
                "Model Training",
                "Validation",
                "Deployment",
                "Monitoring",
            ],
            Domain::SoftwareArchitecture => &[
                "Requirements Analysis",
                "System Design",
                "Implementation",
                "Testing",
                "Deployment",
                "Maintenance",
            ],
            Domain::BusinessStrategy => &[
                "Market Analysis",
                "Strategy Planning",
                "Resource Allocation",
                "Execution",
                "Performance Tracking",
            ],
            Domain::Education => &[
                "Learning Objectives",
                "Curriculum Design",
                "Content Delivery",
                "Assessment",
                "Feedback and Iteration",
            ],
            Domain::General => &[],
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const CLASSIFY_ORDER: [Domain; 4] = [
    Domain::MachineLearning,
    Domain::SoftwareArchitecture,
    Domain::BusinessStrategy,
    Domain::Education,
];

const DEFAULT_FLOW: [&str; 5] = ["Planning", "Design", "Implementation", "Testing", "Deployment"];

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
        "from", "about", "how", "what", "when", "where", "why", "create", "make", "generate",
        "mindmap", "map", "system", "design",
    ]
    .into_iter()
    .collect()
});

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
}

/// Classify a prompt by keyword.
///
/// Multi-word keywords match as phrases; single words match whole tokens
/// (a trailing plural `s` is tolerated), so "explain" does not hit "ai".
pub fn classify_domain(prompt: &str) -> Domain {
    let lower = prompt.to_lowercase();
    let words: HashSet<&str> = tokens(&lower).collect();

    let hit = |keyword: &str| {
        if keyword.contains(' ') {
            lower.contains(keyword)
        } else {
            words.contains(keyword) || words.contains(format!("{keyword}s").as_str())
        }
    };

    CLASSIFY_ORDER
        .into_iter()
        .find(|domain| domain.keywords().iter().any(|kw| hit(*kw)))
        .unwrap_or(Domain::General)
}

/// Title-case each whitespace-separated word. A letter is upper-cased when
/// it follows a non-letter (so "coffee-shop" becomes "Coffee-Shop"), and
/// lower-cased otherwise.
fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut after_letter = false;
            word.chars()
                .flat_map(|c| {
                    let mapped: Vec<char> = if after_letter {
                        c.to_lowercase().collect()
                    } else {
                        c.to_uppercase().collect()
                    };
                    after_letter = c.is_alphabetic();
                    mapped
                })
                .collect::<String>()
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Up to eight prompt words longer than three characters that are not stop words.
fn key_words(prompt: &str) -> Vec<String> {
    tokens(prompt)
        .filter(|w| w.chars().count() > 3 && !STOP_WORDS.contains(w.to_lowercase().as_str()))
        .take(8)
        .map(title_case)
        .collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Build a concept graph from the prompt alone.
pub fn concept_graph(prompt: &str) -> ConceptGraph {
    let domain = classify_domain(prompt);
    let domain_label = domain.label();
    let main_topic = title_case(
        &prompt
            .split_whitespace()
            .take(4)
            .collect::<Vec<_>>()
            .join(" "),
    );
    let topic_lower = main_topic.to_lowercase();

    let fixed = domain.process_flow();
    let flow: Vec<String> = if !fixed.is_empty() {
        strings(fixed)
    } else {
        let words = key_words(prompt);
        if words.len() >= 6 {
            words.into_iter().take(6).collect()
        } else {
            strings(&DEFAULT_FLOW)
        }
    };

    let mut concepts = Vec::with_capacity(flow.len() + 1);
    concepts.push(Concept {
        id: "root".into(),
        title: main_topic.clone(),
        description: format!("Comprehensive {domain_label} system addressing {topic_lower}"),
        level: 0,
        parent: None,
        category: "system".into(),
        node_type: NodeType::Start,
        what: format!("Complete {topic_lower} implementation"),
        why: format!("Addresses critical business need in {domain_label}"),
        how: "Systematic approach with proven methodologies".into(),
        examples: vec![
            format!("Industry example 1 for {main_topic}"),
            format!("Use case in {domain}"),
        ],
        metrics: strings(&[
            "Success rate: >90%",
            "Implementation time: 3-6 months",
            "ROI: 2-5x",
        ]),
        details: vec![
            format!("Core architecture for {topic_lower}"),
            "Scalable and maintainable design".into(),
            "Integration with existing systems".into(),
        ],
        processes: strings(&[
            "Phase 1: Requirements and planning",
            "Phase 2: Design and development",
            "Phase 3: Testing and deployment",
            "Phase 4: Monitoring and optimization",
        ]),
        considerations: strings(&[
            "Risk mitigation and contingency planning",
            "Resource allocation and timeline management",
        ]),
        tools_technologies: strings(domain.tools()),
        stakeholders: strings(domain.stakeholders()),
    });

    let mut relationships = Vec::with_capacity(flow.len());
    let last = flow.len().saturating_sub(1);

    for (i, stage) in flow.iter().enumerate() {
        let id = format!("process_{}", i + 1);
        let stage_lower = stage.to_lowercase();

        concepts.push(Concept {
            id: id.clone(),
            title: stage.clone(),
            description: format!("Comprehensive {stage_lower} stage with detailed implementation"),
            level: 1,
            parent: Some("root".into()),
            category: "process".into(),
            node_type: if i < last { NodeType::Process } else { NodeType::Outcome },
            what: format!("Execute {stage_lower} with best practices"),
            why: format!("Critical step for successful {topic_lower}"),
            how: format!("Systematic approach to {stage_lower}"),
            examples: vec![
                format!("Example method for {stage}"),
                format!("Tool/technique for {stage}"),
            ],
            metrics: vec![
                format!("{stage} completion: 100%"),
                "Quality score: >85%".into(),
                "Timeline adherence: >90%".into(),
            ],
            details: vec![
                format!("Key deliverables for {stage_lower}"),
                "Quality criteria and acceptance tests".into(),
                "Dependencies and prerequisites".into(),
            ],
            processes: vec![
                format!("Step 1: {stage} planning and preparation"),
                format!("Step 2: {stage} execution"),
                format!("Step 3: {stage} validation and review"),
            ],
            considerations: vec![
                format!("Common challenges in {stage_lower}"),
                format!("Best practices for {stage_lower}"),
            ],
            tools_technologies: strings(domain.tools()),
            stakeholders: strings(domain.stakeholders()),
        });

        let (from, kind, previous) = match i.checked_sub(1) {
            None => ("root".to_string(), "initiates", "start"),
            Some(prev) => (
                format!("process_{}", i),
                "leads_to",
                flow.get(prev).map(String::as_str).unwrap_or("start"),
            ),
        };
        relationships.push(Relationship {
            from,
            to: id,
            kind: kind.into(),
            description: format!("Sequential flow from {previous} to {stage}"),
        });
    }

    ConceptGraph {
        main_topic,
        topic_description: format!(
            "Comprehensive {domain_label} implementation covering all critical aspects"
        ),
        mindmap_type: "flowchart".into(),
        domain: domain.as_str().into(),
        complexity_level: "intermediate".into(),
        workflow_type: "sequential".into(),
        concepts,
        relationships,
    }
}

const ANCHOR_X: i64 = 600;
const ANCHOR_Y: i64 = 150;
const SPACING_Y: i64 = 200;
const LEVEL_OFFSET_X: i64 = 50;
const MAX_TITLE_CHARS: usize = 30;

fn or_placeholder(list: &[String], placeholder: &[&str]) -> Vec<String> {
    if list.is_empty() {
        strings(placeholder)
    } else {
        list.to_vec()
    }
}

fn or_text(text: &str, placeholder: &str) -> String {
    if text.trim().is_empty() {
        placeholder.to_string()
    } else {
        text.to_string()
    }
}

/// Vertical flowchart layout of a concept graph.
///
/// The root sits at the anchor; concept `i` is stacked `i * 200` below it
/// and nudged right by 50 per level beyond the first.
pub fn layout_graph(graph: &ConceptGraph) -> LayoutGraph {
    let nodes: Vec<LayoutNode> = graph
        .concepts
        .iter()
        .enumerate()
        .map(|(i, concept)| {
            let level = i64::from(concept.level);
            let (x, y, width, height) = if concept.level == 0 {
                (ANCHOR_X, ANCHOR_Y, 300, 100)
            } else {
                let row = i64::try_from(i).unwrap_or(i64::MAX / SPACING_Y);
                (
                    ANCHOR_X + (level - 1) * LEVEL_OFFSET_X,
                    ANCHOR_Y + row * SPACING_Y,
                    250,
                    80,
                )
            };

            LayoutNode {
                id: concept.id.clone(),
                title: concept.title.chars().take(MAX_TITLE_CHARS).collect(),
                description: or_text(&concept.description, "Process component"),
                level: concept.level,
                x,
                y,
                width,
                height,
                color: concept.node_type.color().into(),
                shape: if concept.node_type == NodeType::Decision {
                    Shape::Diamond
                } else {
                    Shape::Rectangle
                },
                category: or_text(&concept.category, "process"),
                node_type: concept.node_type,
                what: or_text(&concept.what, "Process step"),
                why: or_text(&concept.why, "Critical for success"),
                how: or_text(&concept.how, "Systematic implementation"),
                examples: or_placeholder(&concept.examples, &["Example 1", "Example 2"]),
                metrics: or_placeholder(&concept.metrics, &["Metric 1", "Metric 2"]),
                details: or_placeholder(&concept.details, &["Detail 1", "Detail 2"]),
                processes: or_placeholder(&concept.processes, &["Step 1", "Step 2"]),
                considerations: or_placeholder(&concept.considerations, &["Consideration 1"]),
                tools_technologies: or_placeholder(&concept.tools_technologies, &["Tool 1"]),
                stakeholders: or_placeholder(&concept.stakeholders, &["Role 1"]),
                expanded: concept.level == 0,
            }
        })
        .collect();

    let edges = graph
        .relationships
        .iter()
        .enumerate()
        .map(|(i, rel)| LayoutEdge {
            id: format!("edge_{}", i + 1),
            from: rel.from.clone(),
            to: rel.to.clone(),
            label: or_text(&rel.kind, "connects"),
            description: or_text(&rel.description, "Process flow"),
            color: "#34495e".into(),
            weight: 3,
            style: LineStyle::Solid,
        })
        .collect();

    let mut layout = LayoutGraph {
        title: or_text(&graph.main_topic, "Mindmap"),
        description: or_text(&graph.topic_description, "Comprehensive system analysis"),
        layout_type: "flowchart".into(),
        domain: graph.domain.clone(),
        complexity: graph.complexity_level.clone(),
        metadata: LayoutMetadata {
            total_nodes: 0,
            max_depth: 0,
            creation_context: "Enhanced intelligent structure".into(),
        },
        nodes,
        edges,
    };
    layout.refresh_metadata();
    layout
}
