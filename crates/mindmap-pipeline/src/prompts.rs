//! Instruction text sent to the model at each stage.

use serde::Serialize;

use crate::types::{ConceptGraph, LayoutGraph};

fn pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

/// Stage 1: ask for a concept graph describing `prompt`.
pub fn concept_extraction(prompt: &str) -> String {
    format!(
        r#"You are an expert analyst creating a comprehensive mindmap for: "{prompt}"

First, analyze the domain and core workflow:
1. Identify the domain (technology, business, education, science, healthcare, ...)
2. Determine the main process flow or system architecture
3. Identify key decision points and branching logic
4. Map out sequential steps and parallel processes

Create a flowchart-style mindmap where each node contains rich information like a presentation slide.

Return ONLY valid JSON, no extra text or explanations:

{{
  "main_topic": "System/Process Name",
  "topic_description": "Comprehensive overview with context and scope",
  "mindmap_type": "flowchart",
  "domain": "machine_learning",
  "complexity_level": "intermediate",
  "workflow_type": "sequential",
  "concepts": [
    {{
      "id": "root",
      "title": "System Overview",
      "description": "Complete system description with purpose and scope",
      "level": 0,
      "parent": null,
      "category": "system",
      "node_type": "start",
      "what": "What this system does",
      "why": "Business value and importance",
      "how": "High-level approach and methodology",
      "examples": ["Real example 1", "Use case 2"],
      "metrics": ["Success metric 1", "KPI 2"],
      "details": ["Technical requirement", "Key decision", "Success factor"],
      "processes": ["Phase 1: Planning", "Phase 2: Implementation"],
      "considerations": ["Major risk", "Best practice"],
      "tools_technologies": ["Tool 1", "Technology 2"],
      "stakeholders": ["Role 1", "Department 2"]
    }},
    {{
      "id": "phase1",
      "title": "Data Collection",
      "description": "Comprehensive data gathering pipeline",
      "level": 1,
      "parent": "root",
      "category": "process",
      "node_type": "process",
      "what": "Collect and validate data",
      "why": "Quality data enables accurate predictions",
      "how": "Automated ETL with validation",
      "examples": ["Transaction logs", "User events"],
      "metrics": ["Completeness: >95%", "Latency: <10min"],
      "details": ["Multiple data sources", "Real-time streaming", "Quality checks"],
      "processes": ["Source setup", "Validation", "Storage"],
      "considerations": ["Privacy compliance", "Data retention"],
      "tools_technologies": ["Apache Kafka", "Spark"],
      "stakeholders": ["Data Engineers", "Privacy Team"]
    }}
  ],
  "relationships": [
    {{"from": "root", "to": "phase1", "type": "initiates", "description": "System starts with data collection"}}
  ]
}}

Generate 6-8 main nodes with logical flow. Each node should contain detailed information.
Exactly one concept is the root (level 0, parent null); every other concept has level = parent level + 1.
Use node_type values: start, process, decision, outcome, checkpoint, end.
Keep all text content under 100 characters per field."#
    )
}

/// Stage 2: ask for coordinates, sizes and styling for `graph`.
pub fn layout_structuring(graph: &ConceptGraph, prompt: &str) -> String {
    let data = pretty(graph);
    let title = &graph.main_topic;
    let description = &graph.topic_description;
    let domain = &graph.domain;
    let complexity = &graph.complexity_level;

    format!(
        r##"Create a comprehensive visual layout for this detailed mindmap data about "{prompt}":
{data}

Return ONLY valid JSON in this exact format:

{{
  "title": "{title}",
  "description": "{description}",
  "layout_type": "hierarchical",
  "domain": "{domain}",
  "complexity": "{complexity}",
  "metadata": {{
    "total_nodes": 0,
    "max_depth": 0,
    "creation_context": "Generated from detailed analysis"
  }},
  "nodes": [
    {{
      "id": "root",
      "title": "Central Topic",
      "description": "Comprehensive description",
      "level": 0,
      "x": 400,
      "y": 200,
      "width": 200,
      "height": 80,
      "color": "#2c3e50",
      "shape": "rectangle",
      "category": "core",
      "details": ["detail1", "detail2"],
      "processes": ["process1"],
      "considerations": ["consideration1"],
      "expanded": true
    }},
    {{
      "id": "node1",
      "title": "Major Component",
      "description": "Detailed explanation",
      "level": 1,
      "x": 200,
      "y": 350,
      "width": 180,
      "height": 70,
      "color": "#3498db",
      "shape": "rounded_rectangle",
      "category": "process",
      "details": ["detail1", "detail2"],
      "processes": ["process1"],
      "considerations": ["consideration1"],
      "expanded": false
    }}
  ],
  "edges": [
    {{
      "id": "edge1",
      "from": "root",
      "to": "node1",
      "label": "contains",
      "description": "Relationship description",
      "color": "#7f8c8d",
      "weight": 2,
      "style": "solid"
    }}
  ]
}}

Layout rules:
- Root node at center (400, 200) with larger size (200x80)
- Level 1 nodes distributed in a semicircle below the root (y=350-400)
- Level 2 nodes positioned below their parents (y=500-550)
- Space nodes 180-220px apart horizontally
- Semantic colors: core "#2c3e50", process "#3498db", component "#27ae60", method "#e74c3c", tool "#f39c12", outcome "#9b59b6"
- Vary node sizes based on importance and content amount
- All nodes start collapsed (expanded: false) except the root
- Include all details, processes and considerations from the data
- No extra text, just JSON"##
    )
}

/// Stage 3: ask for the mindmap XML document.
pub fn markup_generation(layout: &LayoutGraph, prompt: &str) -> String {
    let data = pretty(layout);

    format!(
        r#"Generate a comprehensive XML mindmap from this structured data:

Structured data: {data}
Original prompt: "{prompt}"

Create valid XML with this structure:

<?xml version="1.0" encoding="UTF-8"?>
<mindmap version="2.0" editable="true">
  <metadata>
    <title>{{title}}</title>
    <description>{{description}}</description>
    <created_at>{{current_timestamp}}</created_at>
    <layout_type>{{layout_type}}</layout_type>
    <domain>{{domain}}</domain>
    <complexity>{{complexity_level}}</complexity>
    <total_nodes>{{node_count}}</total_nodes>
    <total_edges>{{edge_count}}</total_edges>
    <max_depth>{{max_depth}}</max_depth>
    <generation_context>Generated from: {{original_prompt}}</generation_context>
  </metadata>
  <nodes>
    <node id="{{unique_id}}" level="{{level}}" category="{{category}}" expanded="{{true/false}}">
      <content>
        <title>{{node_title}}</title>
        <description>{{detailed_description}}</description>
      </content>
      <position x="{{x_coord}}" y="{{y_coord}}" width="{{width}}" height="{{height}}"/>
      <style color="{{hex_color}}" shape="{{shape}}" border="{{border_style}}"/>
      <details>
        <item>{{detail_1}}</item>
      </details>
      <processes>
        <step>{{process_1}}</step>
      </processes>
      <considerations>
        <point>{{consideration_1}}</point>
      </considerations>
    </node>
  </nodes>
  <edges>
    <edge id="{{edge_id}}" source="{{source_id}}" target="{{target_id}}">
      <label>{{relationship_label}}</label>
      <description>{{relationship_description}}</description>
      <style color="{{hex_color}}" weight="{{thickness}}" line_style="{{solid/dashed}}"/>
    </edge>
  </edges>
</mindmap>

Requirements:
- All node IDs must be unique
- All coordinates must be integers
- Colors must be valid 6-digit hex codes
- Include ALL nodes and edges from the structured data
- Include all details, processes and considerations for each node
- XML must be valid and well-formed
- Use the current timestamp for created_at

Return ONLY the XML content, no other text."#
    )
}

/// Stage 4: ask the model to check and fix the document.
pub fn markup_validation(markup: &str) -> String {
    format!(
        r#"Validate and fix this XML mindmap if needed:

{markup}

Check for:
1. Valid XML syntax with proper encoding
2. All opening tags have matching closing tags
3. All attributes are properly quoted
4. Node IDs are unique across the document
5. Edge source/target IDs reference existing nodes
6. Coordinates are valid integers
7. Colors are valid hex codes (6-digit format)
8. All required elements are present (title, description, details, ...)
9. Proper nesting of detail items, process steps and consideration points
10. Metadata completeness

If there are errors, fix them and return the corrected XML.
If it is valid, return it as-is, keeping all detailed information.

Return ONLY the XML content, no other text or explanations."#
    )
}

/// Single-shot repair of a document that failed to parse.
pub fn markup_repair(markup: &str) -> String {
    format!(
        r#"Fix this XML content to make it valid and well-formed:

{markup}

Common issues to fix:
- Unclosed tags
- Mismatched tags
- Invalid characters in attribute values
- Missing quotes around attributes
- Improper nesting

Return ONLY the corrected XML, no explanations."#
    )
}
