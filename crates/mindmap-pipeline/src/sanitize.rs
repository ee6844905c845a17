//! Cleanup of raw model text before structured parsing.

use once_cell::sync::Lazy;
use regex::Regex;

static TRAILING_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",(\s*[}\]])").unwrap());

/// Body of the first fenced code block, or the input if there is none.
///
/// A ```` ```json ```` fence wins over a bare one. An unterminated fence
/// yields everything after the opening marker.
fn strip_code_fence(content: &str) -> &str {
    if let Some(open) = content.find("```json") {
        let body = &content[open + "```json".len()..];
        return match body.find("```") {
            Some(close) => &body[..close],
            None => body,
        };
    }
    if let Some(open) = content.find("```") {
        let body_start = open + 3;
        return match content.rfind("```") {
            Some(close) if close > open => &content[body_start..close],
            _ => &content[body_start..],
        };
    }
    content
}

/// Extract a parseable JSON object from model output.
///
/// Removes markdown fences, text before the first `{` and after the last
/// `}`, flattens newlines and tabs to spaces (models put raw newlines inside
/// string values), and drops trailing commas before `}` or `]`.
pub fn clean_json_response(content: &str) -> String {
    let mut body = strip_code_fence(content);

    if let (Some(start), Some(end)) = (body.find('{'), body.rfind('}')) {
        if end > start {
            body = &body[start..=end];
        }
    }

    let flattened = body.replace(['\n', '\r', '\t'], " ");
    TRAILING_COMMA
        .replace_all(&flattened, "$1")
        .trim()
        .to_string()
}

/// Strip a markdown fence (with optional language tag) around markup text.
pub fn strip_markup_fences(content: &str) -> String {
    let mut text = content.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // Drop the language tag, e.g. "xml", up to the end of the line
        text = match rest.find('\n') {
            Some(nl) if rest[..nl].chars().all(|c| c.is_ascii_alphanumeric()) => &rest[nl + 1..],
            _ => rest.strip_prefix("xml").unwrap_or(rest),
        };
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }

    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{"main_topic": "Coffee", "concepts": [{"id": "root"}]}"#;

    #[test]
    fn test_fenced_equals_unfenced() {
        let fenced = format!("```json\n{}\n```", BODY);
        assert_eq!(clean_json_response(&fenced), clean_json_response(BODY));

        let bare_fence = format!("```\n{}\n```", BODY);
        assert_eq!(clean_json_response(&bare_fence), clean_json_response(BODY));
    }

    #[test]
    fn test_strips_surrounding_prose() {
        let chatty = format!("Here is your mindmap:\n{}\nLet me know if you need more!", BODY);
        assert_eq!(clean_json_response(&chatty), BODY);
    }

    #[test]
    fn test_removes_trailing_commas() {
        let input = r#"{"a": [1, 2, ], "b": {"c": 3,
        },}"#;
        let cleaned = clean_json_response(input);
        let parsed: serde_json::Value = serde_json::from_str(&cleaned).unwrap();
        assert_eq!(parsed["a"], serde_json::json!([1, 2]));
        assert_eq!(parsed["b"]["c"], 3);
    }

    #[test]
    fn test_newlines_inside_strings_flattened() {
        let input = "{\"description\": \"line one\nline two\"}";
        let parsed: serde_json::Value =
            serde_json::from_str(&clean_json_response(input)).unwrap();
        assert_eq!(parsed["description"], "line one line two");
    }

    #[test]
    fn test_unterminated_fence() {
        let input = format!("```json\n{}", BODY);
        assert_eq!(clean_json_response(&input), BODY);
    }

    #[test]
    fn test_no_json_passes_through() {
        assert_eq!(clean_json_response("  sorry, I can't  "), "sorry, I can't");
    }

    #[test]
    fn test_strip_markup_fences() {
        let xml = "<mindmap></mindmap>";
        assert_eq!(strip_markup_fences(&format!("```xml\n{}\n```", xml)), xml);
        assert_eq!(strip_markup_fences(&format!("```\n{}\n```", xml)), xml);
        assert_eq!(strip_markup_fences(&format!("```xml{}```", xml)), xml);
        assert_eq!(strip_markup_fences(&format!("  {}  ", xml)), xml);
    }
}
