//! Flattens ticket descriptions into plain text.
//!
//! The v2 REST API returns descriptions as wiki-markup strings while v3 and the
//! agile endpoints return Atlassian Document Format trees. Both shapes end up
//! here and leave as a single string.

use serde_json::{Map, Value};

/// A description payload, classified once before flattening.
#[derive(Debug, Clone, PartialEq)]
pub enum RawDescription {
    Plain(String),
    Document(DocNode),
    Unrecognized,
}

/// One node of a rich-document tree. Only `text` and `content` matter here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocNode {
    pub text: Option<String>,
    pub content: Vec<DocNode>,
}

impl DocNode {
    fn from_object(object: &Map<String, Value>) -> Self {
        let text = object
            .get("text")
            .and_then(Value::as_str)
            .map(str::to_string);

        // Children that are not objects carry no text; drop them.
        let content = object
            .get("content")
            .and_then(Value::as_array)
            .map(|children| {
                children
                    .iter()
                    .filter_map(Value::as_object)
                    .map(DocNode::from_object)
                    .collect()
            })
            .unwrap_or_default();

        Self { text, content }
    }

    fn write_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.content {
            let mut child_text = String::new();
            child.write_text(&mut child_text);
            if !child_text.is_empty() {
                out.push_str(&child_text);
                out.push(' ');
            }
        }
    }
}

impl RawDescription {
    /// Tries the string shape first, then the document tree.
    pub fn classify(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(text)) => RawDescription::Plain(text.clone()),
            Some(Value::Object(object)) => RawDescription::Document(DocNode::from_object(object)),
            _ => RawDescription::Unrecognized,
        }
    }

    pub fn to_text(&self) -> String {
        match self {
            RawDescription::Plain(text) => text.clone(),
            RawDescription::Document(node) => {
                let mut out = String::new();
                node.write_text(&mut out);
                out
            }
            RawDescription::Unrecognized => String::new(),
        }
    }
}

/// Never fails: anything unreadable becomes an empty string.
pub fn normalize(value: Option<&Value>) -> String {
    RawDescription::classify(value).to_text()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_string_is_unchanged() {
        for input in ["", "plain", "h1. Title\n*bold* text", "  spaced  "] {
            let value = json!(input);
            assert_eq!(normalize(Some(&value)), input);
        }
    }

    #[test]
    fn test_normalizing_twice_is_stable() {
        let doc = json!({"content": [{"text": "a"}, {"text": "b"}]});
        let once = normalize(Some(&doc));
        let twice = normalize(Some(&json!(once.clone())));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_document_emits_leaves_in_order() {
        let doc = json!({
            "type": "doc",
            "version": 1,
            "content": [
                {"type": "heading", "content": [{"type": "text", "text": "Overview"}]},
                {"type": "paragraph", "content": [
                    {"type": "text", "text": "first"},
                    {"type": "text", "text": "second"}
                ]},
                {"type": "bulletList", "content": [
                    {"type": "listItem", "content": [
                        {"type": "paragraph", "content": [{"type": "text", "text": "third"}]}
                    ]}
                ]}
            ]
        });
        let text = normalize(Some(&doc));

        let positions: Vec<usize> = ["Overview", "first", "second", "third"]
            .iter()
            .map(|leaf| text.find(leaf).expect("leaf missing"))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_exact_spacing_for_nested_nodes() {
        let doc = json!({"content": [{"content": [{"text": "a"}, {"text": "b"}]}]});
        // inner paragraph yields "a b ", outer appends one more space
        assert_eq!(normalize(Some(&doc)), "a b  ");
    }

    #[test]
    fn test_tree_without_text_is_empty() {
        let doc = json!({
            "type": "doc",
            "content": [{"type": "rule"}, {"type": "paragraph", "content": []}]
        });
        assert_eq!(normalize(Some(&doc)), "");
    }

    #[test]
    fn test_malformed_input_is_empty() {
        assert_eq!(normalize(None), "");
        assert_eq!(normalize(Some(&Value::Null)), "");
        assert_eq!(normalize(Some(&json!(42))), "");
        assert_eq!(normalize(Some(&json!(["text"]))), "");
    }

    #[test]
    fn test_non_object_children_are_skipped() {
        let doc = json!({"content": ["stray", 7, {"text": "kept"}]});
        assert_eq!(normalize(Some(&doc)), "kept ");
    }

    #[test]
    fn test_classify_variants() {
        assert_eq!(
            RawDescription::classify(Some(&json!("x"))),
            RawDescription::Plain("x".into())
        );
        assert!(matches!(
            RawDescription::classify(Some(&json!({"text": "x"}))),
            RawDescription::Document(_)
        ));
        assert_eq!(RawDescription::classify(None), RawDescription::Unrecognized);
    }
}
