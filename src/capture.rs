//! Capture output: the serializable snapshot of one traversal.
//!
//! Field names are stable and match the WebSketch raw-capture JSON shape:
//! `root`, `metadata.{url,title,timestamp,schemaVersion,viewport}` and an
//! optional `warnings` array. Optional node fields are omitted, never `null`.

use crate::dom::{Bounds, ComputedStyle};
use crate::Viewport;
use crate::{Error, Result};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// IR schema version stamped into every capture
pub const IR_SCHEMA_VERSION: &str = "0.1";

/// Complete result of one traversal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capture {
    pub root: CaptureNode,
    pub metadata: Metadata,

    /// Truncation warnings; `None` when no limit fired
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
}

/// Where and when a capture was taken
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub url: String,
    pub title: String,
    /// ISO-8601 timestamp, UTC
    pub timestamp: String,
    pub schema_version: String,
    pub viewport: Viewport,
}

/// One element's mirrored record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureNode {
    /// Element type, as reported by the host (e.g. `DIV`)
    #[serde(rename = "type")]
    pub element_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Class names in attribute order, without duplicates or empty entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<IndexSet<String>>,

    /// Own text (excluding descendants), trimmed and length-limited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    pub bounds: Bounds,
    pub styles: ComputedStyle,

    /// Visited child elements; absent when none were visited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<CaptureNode>>,
}

impl Capture {
    /// Assemble a capture, dropping an empty warning list
    pub fn new(root: CaptureNode, metadata: Metadata, warnings: Vec<String>) -> Self {
        Self {
            root,
            metadata,
            warnings: if warnings.is_empty() { None } else { Some(warnings) },
        }
    }

    /// Whether any traversal limit cut the tree short
    pub fn is_truncated(&self) -> bool {
        self.warnings.as_ref().is_some_and(|w| !w.is_empty())
    }

    /// One-line notice for display next to a truncated capture
    pub fn truncation_summary(&self) -> Option<String> {
        self.warnings
            .as_ref()
            .and_then(|w| w.first())
            .map(|first| format!("Capture truncated: {}", first))
    }

    /// Total number of nodes in the captured tree
    pub fn node_count(&self) -> usize {
        self.root.count()
    }

    /// Serialize to compact JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Error::from)
    }

    /// Serialize to indented JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Error::from)
    }
}

impl Drop for CaptureNode {
    /// Unlinks descendants onto a heap stack so deep trees drop without recursion
    fn drop(&mut self) {
        let mut pending = self.children.take().unwrap_or_default();
        while let Some(mut node) = pending.pop() {
            if let Some(children) = node.children.take() {
                pending.extend(children);
            }
        }
    }
}

impl CaptureNode {
    /// A node with only the mandatory fields set
    pub fn new(element_type: impl Into<String>, bounds: Bounds, styles: ComputedStyle) -> Self {
        Self {
            element_type: element_type.into(),
            id: None,
            classes: None,
            text: None,
            bounds,
            styles,
            children: None,
        }
    }

    /// `TYPE#id`, or `TYPE#?` without an id
    pub fn label(&self) -> String {
        format!("{}#{}", self.element_type, self.id.as_deref().unwrap_or("?"))
    }

    /// Visited children, empty when the field is absent
    pub fn child_nodes(&self) -> &[CaptureNode] {
        self.children.as_deref().unwrap_or_default()
    }

    /// Count this node and all captured descendants
    pub fn count(&self) -> usize {
        let mut total = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            total += 1;
            stack.extend(node.child_nodes());
        }
        total
    }

    /// Depth of the deepest captured descendant (0 for a leaf)
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(node.child_nodes().iter().map(|c| (c, depth + 1)));
        }
        deepest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata() -> Metadata {
        Metadata {
            url: "https://example.com/".to_string(),
            title: "Example".to_string(),
            timestamp: "2024-01-01T00:00:00.000Z".to_string(),
            schema_version: IR_SCHEMA_VERSION.to_string(),
            viewport: Viewport::default(),
        }
    }

    fn leaf(tag: &str) -> CaptureNode {
        CaptureNode::new(tag, Bounds::new(0.0, 0.0, 10.0, 10.0), ComputedStyle::default())
    }

    #[test]
    fn test_empty_warnings_are_dropped() {
        let capture = Capture::new(leaf("HTML"), metadata(), Vec::new());
        assert!(capture.warnings.is_none());
        assert!(!capture.is_truncated());
        assert!(capture.truncation_summary().is_none());

        let json = serde_json::to_value(&capture).unwrap();
        assert!(json.get("warnings").is_none());
    }

    #[test]
    fn test_truncation_summary_uses_first_warning() {
        let warnings = vec!["first".to_string(), "second".to_string()];
        let capture = Capture::new(leaf("HTML"), metadata(), warnings);
        assert!(capture.is_truncated());
        assert_eq!(capture.truncation_summary().as_deref(), Some("Capture truncated: first"));
    }

    #[test]
    fn test_json_shape() {
        let mut root = leaf("HTML");
        let mut body = leaf("BODY");
        body.id = Some("main".to_string());
        body.classes = Some(["a", "b"].iter().map(|s| s.to_string()).collect());
        body.text = Some("Hello".to_string());
        root.children = Some(vec![body]);

        let capture = Capture::new(root, metadata(), vec!["w".to_string()]);
        let json = serde_json::to_value(&capture).unwrap();

        assert_eq!(json["metadata"]["schemaVersion"], json!(IR_SCHEMA_VERSION));
        assert_eq!(json["metadata"]["viewport"], json!({ "width": 1280, "height": 720 }));
        assert_eq!(json["warnings"], json!(["w"]));
        assert_eq!(json["root"]["type"], json!("HTML"));
        assert!(json["root"].get("id").is_none());
        assert!(json["root"].get("classes").is_none());
        assert!(json["root"].get("text").is_none());

        let body = &json["root"]["children"][0];
        assert_eq!(body["id"], json!("main"));
        assert_eq!(body["classes"], json!(["a", "b"]));
        assert_eq!(body["text"], json!("Hello"));
        assert_eq!(body["bounds"], json!({ "x": 0.0, "y": 0.0, "width": 10.0, "height": 10.0 }));
        assert_eq!(
            body["styles"],
            json!({ "display": "inline", "position": "static", "visibility": "visible" })
        );
        assert!(body.get("children").is_none());
    }

    #[test]
    fn test_counts_and_label() {
        let mut root = leaf("UL");
        let mut item = leaf("LI");
        item.children = Some(vec![leaf("A")]);
        root.children = Some(vec![item, leaf("LI")]);
        root.id = Some("menu".to_string());

        assert_eq!(root.count(), 4);
        assert_eq!(root.depth(), 2);
        assert_eq!(root.label(), "UL#menu");
        assert_eq!(root.child_nodes()[1].label(), "LI#?");

        let capture = Capture::new(root, metadata(), Vec::new());
        assert_eq!(capture.node_count(), 4);
        let parsed: Capture = serde_json::from_str(&capture.to_json().unwrap()).unwrap();
        assert_eq!(parsed, capture);
    }
}
