//! Bounded capture walker.
//!
//! A single pre-order, depth-first pass over the host tree. Every visited
//! element is counted before any limit check and always gets its scalar fields
//! (type, id, classes, own text, bounds, styles). Limits only decide whether
//! the walker descends into an element's children:
//!
//! 1. at `depth >= max_depth` the children are skipped;
//! 2. once `node_count >= max_nodes` the children are skipped;
//! 3. while iterating children the node limit is re-checked before each one,
//!    so a long sibling run can be cut part-way.
//!
//! Each cut that actually drops elements appends one human-readable warning.
//! Own-text length is limited separately and never produces a warning.

use crate::capture::{Capture, CaptureNode, Metadata, IR_SCHEMA_VERSION};
use crate::dom::{Document, Element};
use crate::limits::Limits;
use crate::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexSet;

/// Capture `document` with `limits`, timestamped now.
pub fn capture<D: Document>(document: &D, limits: &Limits) -> Result<Capture> {
    capture_at(document, limits, Utc::now())
}

/// Capture `document` with `limits`, stamped with `timestamp`.
///
/// Fails only when the document has no root element.
pub fn capture_at<D: Document>(
    document: &D,
    limits: &Limits,
    timestamp: DateTime<Utc>,
) -> Result<Capture> {
    let root = document
        .root_element()
        .ok_or_else(|| Error::NoCaptureTarget("document has no root element".into()))?;

    let mut state = CaptureState::new(*limits);
    let root = state.walk(&root);

    let metadata = Metadata {
        url: document.url(),
        title: document.title(),
        timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        schema_version: IR_SCHEMA_VERSION.to_string(),
        viewport: document.viewport(),
    };

    log::debug!(
        "Captured {} nodes from {} ({} warnings)",
        state.node_count,
        metadata.url,
        state.warnings.len()
    );

    Ok(Capture::new(root, metadata, state.warnings))
}

/// An element whose children are being visited
struct Frame<E> {
    node: CaptureNode,
    children: std::vec::IntoIter<E>,
    /// Children not yet taken from `children`
    remaining: usize,
    captured: Vec<CaptureNode>,
    depth: usize,
}

impl<E> Frame<E> {
    fn finish(self) -> CaptureNode {
        let mut node = self.node;
        if !self.captured.is_empty() {
            node.children = Some(self.captured);
        }
        node
    }
}

enum Visit<E> {
    /// Captured without descending
    Leaf(CaptureNode),
    Open(Frame<E>),
}

/// Mutable state of one traversal; never shared between captures
struct CaptureState {
    node_count: usize,
    warnings: Vec<String>,
    limits: Limits,
}

impl CaptureState {
    fn new(limits: Limits) -> Self {
        Self {
            node_count: 0,
            warnings: Vec::new(),
            limits,
        }
    }

    fn warn(&mut self, warning: String) {
        log::debug!("{}", warning);
        self.warnings.push(warning);
    }

    /// Count `element` and either finish it as a leaf or open it for descent
    fn enter<E: Element>(&mut self, element: &E, depth: usize) -> Visit<E> {
        self.node_count += 1;

        let node = self.describe(element);

        if depth >= self.limits.max_depth {
            let skipped = element.child_element_count();
            if skipped > 0 {
                self.warn(format!(
                    "Depth limit ({}) reached at {}: {} children skipped",
                    self.limits.max_depth,
                    node.label(),
                    skipped
                ));
            }
            return Visit::Leaf(node);
        }

        if self.node_count >= self.limits.max_nodes {
            let skipped = element.child_element_count();
            if skipped > 0 {
                self.warn(format!(
                    "Node limit ({}) reached at {}: {} children skipped",
                    self.limits.max_nodes,
                    node.label(),
                    skipped
                ));
            }
            return Visit::Leaf(node);
        }

        let children = element.children();
        Visit::Open(Frame {
            node,
            remaining: children.len(),
            children: children.into_iter(),
            captured: Vec::new(),
            depth,
        })
    }

    /// Pre-order walk from `root` with an explicit stack of open elements,
    /// so host nesting never translates into call depth.
    fn walk<E: Element>(&mut self, root: &E) -> CaptureNode {
        let mut frame = match self.enter(root, 0) {
            Visit::Leaf(node) => return node,
            Visit::Open(frame) => frame,
        };
        let mut ancestors: Vec<Frame<E>> = Vec::new();

        loop {
            let next = if frame.remaining > 0 && self.node_count >= self.limits.max_nodes {
                self.warn(format!(
                    "Node limit ({}) reached in {}: {} siblings skipped",
                    self.limits.max_nodes,
                    frame.node.label(),
                    frame.remaining
                ));
                None
            } else {
                frame.children.next()
            };

            match next {
                Some(child) => {
                    frame.remaining -= 1;
                    match self.enter(&child, frame.depth + 1) {
                        Visit::Leaf(node) => frame.captured.push(node),
                        Visit::Open(open) => ancestors.push(std::mem::replace(&mut frame, open)),
                    }
                }
                None => {
                    let node = frame.finish();
                    match ancestors.pop() {
                        Some(parent) => {
                            frame = parent;
                            frame.captured.push(node);
                        }
                        None => return node,
                    }
                }
            }
        }
    }

    /// Scalar fields of a node; independent of the depth and node limits
    fn describe<E: Element>(&self, element: &E) -> CaptureNode {
        let mut node = CaptureNode::new(
            element.tag_name(),
            element.bounding_rect(),
            element.computed_style(),
        );
        node.id = element.id().filter(|id| !id.is_empty());
        node.classes = element.class_name().and_then(|raw| class_set(&raw));
        node.text = own_text(element, self.limits.max_string_length);
        node
    }
}

fn class_set(raw: &str) -> Option<IndexSet<String>> {
    let classes: IndexSet<String> = raw.split_ascii_whitespace().map(str::to_string).collect();
    if classes.is_empty() {
        None
    } else {
        Some(classes)
    }
}

/// Trimmed text-node contents joined together, cut at `max_chars` characters.
///
/// Chunks after the limit is reached are neither trimmed nor counted, but the
/// host has already copied every text node by the time this runs.
fn own_text<E: Element>(element: &E, max_chars: usize) -> Option<String> {
    let mut text = String::new();
    let mut remaining = max_chars;
    for chunk in element.text_nodes() {
        if remaining == 0 {
            break;
        }
        let trimmed = chunk.trim();
        match trimmed.char_indices().nth(remaining) {
            Some((cut, _)) => {
                text.push_str(&trimmed[..cut]);
                remaining = 0;
            }
            None => {
                text.push_str(trimmed);
                remaining -= trimmed.chars().count();
            }
        }
    }
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
