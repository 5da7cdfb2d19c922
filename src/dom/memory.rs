//! Owned in-memory document tree.
//!
//! Useful for tests, benchmarks and for callers that already hold a DOM
//! snapshot in some other form and want to run it through the walker.

use super::{Bounds, ComputedStyle, Document, Element};
use crate::Viewport;

/// An element held entirely in memory
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MemoryElement {
    /// Element type (e.g. "DIV")
    pub tag_name: String,

    /// `id` attribute
    pub id: Option<String>,

    /// Raw `class` attribute
    pub class_name: Option<String>,

    /// Direct text-node children, in order
    pub text_nodes: Vec<String>,

    pub bounds: Bounds,
    pub style: ComputedStyle,

    /// Child elements
    pub children: Vec<MemoryElement>,
}

impl MemoryElement {
    /// Create a new element with default geometry and style
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            id: None,
            class_name: None,
            text_nodes: Vec::new(),
            bounds: Bounds::default(),
            style: ComputedStyle::default(),
            children: Vec::new(),
        }
    }

    /// Builder method: set the `id` attribute
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Builder method: set the raw `class` attribute
    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Builder method: append a text-node child
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_nodes.push(text.into());
        self
    }

    /// Builder method: set bounding geometry
    pub fn with_bounds(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.bounds = Bounds::new(x, y, width, height);
        self
    }

    /// Builder method: set the computed style subset
    pub fn with_style(mut self, style: ComputedStyle) -> Self {
        self.style = style;
        self
    }

    /// Builder method: append a child element
    pub fn with_child(mut self, child: MemoryElement) -> Self {
        self.children.push(child);
        self
    }

    /// Builder method: replace the children
    pub fn with_children(mut self, children: Vec<MemoryElement>) -> Self {
        self.children = children;
        self
    }

    /// Add a child element
    pub fn add_child(&mut self, child: MemoryElement) {
        self.children.push(child);
    }

    /// Build a single chain `depth` elements deep below a new `tag_name` root.
    ///
    /// The result has `depth + 1` elements in total.
    pub fn chain(tag_name: &str, depth: usize) -> Self {
        let mut node = MemoryElement::new(tag_name);
        for _ in 0..depth {
            node = MemoryElement::new(tag_name).with_child(node);
        }
        node
    }

    /// Count this element and all of its descendants
    pub fn count(&self) -> usize {
        let mut total = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            total += 1;
            stack.extend(node.children.iter());
        }
        total
    }
}

impl Drop for MemoryElement {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut element) = pending.pop() {
            pending.append(&mut element.children);
        }
    }
}

impl<'a> Element for &'a MemoryElement {
    fn tag_name(&self) -> String {
        self.tag_name.clone()
    }

    fn id(&self) -> Option<String> {
        self.id.clone()
    }

    fn class_name(&self) -> Option<String> {
        self.class_name.clone()
    }

    fn text_nodes(&self) -> Vec<String> {
        self.text_nodes.clone()
    }

    fn bounding_rect(&self) -> Bounds {
        self.bounds
    }

    fn computed_style(&self) -> ComputedStyle {
        self.style.clone()
    }

    fn children(&self) -> Vec<Self> {
        let this: &'a MemoryElement = *self;
        this.children.iter().collect()
    }

    fn child_element_count(&self) -> usize {
        self.children.len()
    }
}

/// A document backed by a [`MemoryElement`] tree
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryDocument {
    pub url: String,
    pub title: String,
    pub viewport: Viewport,

    /// Document element; `None` models a detached document
    pub root: Option<MemoryElement>,
}

impl MemoryDocument {
    /// Create a document at `about:blank` around `root`
    pub fn new(root: MemoryElement) -> Self {
        Self {
            url: "about:blank".to_string(),
            title: String::new(),
            viewport: Viewport::default(),
            root: Some(root),
        }
    }

    /// A document without a root element
    pub fn detached() -> Self {
        Self {
            url: "about:blank".to_string(),
            title: String::new(),
            viewport: Viewport::default(),
            root: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }
}

impl Document for MemoryDocument {
    type Element<'a> = &'a MemoryElement;

    fn root_element(&self) -> Option<&MemoryElement> {
        self.root.as_ref()
    }

    fn url(&self) -> String {
        self.url.clone()
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }
}
