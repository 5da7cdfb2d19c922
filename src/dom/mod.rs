//! Read-only view of a host document
//!
//! The walker never touches a concrete DOM. It reads elements through the
//! [`Element`] and [`Document`] traits, which a live browser bridge, a parsed
//! static document or a test fake can all implement:
//! - [`memory`]: owned in-memory tree, handy for tests and synthetic input
//! - [`html`]: static HTML parsed with `scraper` (feature `html`)
//! - [`layout`]: naive block-flow geometry used by the static backend

pub mod layout;
pub mod memory;

#[cfg(feature = "html")]
pub mod html;

use crate::Viewport;
use serde::{Deserialize, Serialize};

/// Bounding geometry of an element in CSS pixels.
///
/// Values come straight from the host and may be negative or zero for
/// off-screen, collapsed or empty elements.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Whether the box has a non-zero area
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// The computed style subset recorded for every captured element.
///
/// Values are the host's raw computed strings and are not validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedStyle {
    pub display: String,
    pub position: String,
    pub visibility: String,
}

impl ComputedStyle {
    pub fn new(
        display: impl Into<String>,
        position: impl Into<String>,
        visibility: impl Into<String>,
    ) -> Self {
        Self {
            display: display.into(),
            position: position.into(),
            visibility: visibility.into(),
        }
    }
}

impl Default for ComputedStyle {
    /// Initial values of the three properties
    fn default() -> Self {
        Self::new("inline", "static", "visible")
    }
}

/// A single element of the host tree.
///
/// Implementations are cheap handles (references or small copies); the walker
/// clones nothing but the strings it records.
pub trait Element: Sized {
    /// Element type as the host reports it (e.g. `DIV`)
    fn tag_name(&self) -> String;

    /// Value of the `id` attribute, if any
    fn id(&self) -> Option<String>;

    /// Raw `class` attribute value, if any
    fn class_name(&self) -> Option<String>;

    /// Contents of the direct text-node children, in document order.
    ///
    /// Text belonging to descendant elements is not included.
    fn text_nodes(&self) -> Vec<String>;

    /// Bounding client rect
    fn bounding_rect(&self) -> Bounds;

    /// Computed display, position and visibility
    fn computed_style(&self) -> ComputedStyle;

    /// Direct child elements in document order
    fn children(&self) -> Vec<Self>;

    /// Number of direct child elements
    fn child_element_count(&self) -> usize {
        self.children().len()
    }
}

/// A document that can be captured.
pub trait Document {
    type Element<'a>: Element
    where
        Self: 'a;

    /// The document element, or `None` when the document is detached
    fn root_element(&self) -> Option<Self::Element<'_>>;

    /// Current location of the document
    fn url(&self) -> String;

    /// Document title
    fn title(&self) -> String;

    /// Viewport the geometry was measured against
    fn viewport(&self) -> Viewport;
}
