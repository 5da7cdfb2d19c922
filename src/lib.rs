//! WebSketch capture
//!
//! Snapshots a document tree into a portable, size-bounded intermediate
//! representation: a serializable tree mirroring element structure, geometry
//! and a small style subset, annotated with capture metadata and truncation
//! warnings.
//!
//! # Features
//!
//! - **Bounded walker**: depth, node-count and string-length limits are
//!   enforced during a single depth-first pass, so arbitrarily large or deeply
//!   nested documents still produce a bounded capture
//! - **Limits provider**: defaults overridden by values persisted in a
//!   key-value settings store
//! - **Host abstraction**: any tree implementing [`dom::Element`] can be
//!   captured; an in-memory tree and a static HTML backend (`html` feature,
//!   default) are included
//! - **Transport**: a worker-backed async host answering `CAPTURE_PAGE`
//!   messages with `{ success, capture | error }`
//!
//! # Example
//!
//! ```
//! use websketch_capture::dom::memory::{MemoryDocument, MemoryElement};
//! use websketch_capture::{capture, Limits};
//!
//! # fn main() -> websketch_capture::Result<()> {
//! let root = MemoryElement::new("HTML")
//!     .with_child(MemoryElement::new("BODY").with_text("Hello World"));
//! let document = MemoryDocument::new(root).with_url("https://example.com");
//!
//! let limits = Limits {
//!     max_string_length: 5,
//!     ..Default::default()
//! };
//! let snapshot = capture(&document, &limits)?;
//! assert!(snapshot.warnings.is_none());
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, Result};

pub mod capture;
pub mod dom;
pub mod limits;
pub mod settings;
pub mod transport;
pub mod walker;

// Loading documents over HTTP or from disk
#[cfg(feature = "html")]
pub mod fetch;

pub use capture::{Capture, CaptureNode, Metadata, IR_SCHEMA_VERSION};
pub use limits::{Limits, LimitsProvider, LimitsSource, PartialLimits, WithOverrides};
pub use settings::{JsonFileStore, MemoryStore, SettingsStore};
pub use transport::{CaptureHost, CaptureRequest, CaptureResponse};
pub use walker::{capture, capture_at};

/// Viewport dimensions reported in capture metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Capture a static HTML document with the given limits.
///
/// The markup is parsed with the `html` backend and laid out against
/// `viewport` before the walk starts.
#[cfg(feature = "html")]
pub fn capture_html(html: &str, url: &str, viewport: Viewport, limits: &Limits) -> Result<Capture> {
    let document = dom::html::HtmlDocument::parse(html, url, viewport);
    capture(&document, limits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_viewport() {
        let viewport = Viewport::default();
        assert_eq!(viewport.width, 1280);
        assert_eq!(viewport.height, 720);
    }

    #[test]
    fn test_viewport_serializes_plainly() {
        let viewport = Viewport {
            width: 1920,
            height: 1080,
        };
        let json = serde_json::to_value(viewport).unwrap();
        assert_eq!(json, serde_json::json!({ "width": 1920, "height": 1080 }));
    }

    #[cfg(feature = "html")]
    #[test]
    fn test_capture_html_convenience() {
        let html = "<html><head><title>Hi</title></head><body><p id=intro>Hello</p></body></html>";
        let snapshot = capture_html(html, "https://example.com/", Viewport::default(), &Limits::default()).unwrap();
        assert_eq!(snapshot.metadata.title, "Hi");
        assert_eq!(snapshot.root.element_type, "HTML");
        assert!(snapshot.warnings.is_none());
    }
}
