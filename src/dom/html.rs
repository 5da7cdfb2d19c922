//! Static HTML documents parsed with `scraper`.
//!
//! There is no script execution and no stylesheet cascade. Computed styles
//! come from user-agent defaults per tag, the `hidden` attribute and inline
//! `style` declarations (with `visibility` inherited), and geometry from the
//! naive flow in [`super::layout`]. Both are computed once at parse time.

use super::layout::{self, FlowNode};
use super::{Bounds, ComputedStyle, Document, Element};
use crate::Viewport;
use ego_tree::NodeId;
use scraper::{ElementRef, Html};
use std::collections::HashMap;

/// Tags rendered as `display: none` by default
const HIDDEN_TAGS: &[&str] = &[
    "head", "script", "style", "title", "meta", "link", "base", "template", "noscript",
];

/// Tags rendered as `display: block` by default
const BLOCK_TAGS: &[&str] = &[
    "html", "body", "address", "article", "aside", "blockquote", "details", "dialog", "dd",
    "div", "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3",
    "h4", "h5", "h6", "header", "hgroup", "hr", "main", "menu", "nav", "ol", "p", "pre",
    "section", "summary", "ul",
];

fn default_display(tag: &str) -> &'static str {
    if HIDDEN_TAGS.contains(&tag) {
        return "none";
    }
    if BLOCK_TAGS.contains(&tag) {
        return "block";
    }
    match tag {
        "li" => "list-item",
        "table" => "table",
        "caption" => "table-caption",
        "thead" => "table-header-group",
        "tbody" => "table-row-group",
        "tfoot" => "table-footer-group",
        "tr" => "table-row",
        "td" | "th" => "table-cell",
        "col" => "table-column",
        "colgroup" => "table-column-group",
        "button" | "input" | "select" | "textarea" | "img" => "inline-block",
        _ => "inline",
    }
}

/// Inline `style` declarations as lowercase (property, value) pairs
fn inline_declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (property, value) = decl.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            let value = value.trim().trim_end_matches("!important").trim().to_ascii_lowercase();
            if property.is_empty() || value.is_empty() {
                None
            } else {
                Some((property, value))
            }
        })
        .collect()
}

fn compute_style(element: &ElementRef<'_>, parent: Option<&ComputedStyle>) -> ComputedStyle {
    let value = element.value();
    let mut style = ComputedStyle::new(
        default_display(value.name()),
        "static",
        parent.map(|p| p.visibility.as_str()).unwrap_or("visible"),
    );
    if value.attr("hidden").is_some() {
        style.display = "none".to_string();
    }
    if let Some(inline) = value.attr("style") {
        for (property, declared) in inline_declarations(inline) {
            match property.as_str() {
                "display" => style.display = declared,
                "position" => style.position = declared,
                "visibility" => {
                    style.visibility = if declared == "inherit" {
                        parent.map(|p| p.visibility.clone()).unwrap_or_else(|| "visible".into())
                    } else {
                        declared
                    }
                }
                _ => {}
            }
        }
    }
    style
}

fn text_nodes_of(element: &ElementRef<'_>) -> Vec<String> {
    element
        .children()
        .filter_map(|node| {
            node.value().as_text().map(|t| {
                let text: &str = t;
                text.to_owned()
            })
        })
        .collect()
}

fn child_elements<'a>(element: &ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element.children().filter_map(ElementRef::wrap)
}

#[derive(Debug, Clone)]
struct Rendered {
    bounds: Bounds,
    style: ComputedStyle,
}

/// A parsed HTML document with precomputed styles and geometry
pub struct HtmlDocument {
    html: Html,
    url: String,
    viewport: Viewport,
    rendered: HashMap<NodeId, Rendered>,
}

impl HtmlDocument {
    /// Parse `html` as if it had been loaded from `url` into `viewport`
    pub fn parse(html: &str, url: impl Into<String>, viewport: Viewport) -> Self {
        let html = Html::parse_document(html);
        let rendered = render(&html, viewport);
        Self {
            html,
            url: url.into(),
            viewport,
            rendered,
        }
    }

    /// Parse a page returned by [`crate::fetch::load_source`]
    pub fn from_page(page: crate::fetch::LoadedPage, viewport: Viewport) -> Self {
        Self::parse(&page.html, page.url, viewport)
    }

    /// Number of elements in the document
    pub fn element_count(&self) -> usize {
        self.rendered.len()
    }
}

/// Styles and boxes for every element, computed without recursion
fn render(html: &Html, viewport: Viewport) -> HashMap<NodeId, Rendered> {
    let mut order: Vec<(ElementRef<'_>, Option<usize>)> = Vec::new();
    let mut stack = vec![(html.root_element(), None)];
    while let Some((element, parent)) = stack.pop() {
        let idx = order.len();
        order.push((element, parent));
        let children: Vec<_> = child_elements(&element).collect();
        for child in children.into_iter().rev() {
            stack.push((child, Some(idx)));
        }
    }

    let mut styles: Vec<ComputedStyle> = Vec::with_capacity(order.len());
    let mut flow_nodes = Vec::with_capacity(order.len());
    for (element, parent) in &order {
        let style = compute_style(element, parent.map(|p| &styles[p]));
        let text_chars = text_nodes_of(element)
            .iter()
            .map(|t| t.trim().chars().count())
            .sum();
        flow_nodes.push(FlowNode {
            parent: *parent,
            collapsed: style.display == "none",
            text_chars,
            inset: if element.value().name() == "body" { 8.0 } else { 0.0 },
        });
        styles.push(style);
    }

    let boxes = layout::flow(&flow_nodes, viewport);
    order
        .iter()
        .zip(styles)
        .zip(boxes)
        .map(|(((element, _), style), bounds)| (element.id(), Rendered { bounds, style }))
        .collect()
}

/// Handle to one element of an [`HtmlDocument`]
#[derive(Clone, Copy)]
pub struct HtmlElement<'a> {
    element: ElementRef<'a>,
    document: &'a HtmlDocument,
}

impl<'a> HtmlElement<'a> {
    fn rendered(&self) -> Option<&'a Rendered> {
        self.document.rendered.get(&self.element.id())
    }
}

impl<'a> Element for HtmlElement<'a> {
    /// Upper-cased like the DOM's `tagName` for HTML documents
    fn tag_name(&self) -> String {
        self.element.value().name().to_ascii_uppercase()
    }

    fn id(&self) -> Option<String> {
        self.element.value().id().map(str::to_string)
    }

    fn class_name(&self) -> Option<String> {
        self.element.value().attr("class").map(str::to_string)
    }

    fn text_nodes(&self) -> Vec<String> {
        text_nodes_of(&self.element)
    }

    fn bounding_rect(&self) -> Bounds {
        self.rendered().map(|r| r.bounds).unwrap_or_default()
    }

    fn computed_style(&self) -> ComputedStyle {
        self.rendered().map(|r| r.style.clone()).unwrap_or_default()
    }

    fn children(&self) -> Vec<Self> {
        let document = self.document;
        child_elements(&self.element)
            .map(|element| HtmlElement { element, document })
            .collect()
    }

    fn child_element_count(&self) -> usize {
        child_elements(&self.element).count()
    }
}

impl Document for HtmlDocument {
    type Element<'a> = HtmlElement<'a>;

    fn root_element(&self) -> Option<HtmlElement<'_>> {
        Some(HtmlElement {
            element: self.html.root_element(),
            document: self,
        })
    }

    fn url(&self) -> String {
        self.url.clone()
    }

    /// Text of the first `<title>`, whitespace-collapsed
    fn title(&self) -> String {
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "title")
            .map(|t| t.text().collect::<Vec<_>>().join(" "))
            .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
            .unwrap_or_default()
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }
}
