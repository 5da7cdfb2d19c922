//! Naive block-flow geometry for documents without a real layout engine.
//!
//! Every rendered element is treated as a block spanning the content width of
//! its parent. Own text sits at the top of the box and wraps at a fixed
//! character width; child blocks stack below it. `display: none` collapses an
//! element and its whole subtree to zero size.
//!
//! The input is a pre-order list (every parent precedes its children), which
//! lets all three passes run as flat loops instead of recursion.

use super::Bounds;
use crate::Viewport;

/// Estimated advance of one character, in px
pub const CHAR_WIDTH: f64 = 8.0;
/// Height of one line of text, in px
pub const LINE_HEIGHT: f64 = 16.0;

/// One element of the flow input
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlowNode {
    /// Index of the parent in the same list; must be smaller than this node's index
    pub parent: Option<usize>,
    /// `display: none`
    pub collapsed: bool,
    /// Number of characters of own text
    pub text_chars: usize,
    /// Margin applied on every side (e.g. 8px for `body`)
    pub inset: f64,
}

fn text_height(chars: usize, width: f64) -> f64 {
    if chars == 0 {
        return 0.0;
    }
    let per_line = (width / CHAR_WIDTH).floor().max(1.0);
    let lines = (chars as f64 / per_line).ceil();
    lines * LINE_HEIGHT
}

/// Lay out `nodes` against `viewport` and return one box per node, in input order.
pub fn flow(nodes: &[FlowNode], viewport: Viewport) -> Vec<Bounds> {
    let count = nodes.len();
    let mut collapsed = vec![false; count];
    let mut xs = vec![0.0; count];
    let mut widths = vec![0.0; count];

    // widths flow down from the viewport
    for (i, node) in nodes.iter().enumerate() {
        let (parent_x, parent_width, parent_collapsed) = match node.parent {
            Some(p) if p < i => (xs[p], widths[p], collapsed[p]),
            _ => (0.0, f64::from(viewport.width), false),
        };
        collapsed[i] = parent_collapsed || node.collapsed;
        xs[i] = parent_x + node.inset;
        widths[i] = if collapsed[i] {
            0.0
        } else {
            (parent_width - 2.0 * node.inset).max(0.0)
        };
    }

    let own_text: Vec<f64> = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            if collapsed[i] {
                0.0
            } else {
                text_height(node.text_chars, widths[i])
            }
        })
        .collect();

    // heights flow up: reverse pre-order visits every descendant before its ancestor
    let mut heights = own_text.clone();
    for i in (0..count).rev() {
        if collapsed[i] {
            heights[i] = 0.0;
            continue;
        }
        if let Some(p) = nodes[i].parent.filter(|&p| p < i) {
            heights[p] += heights[i] + 2.0 * nodes[i].inset;
        }
    }

    // vertical positions: each parent keeps a cursor below its own text
    let mut cursor = vec![0.0; count];
    let mut ys = vec![0.0; count];
    for (i, node) in nodes.iter().enumerate() {
        match node.parent.filter(|&p| p < i) {
            Some(p) if collapsed[i] => ys[i] = cursor[p],
            Some(p) => {
                ys[i] = cursor[p] + node.inset;
                cursor[p] = ys[i] + heights[i] + node.inset;
            }
            None => ys[i] = node.inset,
        }
        cursor[i] = ys[i] + own_text[i];
    }

    (0..count)
        .map(|i| Bounds::new(xs[i], ys[i], widths[i], heights[i]))
        .collect()
}
