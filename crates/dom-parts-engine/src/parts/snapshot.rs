//! Normalized views of a parts tree.
//!
//! [`normalize`] flattens parts into plain serializable data for snapshot
//! assertions and structural comparison; [`render`] produces the indented
//! text form the CLI prints.

use serde::Serialize;

use super::Part;
use crate::dom::{Document, NodeId, NodeKind};

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Snap {
    pub parts: Vec<PartSnap>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PartSnap {
    /// `"element"` or `"child"`
    pub kind: String,
    /// Element tag name, or a collapsed text preview of a child region
    pub label: String,
    pub children: Vec<PartSnap>,
}

/// Convert a parts collection to its stable, comparable form.
pub fn normalize(doc: &Document, parts: &[Part]) -> Snap {
    Snap {
        parts: parts.iter().map(|p| part_snap(doc, p)).collect(),
    }
}

fn part_snap(doc: &Document, part: &Part) -> PartSnap {
    match part {
        Part::Element(p) => PartSnap {
            kind: "element".to_string(),
            label: doc.node(p.element()).name.clone(),
            children: Vec::new(),
        },
        Part::Child(p) => PartSnap {
            kind: "child".to_string(),
            label: preview(doc, p.start(), p.end(), 40),
            children: p.children().iter().map(|c| part_snap(doc, c)).collect(),
        },
    }
}

/// Render a parts tree as an indented text outline.
pub fn render(doc: &Document, parts: &[Part]) -> String {
    let mut out = String::new();
    render_level(doc, parts, 0, &mut out);
    out
}

fn render_level(doc: &Document, parts: &[Part], depth: usize, out: &mut String) {
    for part in parts {
        for _ in 0..depth {
            out.push_str("  ");
        }
        match part {
            Part::Element(p) => {
                out.push_str("element <");
                out.push_str(&doc.node(p.element()).name);
                out.push_str(">\n");
            }
            Part::Child(p) => {
                out.push_str("child \"");
                out.push_str(&preview(doc, p.start(), p.end(), 40));
                out.push_str("\"\n");
                render_level(doc, p.children(), depth + 1, out);
            }
        }
    }
}

/// Whitespace-collapsed text content of the sibling range strictly between
/// two markers, truncated to `max` characters.
fn preview(doc: &Document, start: NodeId, end: NodeId, max: usize) -> String {
    let mut text = String::new();
    let mut cur = doc.node(start).next_sibling;
    while let Some(n) = cur {
        if n == end {
            break;
        }
        collect_text(doc, n, &mut text);
        cur = doc.node(n).next_sibling;
    }
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > max {
        let mut cut: String = collapsed.chars().take(max).collect();
        cut.push('…');
        cut
    } else {
        collapsed
    }
}

fn collect_text(doc: &Document, node: NodeId, out: &mut String) {
    let n = doc.node(node);
    if n.kind == NodeKind::Text {
        out.push_str(&n.text);
        out.push(' ');
    }
    for child in doc.children(node) {
        collect_text(doc, child, out);
    }
}
