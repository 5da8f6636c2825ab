//! Single-pass marker-to-tree builder.
//!
//! Open/close markers behave like matched parentheses: a stack of open
//! frames tracks which child part each new part belongs to. Each marker is
//! visited exactly once and construction is strictly append-only, so the
//! cost is O(number of markers).

use super::{ChildPart, ElementPart, MarkerKind, Part, PartList, PartsError};
use crate::dom::{Document, NodeId, NodeKind};

struct OpenFrame {
    start: NodeId,
    outer: PartList,
}

/// Build the parts tree for `root` from its sentinel markers, in document
/// order.
///
/// Fails on a close marker with no matching open
/// ([`PartsError::StrayCloseMarker`]), an open marker still unclosed at the
/// end of the stream ([`PartsError::UnclosedOpenMarker`]), or a node marker
/// with no following element ([`PartsError::MarkerWithoutElement`]). On
/// failure the partially built tree is discarded; nothing is mutated.
pub fn build_parts(doc: &Document, root: NodeId) -> Result<PartList, PartsError> {
    let mut current = PartList::new();
    let mut stack: Vec<OpenFrame> = Vec::new();

    for node in doc.descendants(root) {
        let n = doc.node(node);
        if n.kind != NodeKind::Comment {
            continue;
        }
        let Some(kind) = MarkerKind::from_data(&n.text) else {
            continue;
        };
        match kind {
            MarkerKind::NodePart => {
                let part = ElementPart::new(doc, node)?;
                current.append_unchecked(Part::Element(part));
            }
            MarkerKind::ChildOpen => {
                stack.push(OpenFrame {
                    start: node,
                    outer: std::mem::take(&mut current),
                });
            }
            MarkerKind::ChildClose => {
                let frame = stack
                    .pop()
                    .ok_or(PartsError::StrayCloseMarker { marker: node })?;
                let children = std::mem::replace(&mut current, frame.outer);
                let part = ChildPart::new(doc, frame.start, node, children)?;
                current.append_unchecked(Part::Child(part));
            }
        }
    }

    if let Some(frame) = stack.pop() {
        return Err(PartsError::UnclosedOpenMarker {
            marker: frame.start,
        });
    }
    Ok(current)
}
