/*!
 * # Parts core
 *
 * Extracts a structured "parts" tree from sentinel comment markers embedded
 * in a document, and keeps that structure valid under mutation.
 *
 * ## How it fits together
 *
 * - Three comment sentinels mark part boundaries in the document:
 *   [`NODE_PART`] marks a single following element, [`CHILD_PART_OPEN`] /
 *   [`CHILD_PART_CLOSE`] bracket a region. [`MarkerKind`] classifies comment
 *   data.
 * - [`build::build_parts`] walks the sentinels once in document order and
 *   produces a tree of [`Part`]s: bracket markers behave like matched
 *   parentheses, node markers are leaves of whichever bracket is open.
 * - Parts live in [`PartList`]s, explicit ordered collections whose mutating
 *   operations notify registered observers and roll back when an observer
 *   rejects the new state.
 * - [`validate::validate_parts`] is the observer the cache registers: it
 *   asserts the structural invariants of one collection level against a
 *   part root, so any mutation through the list API re-validates without the
 *   caller opting in.
 * - [`PartsCache`] guarantees at most one parse per root and hands back the
 *   identical list on repeated access.
 *
 * Construction is fallible everywhere the document can be malformed:
 * [`ElementPart::new`] and [`ChildPart::new`] return [`PartsError`] rather
 * than panicking, and the builder surfaces unbalanced markers the same way.
 */

pub mod build;
pub mod cache;
pub mod list;
pub mod snapshot;
pub mod validate;

pub use build::build_parts;
pub use cache::PartsCache;
pub use list::{Observer, PartList};
pub use validate::{validate_parts, validate_parts_deep};

use thiserror::Error;

use crate::dom::{DocOrder, Document, NodeId};

/// Comment data marking "an element part follows".
pub const NODE_PART: &str = "?node-part?";
/// Comment data opening a child part region.
pub const CHILD_PART_OPEN: &str = "?child-node-part?";
/// Comment data closing a child part region.
pub const CHILD_PART_CLOSE: &str = "?/child-node-part?";

/// The three sentinel marker kinds recognized in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    NodePart,
    ChildOpen,
    ChildClose,
}

impl MarkerKind {
    /// Classify comment data; non-sentinel comments return `None`.
    pub fn from_data(data: &str) -> Option<MarkerKind> {
        match data {
            NODE_PART => Some(MarkerKind::NodePart),
            CHILD_PART_OPEN => Some(MarkerKind::ChildOpen),
            CHILD_PART_CLOSE => Some(MarkerKind::ChildClose),
            _ => None,
        }
    }
}

/// Discriminant of the two part variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    Element,
    Child,
}

/// Everything that can go wrong while building or validating parts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PartsError {
    #[error("node part marker {marker:?} must be immediately followed by an element")]
    MarkerWithoutElement { marker: NodeId },
    #[error("child part close marker {marker:?} has no matching open marker")]
    StrayCloseMarker { marker: NodeId },
    #[error("child part open marker {marker:?} was never closed")]
    UnclosedOpenMarker { marker: NodeId },
    #[error("start marker {start:?} and end marker {end:?} must share a parent")]
    MismatchedParents { start: NodeId, end: NodeId },
    #[error("end marker {end:?} must follow start marker {start:?}")]
    EndBeforeStart { start: NodeId, end: NodeId },
    #[error("node {node:?} is not contained by the part root {root:?}")]
    OutsideRoot { root: NodeId, node: NodeId },
    #[error("part starting at {start:?} does not follow the previous part's end {previous_end:?}")]
    OverlappingParts { previous_end: NodeId, start: NodeId },
}

/// A leaf part: a marker comment referencing the element that follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementPart {
    marker: NodeId,
    element: NodeId,
}

impl ElementPart {
    /// Resolve the element immediately following `marker` in document order.
    ///
    /// Fails with [`PartsError::MarkerWithoutElement`] when the marker has no
    /// following element sibling.
    pub fn new(doc: &Document, marker: NodeId) -> Result<ElementPart, PartsError> {
        let element = doc
            .next_sibling_element(marker)
            .ok_or(PartsError::MarkerWithoutElement { marker })?;
        Ok(ElementPart { marker, element })
    }

    pub fn marker(&self) -> NodeId {
        self.marker
    }

    pub fn element(&self) -> NodeId {
        self.element
    }
}

/// A bounded region between an open/close marker pair, holding its own
/// ordered collection of nested parts.
#[derive(Debug, Clone)]
pub struct ChildPart {
    start: NodeId,
    end: NodeId,
    children: PartList,
}

impl ChildPart {
    /// Construct a child part, enforcing the marker-pair invariants up
    /// front: `start` and `end` must share a parent, and `end` must strictly
    /// follow `start` in document order.
    pub fn new(
        doc: &Document,
        start: NodeId,
        end: NodeId,
        children: PartList,
    ) -> Result<ChildPart, PartsError> {
        if !doc.same_parent(start, end) {
            return Err(PartsError::MismatchedParents { start, end });
        }
        if doc.compare_order(start, end) != DocOrder::Precedes {
            return Err(PartsError::EndBeforeStart { start, end });
        }
        Ok(ChildPart {
            start,
            end,
            children,
        })
    }

    pub fn start(&self) -> NodeId {
        self.start
    }

    pub fn end(&self) -> NodeId {
        self.end
    }

    /// The nested parts between the marker pair.
    pub fn children(&self) -> &PartList {
        &self.children
    }

    /// Mutable access to the nested collection; mutations through it notify
    /// its observers like any other list.
    pub fn children_mut(&mut self) -> &mut PartList {
        &mut self.children
    }
}

/// A parsed part: either a single-element leaf or a bracketed region.
#[derive(Debug, Clone)]
pub enum Part {
    Element(ElementPart),
    Child(ChildPart),
}

impl Part {
    pub fn kind(&self) -> PartKind {
        match self {
            Part::Element(_) => PartKind::Element,
            Part::Child(_) => PartKind::Child,
        }
    }

    /// The marker where this part starts in document order.
    pub fn start_node(&self) -> NodeId {
        match self {
            Part::Element(p) => p.marker(),
            Part::Child(p) => p.start(),
        }
    }

    /// The marker where this part ends. Element parts start and end at their
    /// single marker.
    pub fn end_node(&self) -> NodeId {
        match self {
            Part::Element(p) => p.marker(),
            Part::Child(p) => p.end(),
        }
    }
}
