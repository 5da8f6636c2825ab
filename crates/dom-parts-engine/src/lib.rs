pub mod dom;
pub mod parts;

// Re-export key types for easier usage
pub use dom::markup::MarkupError;
pub use dom::{DocOrder, Document, Node, NodeId, NodeKind};
pub use parts::snapshot::{Snap, normalize, render};
pub use parts::{
    CHILD_PART_CLOSE, CHILD_PART_OPEN, ChildPart, ElementPart, MarkerKind, NODE_PART, Observer,
    Part, PartKind, PartList, PartsCache, PartsError, build_parts, validate_parts,
    validate_parts_deep,
};
