//! Per-root parts cache.
//!
//! An explicit side table keyed by `(document id, root)`: at most one parse
//! per root, and repeated access returns the identical collection. Keys hold
//! the document's [`Uuid`], never the document itself, so a cache entry
//! cannot keep a document alive; [`PartsCache::release`] is the explicit
//! deregistration path.
//!
//! The cache is snapshot-then-observe: it never re-parses on its own, so
//! document edits that bypass the part list's mutation API stay invisible
//! until a root is released and fetched again.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use uuid::Uuid;

use super::validate::validator_for;
use super::{Part, PartList, PartsError, build_parts};
use crate::dom::{Document, NodeId};

pub struct PartsCache {
    entries: HashMap<(Uuid, NodeId), PartList>,
}

impl PartsCache {
    pub fn new() -> Self {
        PartsCache {
            entries: HashMap::new(),
        }
    }

    /// The parts collection for `root`, built on first access.
    ///
    /// The first call parses the root's markers and attaches the validator
    /// observer to the returned list and to every nested child list; later
    /// calls return the same collection without re-parsing.
    pub fn get_parts(
        &mut self,
        doc: &Document,
        root: NodeId,
    ) -> Result<&mut PartList, PartsError> {
        match self.entries.entry((doc.id(), root)) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let mut list = build_parts(doc, root)?;
                attach_validator(&mut list, root);
                Ok(entry.insert(list))
            }
        }
    }

    /// Drop the cache entry for `root`. Returns whether one existed. The
    /// next `get_parts` for this root re-parses.
    pub fn release(&mut self, doc: &Document, root: NodeId) -> bool {
        self.entries.remove(&(doc.id(), root)).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PartsCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Attach the shallow validator for `root` at every level of the tree, so a
/// mutation to any nested collection re-validates that level.
fn attach_validator(list: &mut PartList, root: NodeId) {
    list.add_observer(&validator_for(root));
    for part in list.items_mut() {
        if let Part::Child(child) = part {
            attach_validator(child.children_mut(), root);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parts::{ElementPart, NODE_PART};

    const TEMPLATE_ONE: &str = "\
<!--?node-part?--><h1>Hello<!--?child-node-part?-->World<!--?/child-node-part?--></h1>
<!--?child-node-part?-->
  <!--?node-part?--><button>Click me</button>
<!--?/child-node-part?-->";

    #[test]
    fn repeated_access_returns_the_identical_collection() {
        let doc = Document::from_markup(TEMPLATE_ONE).unwrap();
        let mut cache = PartsCache::new();
        let first_id = cache.get_parts(&doc, doc.root()).unwrap().id();
        let second_id = cache.get_parts(&doc, doc.root()).unwrap().id();
        assert_eq!(first_id, second_id);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn later_document_edits_do_not_refresh_the_snapshot() {
        let mut doc = Document::from_markup(TEMPLATE_ONE).unwrap();
        let mut cache = PartsCache::new();
        let (id, len) = {
            let parts = cache.get_parts(&doc, doc.root()).unwrap();
            (parts.id(), parts.len())
        };
        assert_eq!(len, 3);

        // New markers appended behind the cache's back are invisible.
        let root = doc.root();
        doc.parse_into(root, "<!--?node-part?--><div>late</div>")
            .unwrap();
        let parts = cache.get_parts(&doc, root).unwrap();
        assert_eq!(parts.id(), id);
        assert_eq!(parts.len(), 3);
    }

    #[test]
    fn release_forces_a_fresh_parse() {
        let mut doc = Document::from_markup(TEMPLATE_ONE).unwrap();
        let mut cache = PartsCache::new();
        let stale_id = cache.get_parts(&doc, doc.root()).unwrap().id();

        let root = doc.root();
        doc.parse_into(root, "<!--?node-part?--><div>late</div>")
            .unwrap();
        assert!(cache.release(&doc, root));
        assert!(!cache.release(&doc, root));

        let parts = cache.get_parts(&doc, root).unwrap();
        assert_ne!(parts.id(), stale_id);
        assert_eq!(parts.len(), 4);
    }

    #[test]
    fn distinct_roots_get_distinct_collections() {
        let mut doc = Document::new();
        let root = doc.root();
        doc.parse_into(root, "<!--?node-part?--><p>a</p>").unwrap();
        let other = doc.create_fragment();
        doc.parse_into(other, "<!--?node-part?--><p>b</p>").unwrap();

        let mut cache = PartsCache::new();
        let a = cache.get_parts(&doc, root).unwrap().id();
        let b = cache.get_parts(&doc, other).unwrap().id();
        assert_ne!(a, b);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn mutating_a_cached_list_revalidates_synchronously() {
        let mut doc = Document::from_markup(TEMPLATE_ONE).unwrap();
        let root = doc.root();
        let mut cache = PartsCache::new();
        assert_eq!(cache.get_parts(&doc, root).unwrap().len(), 3);

        // A marker/element pair after everything else, added behind the
        // cache's back: appending its part is valid, prepending it overlaps.
        doc.parse_into(root, "<!--?node-part?--><div>tail</div>")
            .unwrap();
        let tail_marker = doc
            .children(root)
            .filter(|&n| doc.node(n).text == NODE_PART)
            .last()
            .unwrap();
        let tail = Part::Element(ElementPart::new(&doc, tail_marker).unwrap());

        let parts = cache.get_parts(&doc, root).unwrap();
        let err = parts.push_front(&doc, tail.clone()).unwrap_err();
        assert!(matches!(err, PartsError::OverlappingParts { .. }));
        assert_eq!(parts.len(), 3);

        parts.push(&doc, tail).unwrap();
        assert_eq!(parts.len(), 4);
    }

    #[test]
    fn nested_collections_are_validated_too() {
        let doc = Document::from_markup(TEMPLATE_ONE).unwrap();
        let mut cache = PartsCache::new();
        let parts = cache.get_parts(&doc, doc.root()).unwrap();

        // Duplicate the nested element part of the third top-level part:
        // the second copy cannot follow the first.
        let Some(Part::Child(child)) = parts.part_mut(2) else {
            panic!("expected a child part");
        };
        let nested = child.children()[0].clone();
        let err = child.children_mut().push(&doc, nested).unwrap_err();
        assert!(matches!(err, PartsError::OverlappingParts { .. }));
        assert_eq!(child.children().len(), 1);
    }
}
