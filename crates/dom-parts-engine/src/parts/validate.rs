//! Structural invariant checks for a parts collection.
//!
//! Validation is shallow by contract: one collection level per call, failing
//! fast on the first violation. The cache registers [`validate_parts`] as an
//! observer on every list it builds (each level gets its own observer), so a
//! mutation anywhere in the tree re-validates the level it touched.

use std::rc::Rc;

use super::{Observer, Part, PartsError};
use crate::dom::{DocOrder, Document, NodeId};

/// Validate one level of `parts` against `root`.
///
/// Rules, applied left to right while tracking the previous part's end
/// marker:
/// - child parts: markers share a parent, both lie inside `root`, and the
///   end marker strictly follows the start marker;
/// - element parts: the referenced element lies inside `root`;
/// - every part must start strictly after the previous part's end
///   (non-overlap, strict sibling ordering).
///
/// Nested child collections are not descended into; see
/// [`validate_parts_deep`].
pub fn validate_parts(doc: &Document, root: NodeId, parts: &[Part]) -> Result<(), PartsError> {
    let mut previous_end: Option<NodeId> = None;
    for part in parts {
        match part {
            Part::Child(child) => {
                let (start, end) = (child.start(), child.end());
                if !doc.same_parent(start, end) {
                    return Err(PartsError::MismatchedParents { start, end });
                }
                if !doc.contains(root, start) {
                    return Err(PartsError::OutsideRoot { root, node: start });
                }
                if !doc.contains(root, end) {
                    return Err(PartsError::OutsideRoot { root, node: end });
                }
                if doc.compare_order(start, end) != DocOrder::Precedes {
                    return Err(PartsError::EndBeforeStart { start, end });
                }
            }
            Part::Element(element) => {
                if !doc.contains(root, element.element()) {
                    return Err(PartsError::OutsideRoot {
                        root,
                        node: element.element(),
                    });
                }
            }
        }
        let start = part.start_node();
        if let Some(previous_end) = previous_end
            && doc.compare_order(previous_end, start) != DocOrder::Precedes
        {
            return Err(PartsError::OverlappingParts {
                previous_end,
                start,
            });
        }
        previous_end = Some(part.end_node());
    }
    Ok(())
}

/// Validate `parts` and recurse into every nested child collection.
pub fn validate_parts_deep(
    doc: &Document,
    root: NodeId,
    parts: &[Part],
) -> Result<(), PartsError> {
    validate_parts(doc, root, parts)?;
    for part in parts {
        if let Part::Child(child) = part {
            validate_parts_deep(doc, root, child.children())?;
        }
    }
    Ok(())
}

/// The observer a cache attaches to every list it builds: shallow validation
/// of that list's level against `root`.
pub(crate) fn validator_for(root: NodeId) -> Observer {
    Rc::new(move |doc, parts| validate_parts(doc, root, parts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parts::{ElementPart, PartList, build_parts};

    fn parts_for(markup: &str) -> (Document, PartList) {
        let doc = Document::from_markup(markup).unwrap();
        let parts = build_parts(&doc, doc.root()).unwrap();
        (doc, parts)
    }

    #[test]
    fn a_freshly_built_tree_is_valid() {
        let (doc, parts) = parts_for(
            "<!--?node-part?--><h1>Hello</h1>\
             <!--?child-node-part?-->World<!--?/child-node-part?-->",
        );
        validate_parts(&doc, doc.root(), &parts).unwrap();
        validate_parts_deep(&doc, doc.root(), &parts).unwrap();
    }

    #[test]
    fn validation_is_idempotent_and_does_not_mutate() {
        let (doc, parts) = parts_for("<!--?node-part?--><h1>x</h1>");
        validate_parts(&doc, doc.root(), &parts).unwrap();
        validate_parts(&doc, doc.root(), &parts).unwrap();
        assert_eq!(parts.len(), 1);
    }

    #[test]
    fn out_of_order_parts_are_an_overlap() {
        let (doc, parts) = parts_for(
            "<!--?node-part?--><h1>a</h1><!--?node-part?--><h2>b</h2>",
        );
        // Reverse the slice by hand: second part now precedes the first.
        let reversed: Vec<Part> = parts.iter().rev().cloned().collect();
        let err = validate_parts(&doc, doc.root(), &reversed).unwrap_err();
        assert!(matches!(err, PartsError::OverlappingParts { .. }));
    }

    #[test]
    fn a_part_outside_the_root_is_rejected() {
        let mut doc = Document::from_markup("<!--?node-part?--><h1>x</h1>").unwrap();
        let parts = build_parts(&doc, doc.root()).unwrap();

        // Validate against a different, unrelated root.
        let other = doc.create_fragment();
        let err = validate_parts(&doc, other, &parts).unwrap_err();
        assert!(matches!(err, PartsError::OutsideRoot { .. }));
    }

    #[test]
    fn deep_validation_reaches_nested_collections() {
        let doc = Document::from_markup(
            "<!--?child-node-part?-->\
             <!--?node-part?--><b>x</b><!--?node-part?--><i>y</i>\
             <!--?/child-node-part?-->",
        )
        .unwrap();
        let parts = build_parts(&doc, doc.root()).unwrap();

        // Swap the nested parts out of order; shallow validation of the top
        // level stays green, deep validation catches it.
        let mut broken: Vec<Part> = parts.iter().cloned().collect();
        if let Part::Child(child) = &mut broken[0] {
            let reversed: Vec<Part> = child.children().iter().rev().cloned().collect();
            let inner = child.children_mut();
            for (slot, part) in inner.items_mut().iter_mut().zip(reversed) {
                *slot = part;
            }
        }
        validate_parts(&doc, doc.root(), &broken).unwrap();
        let err = validate_parts_deep(&doc, doc.root(), &broken).unwrap_err();
        assert!(matches!(err, PartsError::OverlappingParts { .. }));
    }

    #[test]
    fn element_part_overlap_is_checked_too() {
        // Build two element parts sharing document order, then repeat the
        // first after the second.
        let doc = Document::from_markup(
            "<!--?node-part?--><h1>a</h1><!--?node-part?--><h2>b</h2>",
        )
        .unwrap();
        let kids: Vec<_> = doc.children(doc.root()).collect();
        let first = Part::Element(ElementPart::new(&doc, kids[0]).unwrap());
        let second = Part::Element(ElementPart::new(&doc, kids[2]).unwrap());
        let err =
            validate_parts(&doc, doc.root(), &[second, first]).unwrap_err();
        assert!(matches!(err, PartsError::OverlappingParts { .. }));
    }
}
