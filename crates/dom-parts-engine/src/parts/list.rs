//! Observable ordered part collection.
//!
//! `PartList` replaces an ordinary vector at every level of the parts tree.
//! Reads go through `Deref<Target = [Part]>`; writes go through the explicit
//! mutation methods below, which are the only way to change the contents.
//! Every mutation synchronously runs the registered observers against the
//! post-mutation contents and rolls the edit back if any observer rejects it,
//! so a failed operation leaves the collection untouched.

use std::fmt;
use std::ops::{Deref, Range};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{Part, PartsError};
use crate::dom::{DocOrder, Document};

/// Callback invoked on every structural mutation with the document and the
/// post-mutation contents. Observers cannot mutate the list they observe;
/// they only get a shared slice.
pub type Observer = Rc<dyn Fn(&Document, &[Part]) -> Result<(), PartsError>>;

static NEXT_LIST_ID: AtomicU64 = AtomicU64::new(1);

/// An ordered, mutation-observable sequence of [`Part`]s.
pub struct PartList {
    id: u64,
    items: Vec<Part>,
    observers: Vec<Observer>,
}

impl PartList {
    pub fn new() -> Self {
        PartList {
            id: NEXT_LIST_ID.fetch_add(1, Ordering::Relaxed),
            items: Vec::new(),
            observers: Vec::new(),
        }
    }

    /// Identity of this collection, stable for its lifetime. Used to assert
    /// that a cache hands back the same collection rather than a re-parse.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Register an observer. Registration is idempotent: adding the same
    /// callback (by `Rc` identity) twice fires it once per mutation.
    pub fn add_observer(&mut self, observer: &Observer) {
        if !self.observers.iter().any(|o| Rc::ptr_eq(o, observer)) {
            self.observers.push(Rc::clone(observer));
        }
    }

    /// Remove an observer; a no-op if it was never registered.
    pub fn remove_observer(&mut self, observer: &Observer) {
        self.observers.retain(|o| !Rc::ptr_eq(o, observer));
    }

    /// Builder-only append: no observers have been attached yet while a tree
    /// is being built, and intermediate states are transiently unbalanced.
    pub(crate) fn append_unchecked(&mut self, part: Part) {
        self.items.push(part);
    }

    /// Crate-internal mutable view, used to wire observers onto nested
    /// child lists after a build. Not a public escape hatch.
    pub(crate) fn items_mut(&mut self) -> &mut [Part] {
        &mut self.items
    }

    /// Mutable access to one part, the route to a nested collection via
    /// [`ChildPart::children_mut`]. Replacing the part wholesale through
    /// this reference does not notify observers; use [`PartList::set`] for
    /// index assignment.
    ///
    /// [`ChildPart::children_mut`]: super::ChildPart::children_mut
    pub fn part_mut(&mut self, index: usize) -> Option<&mut Part> {
        self.items.get_mut(index)
    }

    /// Apply `edit`, notify every observer with the new contents, and roll
    /// back if any of them fails.
    fn commit<R>(
        &mut self,
        doc: &Document,
        edit: impl FnOnce(&mut Vec<Part>) -> R,
    ) -> Result<R, PartsError> {
        let saved = self.items.clone();
        let out = edit(&mut self.items);
        for observer in &self.observers {
            if let Err(err) = observer(doc, &self.items) {
                self.items = saved;
                return Err(err);
            }
        }
        Ok(out)
    }

    /// Append a part at the end.
    pub fn push(&mut self, doc: &Document, part: Part) -> Result<(), PartsError> {
        self.commit(doc, |items| items.push(part))
    }

    /// Insert a part at the front.
    pub fn push_front(&mut self, doc: &Document, part: Part) -> Result<(), PartsError> {
        self.commit(doc, |items| items.insert(0, part))
    }

    /// Remove and return the last part.
    pub fn pop(&mut self, doc: &Document) -> Result<Option<Part>, PartsError> {
        self.commit(doc, |items| items.pop())
    }

    /// Remove and return the first part.
    pub fn pop_front(&mut self, doc: &Document) -> Result<Option<Part>, PartsError> {
        self.commit(doc, |items| {
            if items.is_empty() {
                None
            } else {
                Some(items.remove(0))
            }
        })
    }

    /// Replace `range` with `replacement`, returning the removed parts.
    ///
    /// Panics if the range is out of bounds, like `Vec::splice`.
    pub fn splice(
        &mut self,
        doc: &Document,
        range: Range<usize>,
        replacement: Vec<Part>,
    ) -> Result<Vec<Part>, PartsError> {
        self.commit(doc, |items| items.splice(range, replacement).collect())
    }

    /// Replace the part at `index`, returning the previous one.
    ///
    /// Panics if `index` is out of bounds, like indexed assignment on a slice.
    pub fn set(&mut self, doc: &Document, index: usize, part: Part) -> Result<Part, PartsError> {
        self.commit(doc, |items| std::mem::replace(&mut items[index], part))
    }

    /// Overwrite every slot in `range` with a clone of `part`.
    ///
    /// Panics if the range is out of bounds.
    pub fn fill(
        &mut self,
        doc: &Document,
        range: Range<usize>,
        part: &Part,
    ) -> Result<(), PartsError> {
        self.commit(doc, |items| {
            for slot in &mut items[range] {
                *slot = part.clone();
            }
        })
    }

    /// Sort the parts by the document position of their start markers.
    pub fn sort_by_position(&mut self, doc: &Document) -> Result<(), PartsError> {
        self.commit(doc, |items| {
            items.sort_by(|a, b| match doc.compare_order(a.start_node(), b.start_node()) {
                DocOrder::Precedes => std::cmp::Ordering::Less,
                DocOrder::Follows => std::cmp::Ordering::Greater,
                DocOrder::Same | DocOrder::Unrelated => std::cmp::Ordering::Equal,
            })
        })
    }

    /// Reverse the parts in place.
    pub fn reverse(&mut self, doc: &Document) -> Result<(), PartsError> {
        self.commit(doc, |items| items.reverse())
    }
}

impl Default for PartList {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for PartList {
    type Target = [Part];

    fn deref(&self) -> &[Part] {
        &self.items
    }
}

/// A clone is a structural copy: it shares the original's id and observer
/// set, and is used internally to snapshot contents for rollback.
impl Clone for PartList {
    fn clone(&self) -> Self {
        PartList {
            id: self.id,
            items: self.items.clone(),
            observers: self.observers.clone(),
        }
    }
}

impl fmt::Debug for PartList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartList")
            .field("id", &self.id)
            .field("items", &self.items)
            .field("observers", &self.observers.len())
            .finish()
    }
}
