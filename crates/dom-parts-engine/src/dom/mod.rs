//! Arena document tree
//!
//! A deliberately small DOM: nodes live in a flat arena and reference each
//! other through compact [`NodeId`] handles (parent / first child / siblings).
//! The parts engine only consumes the structural queries defined here
//! ([`Document::descendants`], [`Document::contains`],
//! [`Document::compare_order`], [`Document::same_parent`],
//! [`Document::next_sibling_element`]); everything else is construction API
//! for tests, benches and the CLI.

pub mod markup;

use uuid::Uuid;

/// Compact node handle (index into the document's arena).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Type of document node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Detached tree root (document or fragment)
    Fragment,
    /// Element node
    Element,
    /// Text content
    Text,
    /// Comment (part markers are comments with sentinel data)
    Comment,
}

/// A node in the arena.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub prev_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    /// Tag name for elements, empty otherwise
    pub name: String,
    /// Text or comment data, empty otherwise
    pub text: String,
    /// Attributes for elements, in source order
    pub attrs: Vec<(String, String)>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Node {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            name: String::new(),
            text: String::new(),
            attrs: Vec::new(),
        }
    }
}

/// Result of comparing two node positions in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocOrder {
    /// Same node
    Same,
    /// First argument comes before the second
    Precedes,
    /// First argument comes after the second
    Follows,
    /// The nodes live in different trees
    Unrelated,
}

/// An arena-backed document with a fragment root.
///
/// Carries a random [`Uuid`] so part caches can key entries without holding a
/// reference to the document itself.
#[derive(Debug)]
pub struct Document {
    id: Uuid,
    nodes: Vec<Node>,
}

impl Document {
    /// Create an empty document consisting of a single fragment root.
    pub fn new() -> Self {
        Document {
            id: Uuid::new_v4(),
            nodes: vec![Node::new(NodeKind::Fragment)],
        }
    }

    /// Stable identity of this document.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The root fragment created by [`Document::new`].
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Borrow a node by handle.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    fn push_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Create a detached element node.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        let mut node = Node::new(NodeKind::Element);
        node.name = name.to_string();
        self.push_node(node)
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        let mut node = Node::new(NodeKind::Text);
        node.text = text.to_string();
        self.push_node(node)
    }

    /// Create a detached comment node.
    pub fn create_comment(&mut self, data: &str) -> NodeId {
        let mut node = Node::new(NodeKind::Comment);
        node.text = data.to_string();
        self.push_node(node)
    }

    /// Create an additional detached fragment root (a second tree in the
    /// same arena).
    pub fn create_fragment(&mut self) -> NodeId {
        self.push_node(Node::new(NodeKind::Fragment))
    }

    /// Append a detached node as the last child of `parent`.
    ///
    /// Panics if `child` already has a parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        assert!(
            self.nodes[child.index()].parent.is_none(),
            "append_child requires a detached node"
        );
        let prev = self.nodes[parent.index()].last_child;
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[child.index()].prev_sibling = prev;
        match prev {
            Some(p) => self.nodes[p.index()].next_sibling = Some(child),
            None => self.nodes[parent.index()].first_child = Some(child),
        }
        self.nodes[parent.index()].last_child = Some(child);
    }

    /// Iterate the direct children of `parent`, in order.
    pub fn children(&self, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut next = self.nodes[parent.index()].first_child;
        std::iter::from_fn(move || {
            let cur = next?;
            next = self.nodes[cur.index()].next_sibling;
            Some(cur)
        })
    }

    /// Depth-first, document-order iterator over the descendants of `root`
    /// (the root itself is not yielded).
    pub fn descendants(&self, root: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            root,
            next: self.nodes[root.index()].first_child,
        }
    }

    /// Whether `node` lies within the subtree rooted at `root` (a root
    /// contains itself).
    pub fn contains(&self, root: NodeId, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if n == root {
                return true;
            }
            cur = self.nodes[n.index()].parent;
        }
        false
    }

    /// Whether two nodes share a structural parent. Two detached roots both
    /// have no parent and therefore compare equal.
    pub fn same_parent(&self, a: NodeId, b: NodeId) -> bool {
        self.nodes[a.index()].parent == self.nodes[b.index()].parent
    }

    /// The next sibling of `node` that is an element, skipping text and
    /// comment nodes.
    pub fn next_sibling_element(&self, node: NodeId) -> Option<NodeId> {
        let mut cur = self.nodes[node.index()].next_sibling;
        while let Some(n) = cur {
            if self.nodes[n.index()].kind == NodeKind::Element {
                return Some(n);
            }
            cur = self.nodes[n.index()].next_sibling;
        }
        None
    }

    /// Compare two positions in document order.
    pub fn compare_order(&self, a: NodeId, b: NodeId) -> DocOrder {
        if a == b {
            return DocOrder::Same;
        }
        let pa = self.path_from_root(a);
        let pb = self.path_from_root(b);
        if pa[0] != pb[0] {
            return DocOrder::Unrelated;
        }
        let mut i = 1;
        while i < pa.len() && i < pb.len() && pa[i] == pb[i] {
            i += 1;
        }
        if i == pa.len() {
            // `a` is an ancestor of `b`: the ancestor comes first
            return DocOrder::Precedes;
        }
        if i == pb.len() {
            return DocOrder::Follows;
        }
        // pa[i] and pb[i] are distinct siblings; scan forward from pa[i]
        let mut sib = self.nodes[pa[i].index()].next_sibling;
        while let Some(n) = sib {
            if n == pb[i] {
                return DocOrder::Precedes;
            }
            sib = self.nodes[n.index()].next_sibling;
        }
        DocOrder::Follows
    }

    fn path_from_root(&self, node: NodeId) -> Vec<NodeId> {
        let mut path = vec![node];
        let mut cur = self.nodes[node.index()].parent;
        while let Some(n) = cur {
            path.push(n);
            cur = self.nodes[n.index()].parent;
        }
        path.reverse();
        path
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// See [`Document::descendants`].
pub struct Descendants<'a> {
    doc: &'a Document,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let cur = self.next?;
        // Pre-order successor: first child, else next sibling of the nearest
        // ancestor that has one, stopping at the traversal root.
        self.next = match self.doc.nodes[cur.index()].first_child {
            Some(c) => Some(c),
            None => {
                let mut n = cur;
                loop {
                    if n == self.root {
                        break None;
                    }
                    if let Some(s) = self.doc.nodes[n.index()].next_sibling {
                        break Some(s);
                    }
                    match self.doc.nodes[n.index()].parent {
                        Some(p) => n = p,
                        None => break None,
                    }
                }
            }
        };
        Some(cur)
    }
}
