//! The node capability interface consumed by the pattern engine.
//!
//! Any node type that implements [`TreeNode`] can be searched and rewritten.
//! Nodes are handles: cloning a node yields another handle to the same
//! structural position, and identity is decided by [`TreeNode::id`].

use std::fmt;
use std::rc::Rc;

use strum::{Display, EnumString};

/// Stable identity of a node for the lifetime of that node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Creates an identifier from a raw value.
    #[must_use]
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:x}", self.0)
    }
}

/// Kind of structural change delivered to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ChangeKind {
    /// The node was removed from its parent.
    Removed,
    /// The node was inserted into a parent (or became the tree root).
    Inserted,
    /// The node was relocated from one position into a replacement subtree.
    Moved,
    /// The node's child list changed.
    ChildrenChanged,
}

/// Callback invoked with the change kind and the affected node.
pub type Observer<N> = Rc<dyn Fn(ChangeKind, &N)>;

/// Capabilities the engine requires of a tree node.
///
/// Mutation methods keep the single-parent invariant: a node inserted under a
/// new parent is first detached from its previous one. Mutation primitives are
/// silent; the rewriter calls [`TreeNode::notify`] once a substitution is
/// structurally complete.
pub trait TreeNode: Clone + fmt::Debug + Sized {
    /// The value stored in each node.
    type Value;

    /// Returns this node's identity.
    fn id(&self) -> NodeId;

    /// Calls `f` with a borrow of the node's value.
    fn with_value<R>(&self, f: impl FnOnce(&Self::Value) -> R) -> R;

    /// Returns a copy of the node's value.
    fn value(&self) -> Self::Value
    where
        Self::Value: Clone,
    {
        self.with_value(Clone::clone)
    }

    /// Replaces the node's value.
    fn set_value(&self, value: Self::Value);

    /// Returns the current children in order.
    fn children(&self) -> Vec<Self>;

    /// Returns the child at `index`, if any.
    fn child_at(&self, index: usize) -> Option<Self> {
        self.children().into_iter().nth(index)
    }

    /// Returns the number of children.
    fn child_count(&self) -> usize {
        self.children().len()
    }

    /// Returns the parent, if the node is attached.
    fn parent(&self) -> Option<Self>;

    /// Returns the node's position within its parent's child list.
    fn index(&self) -> Option<usize> {
        let parent = self.parent()?;
        let id = self.id();
        parent.children().iter().position(|child| child.id() == id)
    }

    /// Removes the node from its parent's child list.
    fn detach(&self);

    /// Inserts `child` at `index` (clamped to the child count).
    fn insert_child_at(&self, index: usize, child: Self);

    /// Replaces the child at `index` with `child`, returning the old child.
    ///
    /// Returns `None` and leaves the tree untouched when `index` is out of
    /// range.
    fn replace_child_at(&self, index: usize, child: Self) -> Option<Self>;

    /// Appends `child` as the last child.
    fn push_child(&self, child: Self) {
        self.insert_child_at(self.child_count(), child);
    }

    /// Registers an observer for changes affecting this node.
    fn add_observer(&self, observer: Observer<Self>);

    /// Delivers `kind` to every observer registered on this node.
    fn notify(&self, kind: ChangeKind);

    /// Creates a new, unattached node holding `value`.
    fn create(value: Self::Value) -> Self;

    /// Copies this node and its descendants into a new unattached subtree.
    ///
    /// Observers are not copied.
    fn deep_clone(&self) -> Self;

    /// Returns whether both handles refer to the same node.
    fn is_same(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}
