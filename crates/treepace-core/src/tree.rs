//! Tree ownership and traversal helpers.

use crate::node::TreeNode;

/// A tree identified by its current root node.
///
/// Replacing the root node (for example when a rewrite targets the root)
/// updates this handle, so callers keep a valid entry point after mutation.
#[derive(Debug, Clone)]
pub struct Tree<N> {
    root: N,
}

impl<N: TreeNode> Tree<N> {
    /// Wraps `root` as a tree.
    #[must_use]
    pub const fn new(root: N) -> Self {
        Self { root }
    }

    /// Returns the current root node.
    #[must_use]
    pub const fn root(&self) -> &N {
        &self.root
    }

    /// Replaces the root node, returning the previous one.
    pub fn set_root(&mut self, root: N) -> N {
        std::mem::replace(&mut self.root, root)
    }

    /// Consumes the tree and returns its root node.
    #[must_use]
    pub fn into_root(self) -> N {
        self.root
    }

    /// Returns the nodes of the tree in document order.
    #[must_use]
    pub fn preorder(&self) -> Preorder<N> {
        preorder(&self.root)
    }

    /// Returns whether `node` is currently attached to this tree.
    #[must_use]
    pub fn contains(&self, node: &N) -> bool {
        ancestors(node)
            .last()
            .is_some_and(|top| top.is_same(&self.root))
    }

    /// Returns the first node in document order satisfying `predicate`.
    pub fn find(&self, mut predicate: impl FnMut(&N) -> bool) -> Option<N> {
        self.preorder().find(|node| predicate(node))
    }
}

/// Iterator over a subtree in document order (pre-order, left to right).
///
/// Uses an explicit stack, so deep trees do not grow the call stack.
#[derive(Debug, Clone)]
pub struct Preorder<N> {
    pending: Vec<N>,
}

impl<N: TreeNode> Iterator for Preorder<N> {
    type Item = N;

    fn next(&mut self) -> Option<N> {
        let node = self.pending.pop()?;
        self.pending.extend(node.children().into_iter().rev());
        Some(node)
    }
}

/// Returns a document-order iterator rooted at `node`.
#[must_use]
pub fn preorder<N: TreeNode>(node: &N) -> Preorder<N> {
    Preorder {
        pending: vec![node.clone()],
    }
}

/// Iterator from a node up through its ancestors, starting with the node.
#[derive(Debug, Clone)]
pub struct Ancestors<N> {
    next: Option<N>,
}

impl<N: TreeNode> Iterator for Ancestors<N> {
    type Item = N;

    fn next(&mut self) -> Option<N> {
        let node = self.next.take()?;
        self.next = node.parent();
        Some(node)
    }
}

/// Returns `node` followed by each of its ancestors up to the top.
#[must_use]
pub fn ancestors<N: TreeNode>(node: &N) -> Ancestors<N> {
    Ancestors {
        next: Some(node.clone()),
    }
}

/// Returns whether `ancestor` is `node` itself or one of its ancestors.
#[must_use]
pub fn is_ancestor_or_self<N: TreeNode>(ancestor: &N, node: &N) -> bool {
    ancestors(node).any(|candidate| candidate.is_same(ancestor))
}

/// Compares two subtrees by shape and values, ignoring node identity.
#[must_use]
pub fn same_structure<N: TreeNode>(left: &N, right: &N) -> bool
where
    N::Value: PartialEq,
{
    let mut pending = vec![(left.clone(), right.clone())];
    while let Some((a, b)) = pending.pop() {
        let equal_values = a.with_value(|x| b.with_value(|y| x == y));
        if !equal_values {
            return false;
        }
        let (a_children, b_children) = (a.children(), b.children());
        if a_children.len() != b_children.len() {
            return false;
        }
        pending.extend(a_children.into_iter().zip(b_children));
    }
    true
}
