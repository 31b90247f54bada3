//! Reference-counted in-memory nodes.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::node::{ChangeKind, NodeId, Observer, TreeNode};

/// An in-memory tree node with shared ownership of its children.
///
/// Parents own their children through strong references; children point back
/// through a [`Weak`] link, so a detached subtree is freed once the last
/// handle to it is dropped.
///
/// # Example
///
/// ```
/// use treepace_core::{Node, TreeNode};
///
/// let list = Node::new("list");
/// list.push_child(Node::new("item"));
/// let item = list.child_at(0).expect("child");
/// assert_eq!(item.value(), "item");
/// assert!(item.parent().is_some_and(|parent| parent.is_same(&list)));
/// ```
pub struct Node<V = String> {
    inner: Rc<NodeInner<V>>,
}

struct NodeInner<V> {
    value: RefCell<V>,
    parent: RefCell<Weak<NodeInner<V>>>,
    children: RefCell<Vec<Node<V>>>,
    observers: RefCell<Vec<Observer<Node<V>>>>,
}

impl Node {
    /// Creates an unattached leaf node holding text.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self::from_value(value.into())
    }

    /// Creates a text node and appends `children` in order.
    #[must_use]
    pub fn with_children(value: impl Into<String>, children: impl IntoIterator<Item = Self>) -> Self {
        Self::from_parts(value.into(), children)
    }
}

impl<V> Node<V> {
    /// Creates an unattached leaf node.
    #[must_use]
    pub fn from_value(value: V) -> Self {
        Self {
            inner: Rc::new(NodeInner {
                value: RefCell::new(value),
                parent: RefCell::new(Weak::new()),
                children: RefCell::new(Vec::new()),
                observers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Creates a node and appends `children` in order.
    #[must_use]
    pub fn from_parts(value: V, children: impl IntoIterator<Item = Self>) -> Self {
        let node = Self::from_value(value);
        for child in children {
            node.attach(node.len(), child);
        }
        node
    }

    fn raw_id(&self) -> NodeId {
        NodeId::new(Rc::as_ptr(&self.inner).cast::<()>() as usize)
    }

    fn len(&self) -> usize {
        self.inner.children.borrow().len()
    }

    /// Returns whether `self` is `node` or one of its ancestors.
    fn encloses(&self, node: &Self) -> bool {
        let mut current = Some(Rc::clone(&node.inner));
        while let Some(inner) = current {
            if Rc::ptr_eq(&inner, &self.inner) {
                return true;
            }
            current = inner.parent.borrow().upgrade();
        }
        false
    }

    fn attach(&self, index: usize, child: Self) {
        debug_assert!(
            !child.encloses(self),
            "attaching a node beneath itself would create a cycle"
        );
        if child.encloses(self) {
            return;
        }
        child.detach_raw();
        let mut children = self.inner.children.borrow_mut();
        let position = index.min(children.len());
        *child.inner.parent.borrow_mut() = Rc::downgrade(&self.inner);
        children.insert(position, child);
    }

    fn detach_raw(&self) {
        let parent = self.inner.parent.replace(Weak::new()).upgrade();
        if let Some(parent) = parent {
            parent
                .children
                .borrow_mut()
                .retain(|child| !Rc::ptr_eq(&child.inner, &self.inner));
        }
    }
}

impl<V> Clone for Node<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for Node<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.raw_id())
            .field("value", &*self.inner.value.borrow())
            .field("children", &self.len())
            .finish()
    }
}

impl<V: Clone + fmt::Debug> TreeNode for Node<V> {
    type Value = V;

    fn id(&self) -> NodeId {
        self.raw_id()
    }

    fn with_value<R>(&self, f: impl FnOnce(&V) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    fn set_value(&self, value: V) {
        *self.inner.value.borrow_mut() = value;
    }

    fn children(&self) -> Vec<Self> {
        self.inner.children.borrow().clone()
    }

    fn child_at(&self, index: usize) -> Option<Self> {
        self.inner.children.borrow().get(index).cloned()
    }

    fn child_count(&self) -> usize {
        self.len()
    }

    fn parent(&self) -> Option<Self> {
        self.inner
            .parent
            .borrow()
            .upgrade()
            .map(|inner| Self { inner })
    }

    fn index(&self) -> Option<usize> {
        let parent = self.inner.parent.borrow().upgrade()?;
        let children = parent.children.borrow();
        children
            .iter()
            .position(|child| Rc::ptr_eq(&child.inner, &self.inner))
    }

    fn detach(&self) {
        self.detach_raw();
    }

    fn insert_child_at(&self, index: usize, child: Self) {
        self.attach(index, child);
    }

    fn replace_child_at(&self, index: usize, child: Self) -> Option<Self> {
        let old = self.child_at(index)?;
        if old.is_same(&child) {
            return Some(old);
        }
        debug_assert!(
            !child.encloses(self),
            "replacing with an ancestor would create a cycle"
        );
        if child.encloses(self) {
            return None;
        }

        // Detaching may shift `old` when `child` was an earlier sibling.
        child.detach_raw();
        let mut children = self.inner.children.borrow_mut();
        let slot = children.iter_mut().find(|slot| slot.is_same(&old))?;
        *child.inner.parent.borrow_mut() = Rc::downgrade(&self.inner);
        let replaced = std::mem::replace(slot, child);
        *replaced.inner.parent.borrow_mut() = Weak::new();
        Some(replaced)
    }

    fn add_observer(&self, observer: Observer<Self>) {
        self.inner.observers.borrow_mut().push(observer);
    }

    fn notify(&self, kind: ChangeKind) {
        // Observers may query the tree, so the list is released before calls.
        let observers = self.inner.observers.borrow().clone();
        for observer in observers {
            observer(kind, self);
        }
    }

    fn create(value: V) -> Self {
        Self::from_value(value)
    }

    fn deep_clone(&self) -> Self {
        let root = Self::from_value(self.value());
        let mut pending = vec![(self.clone(), root.clone())];
        while let Some((source, copy)) = pending.pop() {
            for child in source.children() {
                let child_copy = Self::from_value(child.value());
                copy.attach(copy.len(), child_copy.clone());
                pending.push((child, child_copy));
            }
        }
        root
    }
}
