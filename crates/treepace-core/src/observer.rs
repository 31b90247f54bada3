//! Ready-made change observers.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::info;

use crate::node::{ChangeKind, Observer, TreeNode};
use crate::tree::preorder;

const TREE_TARGET: &str = "treepace::tree";

/// Returns an observer that logs every change it receives.
///
/// Events are emitted at `info` level under the `treepace::tree` target with
/// the change kind, node identity, and the node's current value.
#[must_use]
pub fn log_observer<N>() -> Observer<N>
where
    N: TreeNode + 'static,
    N::Value: fmt::Display,
{
    Rc::new(|kind: ChangeKind, node: &N| {
        let value = node.with_value(ToString::to_string);
        info!(
            target: TREE_TARGET,
            change = %kind,
            node = %node.id(),
            value = %value,
            "tree changed"
        );
    })
}

/// Registers `observer` on `node` and every node beneath it.
pub fn observe_subtree<N: TreeNode>(node: &N, observer: &Observer<N>) {
    for current in preorder(node) {
        current.add_observer(Rc::clone(observer));
    }
}

/// An in-memory record of change notifications.
///
/// # Example
///
/// ```
/// use treepace_core::{ChangeKind, ChangeLog, Node, TreeNode};
///
/// let log = ChangeLog::new();
/// let node = Node::new("a");
/// node.add_observer(log.observer());
/// node.notify(ChangeKind::Inserted);
/// assert_eq!(log.kinds(), vec![ChangeKind::Inserted]);
/// ```
pub struct ChangeLog<N> {
    events: Rc<RefCell<Vec<(ChangeKind, N)>>>,
}

impl<N: TreeNode + 'static> ChangeLog<N> {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Returns an observer that appends to this log.
    #[must_use]
    pub fn observer(&self) -> Observer<N> {
        let events = Rc::clone(&self.events);
        Rc::new(move |kind: ChangeKind, node: &N| {
            events.borrow_mut().push((kind, node.clone()));
        })
    }

    /// Returns the recorded events in delivery order.
    #[must_use]
    pub fn events(&self) -> Vec<(ChangeKind, N)> {
        self.events.borrow().clone()
    }

    /// Returns the recorded change kinds in delivery order.
    #[must_use]
    pub fn kinds(&self) -> Vec<ChangeKind> {
        self.events.borrow().iter().map(|(kind, _)| *kind).collect()
    }

    /// Returns the number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// Returns whether no event was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Forgets every recorded event.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl<N: TreeNode + 'static> Default for ChangeLog<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> Clone for ChangeLog<N> {
    fn clone(&self) -> Self {
        Self {
            events: Rc::clone(&self.events),
        }
    }
}

impl<N: fmt::Debug> fmt::Debug for ChangeLog<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeLog")
            .field("events", &self.events.borrow())
            .finish()
    }
}
