//! Substituting replacements for matches.
//!
//! [`apply`] replaces a match's target with the nodes a [`Replacement`]
//! produces, at the same position among its siblings, then notifies
//! observers once the structure is complete:
//!
//! 1. `Removed` on the target,
//! 2. `Moved` on each node relocated into the replacement,
//! 3. `Inserted` on each new top-level node,
//! 4. `ChildrenChanged` on the parent.
//!
//! Notifications are delivered to the affected node's own observers only.

use std::fmt;
use std::rc::Rc;

use tracing::debug;
use treepace_core::{ChangeKind, Literal, Tree, TreeNode, is_ancestor_or_self};

use crate::error::{ApplyError, CompileError};
use crate::matcher::Match;
use crate::template::Template;

const REWRITER_TARGET: &str = "treepace::rewriter";

/// A host callback building replacement nodes for a match.
pub type Callback<N> = Rc<dyn Fn(&Match<N>) -> Vec<N>>;

/// What to substitute for each match.
pub enum Replacement<N> {
    /// Instantiate a template.
    Template(Template),
    /// Call the host; returned nodes must be unattached.
    Callback(Callback<N>),
}

impl<N> Replacement<N> {
    /// Parses standalone template text.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::Syntax`] if the text is malformed.
    pub fn template(text: &str) -> Result<Self, CompileError> {
        Template::parse(text).map(Self::Template)
    }

    /// Wraps a host callback.
    ///
    /// Returning exactly the match target leaves the tree unchanged. The
    /// callback may adopt the target into a new subtree it returns.
    #[must_use]
    pub fn callback(callback: impl Fn(&Match<N>) -> Vec<N> + 'static) -> Self {
        Self::Callback(Rc::new(callback))
    }
}

impl<N> Clone for Replacement<N> {
    fn clone(&self) -> Self {
        match self {
            Self::Template(template) => Self::Template(template.clone()),
            Self::Callback(callback) => Self::Callback(Rc::clone(callback)),
        }
    }
}

impl<N> fmt::Debug for Replacement<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template(template) => f.debug_tuple("Template").field(&template.to_string()).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// Result of applying one replacement.
#[derive(Debug, Clone)]
pub struct Applied<N> {
    changed: bool,
    inserted: Vec<N>,
}

impl<N> Applied<N> {
    const fn unchanged() -> Self {
        Self {
            changed: false,
            inserted: Vec::new(),
        }
    }

    /// Returns whether the tree was modified.
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.changed
    }

    /// Returns the top-level nodes inserted in place of the target.
    #[must_use]
    pub fn inserted(&self) -> &[N] {
        &self.inserted
    }
}

/// Where the target sat before substitution.
struct Position<N> {
    parent: Option<N>,
    index: usize,
}

impl<N: TreeNode> Position<N> {
    fn of(target: &N) -> Self {
        Self {
            parent: target.parent(),
            index: target.index().unwrap_or_default(),
        }
    }
}

/// Substitutes `replacement` for the target of `found` in `tree`.
///
/// # Errors
///
/// Returns [`ApplyError::InvalidRootReplacement`] when the target is the
/// tree root and the replacement is not exactly one node, and
/// [`ApplyError::DetachedReplacement`] when a callback returns a node that
/// is still part of the tree. The tree is left untouched in both cases,
/// apart from changes the callback itself made.
pub fn apply<N>(
    tree: &mut Tree<N>,
    found: &Match<N>,
    replacement: &Replacement<N>,
) -> Result<Applied<N>, ApplyError>
where
    N: TreeNode,
    N::Value: Literal,
{
    let target = found.target();
    if target.parent().is_none() && !tree.root().is_same(target) {
        return Err(ApplyError::detached(
            target.id(),
            "the match target is no longer part of the tree",
        ));
    }
    match replacement {
        Replacement::Template(template) => apply_template(tree, found, template),
        Replacement::Callback(callback) => apply_callback(tree, found, callback.as_ref()),
    }
}

fn apply_template<N>(
    tree: &mut Tree<N>,
    found: &Match<N>,
    template: &Template,
) -> Result<Applied<N>, ApplyError>
where
    N: TreeNode,
    N::Value: Literal,
{
    let target = found.target();
    let position = Position::of(target);
    if position.parent.is_none() {
        let count = template.root_count(found);
        if count != 1 {
            return Err(ApplyError::InvalidRootReplacement {
                node: target.id(),
                count,
            });
        }
    }

    target.detach();
    let instance = template.instantiate(found);
    substitute(tree, &position, &instance.roots);
    notify(target, &instance.moved, &instance.roots, position.parent.as_ref());
    debug!(
        target: REWRITER_TARGET,
        node = %target.id(),
        inserted = instance.roots.len(),
        moved = instance.moved.len(),
        "applied template"
    );
    Ok(Applied {
        changed: true,
        inserted: instance.roots,
    })
}

fn apply_callback<N>(
    tree: &mut Tree<N>,
    found: &Match<N>,
    callback: &dyn Fn(&Match<N>) -> Vec<N>,
) -> Result<Applied<N>, ApplyError>
where
    N: TreeNode,
{
    let target = found.target();
    let position = Position::of(target);
    let roots = callback(found);

    if matches!(roots.as_slice(), [only] if only.is_same(target)) {
        return Ok(Applied::unchanged());
    }
    validate_roots(tree, &position, &roots)?;
    if position.parent.is_none() && roots.len() != 1 {
        return Err(ApplyError::InvalidRootReplacement {
            node: target.id(),
            count: roots.len(),
        });
    }

    let adopted = roots
        .iter()
        .any(|root| is_ancestor_or_self(root, target));
    if !adopted {
        target.detach();
    }
    substitute(tree, &position, &roots);
    let moved = if adopted { vec![target.clone()] } else { Vec::new() };
    notify(target, &moved, &roots, position.parent.as_ref());
    debug!(
        target: REWRITER_TARGET,
        node = %target.id(),
        inserted = roots.len(),
        adopted,
        "applied callback"
    );
    Ok(Applied {
        changed: true,
        inserted: roots,
    })
}

fn validate_roots<N: TreeNode>(
    tree: &Tree<N>,
    position: &Position<N>,
    roots: &[N],
) -> Result<(), ApplyError> {
    for (index, root) in roots.iter().enumerate() {
        let problem = if root.parent().is_some() {
            Some("it already has a parent")
        } else if root.is_same(tree.root()) {
            Some("it is the tree root")
        } else if roots.iter().take(index).any(|earlier| earlier.is_same(root)) {
            Some("it was returned more than once")
        } else if position
            .parent
            .as_ref()
            .is_some_and(|parent| is_ancestor_or_self(root, parent))
        {
            Some("it encloses the target's parent")
        } else {
            None
        };
        if let Some(description) = problem {
            return Err(ApplyError::detached(root.id(), description));
        }
    }
    Ok(())
}

fn substitute<N: TreeNode>(tree: &mut Tree<N>, position: &Position<N>, roots: &[N]) {
    match (&position.parent, roots.first()) {
        (Some(parent), _) => {
            for (offset, root) in roots.iter().enumerate() {
                parent.insert_child_at(position.index + offset, root.clone());
            }
        }
        (None, Some(root)) => {
            tree.set_root(root.clone());
        }
        (None, None) => {}
    }
}

fn notify<N: TreeNode>(target: &N, moved: &[N], inserted: &[N], parent: Option<&N>) {
    target.notify(ChangeKind::Removed);
    for node in moved {
        node.notify(ChangeKind::Moved);
    }
    for node in inserted {
        node.notify(ChangeKind::Inserted);
    }
    if let Some(parent) = parent {
        parent.notify(ChangeKind::ChildrenChanged);
    }
}
