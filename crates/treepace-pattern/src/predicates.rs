//! Host predicates referenced from patterns as `[name]`.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use treepace_core::TreeNode;

use crate::error::CompileError;
use crate::pattern::Pattern;

/// A host function deciding whether a node value passes a test.
pub type PredicateFn<V> = Rc<dyn Fn(&V) -> bool>;

/// A registry of named predicates.
///
/// # Example
///
/// ```
/// use treepace_pattern::Predicates;
///
/// let predicates = Predicates::new()
///     .with("numeric", |value: &String| value.parse::<i64>().is_ok());
/// assert!(predicates.contains("numeric"));
/// ```
pub struct Predicates<V> {
    entries: HashMap<String, PredicateFn<V>>,
}

impl<V> Predicates<V> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Adds a predicate, returning the registry.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, predicate: impl Fn(&V) -> bool + 'static) -> Self {
        self.insert(name, predicate);
        self
    }

    /// Adds or replaces a predicate.
    pub fn insert(&mut self, name: impl Into<String>, predicate: impl Fn(&V) -> bool + 'static) {
        self.entries.insert(name.into(), Rc::new(predicate));
    }

    /// Returns whether `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns the predicate registered as `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PredicateFn<V>> {
        self.entries.get(name)
    }

    /// Evaluates `name` against `node`'s value; unknown names never pass.
    pub fn evaluate<N: TreeNode<Value = V>>(&self, name: &str, node: &N) -> bool {
        self.entries
            .get(name)
            .is_some_and(|predicate| node.with_value(|value| predicate(value)))
    }

    /// Checks that every predicate `pattern` references is registered.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::UnknownPredicate`] for the first missing name.
    pub fn check(&self, pattern: &Pattern) -> Result<(), CompileError> {
        match pattern
            .predicate_references()
            .find(|(name, _)| !self.contains(name))
        {
            Some((name, position)) => Err(CompileError::UnknownPredicate {
                name: name.to_owned(),
                position,
            }),
            None => Ok(()),
        }
    }
}

impl<V> Default for Predicates<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Clone for Predicates<V> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<V> fmt::Debug for Predicates<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("Predicates").field("names", &names).finish()
    }
}
