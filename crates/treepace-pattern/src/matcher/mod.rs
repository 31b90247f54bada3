//! Pattern matching against trees.
//!
//! A [`Matcher`] runs a compiled [`Pattern`] over a tree and produces a lazy
//! [`Matches`] sequence. Start candidates are the scan root followed by its
//! descendants in document order; for each start, the backtracking machine
//! reports every solution in preference order (earlier alternatives and
//! greedier repetitions first).
//!
//! By default a solution is dropped when any node it consumes lies inside
//! the target of a match already reported, or when its target encloses an
//! earlier target, so the replaced regions of one run never overlap.

mod capture;
mod machine;

use tracing::{trace, warn};
use treepace_core::{Literal, TreeNode, is_ancestor_or_self};

pub use capture::{CapturedValue, Match};
use machine::Machine;

use crate::config::EngineConfig;
use crate::pattern::Pattern;
use crate::predicates::Predicates;
use crate::program::Program;

const MATCHER_TARGET: &str = "treepace::matcher";

/// Runs a compiled pattern against trees.
///
/// # Example
///
/// ```
/// use treepace_core::{Node, TextFormat, TreeNode};
/// use treepace_pattern::{Matcher, Pattern};
///
/// let tree: Node = TextFormat::Paren.load("list (item item other)")?;
/// let pattern = Pattern::compile("list/item")?;
/// let matches = Matcher::new(&pattern).find_all(&tree);
/// assert_eq!(matches.len(), 2);
/// assert!(matches.iter().all(|m| m.target().value() == "item"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Matcher<'p, V = String> {
    pattern: &'p Pattern,
    predicates: Predicates<V>,
    config: EngineConfig,
}

impl<'p, V> Matcher<'p, V> {
    /// Creates a matcher with no predicates and the default configuration.
    #[must_use]
    pub fn new(pattern: &'p Pattern) -> Self {
        Self {
            pattern,
            predicates: Predicates::new(),
            config: EngineConfig::default(),
        }
    }

    /// Uses `predicates` to resolve `[name]` references.
    #[must_use]
    pub fn with_predicates(mut self, predicates: &Predicates<V>) -> Self {
        self.predicates = predicates.clone();
        self
    }

    /// Uses `config` for match limits and overlap handling.
    #[must_use]
    pub const fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the pattern being matched.
    #[must_use]
    pub const fn pattern(&self) -> &'p Pattern {
        self.pattern
    }

    /// Returns a lazy sequence of matches in the subtree rooted at `root`.
    ///
    /// The tree must not be mutated while the sequence is live.
    pub fn find_iter<N>(&self, root: &N) -> Matches<'_, N>
    where
        N: TreeNode<Value = V>,
        V: Literal,
    {
        for (name, position) in self.pattern.predicate_references() {
            if !self.predicates.contains(name) {
                warn!(
                    target: MATCHER_TARGET,
                    predicate = name,
                    position,
                    "unknown predicate never matches"
                );
            }
        }
        Matches {
            program: self.pattern.program(),
            predicates: &self.predicates,
            config: self.config,
            scan_root: root.clone(),
            starts: vec![root.clone()],
            machine: None,
            claimed: Vec::new(),
            reported: 0,
            truncated: false,
        }
    }

    /// Collects every match in the subtree rooted at `root`.
    pub fn find_all<N>(&self, root: &N) -> Vec<Match<N>>
    where
        N: TreeNode<Value = V>,
        V: Literal,
    {
        self.find_iter(root).collect()
    }

    /// Returns the first match in the subtree rooted at `root`.
    pub fn find_first<N>(&self, root: &N) -> Option<Match<N>>
    where
        N: TreeNode<Value = V>,
        V: Literal,
    {
        self.find_iter(root).next()
    }

    /// Returns the preferred match that starts exactly at `node`.
    pub fn match_at<N>(&self, node: &N) -> Option<Match<N>>
    where
        N: TreeNode<Value = V>,
        V: Literal,
    {
        let program = self.pattern.program();
        let mut machine = Machine::new(program, &self.predicates, node.clone(), node.clone());
        machine
            .next_solution()
            .and_then(|consumed| Match::from_consumed(program, consumed))
    }

    /// Returns whether the pattern matches starting at the root of a tree.
    pub fn matches_root<N>(&self, root: &N) -> bool
    where
        N: TreeNode<Value = V>,
        V: Literal,
    {
        self.match_at(root).is_some()
    }
}

/// Lazy sequence of matches produced by [`Matcher::find_iter`].
///
/// No match past the one just returned is computed until requested;
/// dropping the iterator cancels the search.
pub struct Matches<'m, N: TreeNode> {
    program: &'m Program,
    predicates: &'m Predicates<N::Value>,
    config: EngineConfig,
    scan_root: N,
    starts: Vec<N>,
    machine: Option<Machine<'m, N>>,
    claimed: Vec<N>,
    reported: usize,
    truncated: bool,
}

impl<N: TreeNode> Matches<'_, N> {
    fn next_start(&mut self) -> Option<N> {
        let node = self.starts.pop()?;
        if !self.program.is_rooted() {
            self.starts.extend(node.children().into_iter().rev());
        }
        Some(node)
    }

    fn overlaps(&self, found: &Match<N>) -> bool {
        self.claimed.iter().any(|claimed| {
            is_ancestor_or_self(found.target(), claimed)
                || found
                    .consumed()
                    .iter()
                    .any(|node| is_ancestor_or_self(claimed, node))
        })
    }
}

impl<N> Iterator for Matches<'_, N>
where
    N: TreeNode,
    N::Value: Literal,
{
    type Item = Match<N>;

    fn next(&mut self) -> Option<Match<N>> {
        if self.reported >= self.config.max_matches() {
            if !self.truncated {
                self.truncated = true;
                warn!(
                    target: MATCHER_TARGET,
                    limit = self.config.max_matches(),
                    "match limit reached; remaining matches are not reported"
                );
            }
            return None;
        }

        loop {
            let mut machine = match self.machine.take() {
                Some(machine) => machine,
                None => {
                    let start = self.next_start()?;
                    Machine::new(self.program, self.predicates, self.scan_root.clone(), start)
                }
            };
            let Some(consumed) = machine.next_solution() else {
                continue;
            };
            self.machine = Some(machine);
            let Some(found) = Match::from_consumed(self.program, consumed) else {
                continue;
            };
            if !self.config.allow_overlap() {
                if self.overlaps(&found) {
                    continue;
                }
                self.claimed.push(found.target().clone());
            }
            self.reported += 1;
            trace!(
                target: MATCHER_TARGET,
                start = %found.start().id(),
                target_node = %found.target().id(),
                "match found"
            );
            return Some(found);
        }
    }
}
