//! Transformation runner.
//!
//! A [`Transformation`] pairs a pattern with a [`Replacement`] and a
//! [`Mode`]. The runner computes a pass's matches eagerly before mutating
//! anything, then applies them in document order. A match whose nodes an
//! earlier application already removed is skipped, not treated as an error.
//! Apply errors abort the run and leave earlier applications in place.

use std::fmt;

use strum::{Display, EnumString};
use tracing::{debug, trace};
use treepace_core::{Literal, Tree, TreeNode};

use crate::config::EngineConfig;
use crate::error::{ApplyError, CompileError, TransformError};
use crate::matcher::{Match, Matcher};
use crate::pattern::Pattern;
use crate::predicates::Predicates;
use crate::rewriter::{Replacement, apply};

const RUNNER_TARGET: &str = "treepace::runner";

/// How often a transformation applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Mode {
    /// One pass over the matches present before the run.
    #[default]
    Once,
    /// Passes repeat until one finds no match.
    Repeat,
}

/// A pattern, its replacement, and an execution mode.
pub struct Transformation<N> {
    pattern: Pattern,
    replacement: Replacement<N>,
    mode: Mode,
}

impl<N> Transformation<N> {
    /// Pairs `pattern` with `replacement`.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::UndefinedCapture`] if a template replacement
    /// references a capture the pattern does not declare.
    pub fn new(pattern: Pattern, replacement: Replacement<N>, mode: Mode) -> Result<Self, CompileError> {
        if let Replacement::Template(template) = &replacement {
            template.check_references(&pattern.capture_names())?;
        }
        Ok(Self {
            pattern,
            replacement,
            mode,
        })
    }

    /// Compiles a `pattern -> template` rule.
    ///
    /// # Errors
    ///
    /// Returns a [`CompileError`] if the rule is malformed or has no
    /// `->` template.
    pub fn rule(text: &str, mode: Mode) -> Result<Self, CompileError> {
        Self::rule_with(text, mode, &EngineConfig::default())
    }

    /// Compiles a `pattern -> template` rule using `config`'s bounds.
    ///
    /// # Errors
    ///
    /// Returns a [`CompileError`] if the rule is malformed or has no
    /// `->` template.
    pub fn rule_with(text: &str, mode: Mode, config: &EngineConfig) -> Result<Self, CompileError> {
        let pattern = Pattern::compile_with(text, config)?;
        let Some(template) = pattern.template().cloned() else {
            return Err(CompileError::syntax(
                text.len(),
                "expected '->' followed by a replacement template",
            ));
        };
        Ok(Self {
            pattern,
            replacement: Replacement::Template(template),
            mode,
        })
    }

    /// Returns the search pattern.
    #[must_use]
    pub const fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Returns the replacement.
    #[must_use]
    pub const fn replacement(&self) -> &Replacement<N> {
        &self.replacement
    }

    /// Returns the execution mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }
}

impl<N> fmt::Debug for Transformation<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformation")
            .field("pattern", &self.pattern.source())
            .field("replacement", &self.replacement)
            .field("mode", &self.mode)
            .finish()
    }
}

/// An ordered list of rules run together until none applies.
///
/// Rule text holds one `pattern -> template` rule per line; blank lines and
/// lines starting with `#` are ignored.
///
/// # Example
///
/// ```
/// use treepace_pattern::RuleSet;
///
/// let rules: RuleSet = RuleSet::parse("# rename\nx -> y\n\na -> x\n")?;
/// assert_eq!(rules.len(), 2);
/// # Ok::<(), treepace_pattern::CompileError>(())
/// ```
#[derive(Debug)]
pub struct RuleSet<N = treepace_core::Node> {
    rules: Vec<Transformation<N>>,
}

impl<N> RuleSet<N> {
    /// Parses rule text with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns the first rule's [`CompileError`], with its position
    /// relative to the whole text.
    pub fn parse(text: &str) -> Result<Self, CompileError> {
        Self::parse_with(text, &EngineConfig::default())
    }

    /// Parses rule text using `config`'s bounds.
    ///
    /// # Errors
    ///
    /// Returns the first rule's [`CompileError`], with its position
    /// relative to the whole text.
    pub fn parse_with(text: &str, config: &EngineConfig) -> Result<Self, CompileError> {
        let mut rules = Vec::new();
        let mut offset = 0;
        for line in text.split_inclusive('\n') {
            let line_start = offset;
            offset += line.len();
            let rule = line.trim();
            if rule.is_empty() || rule.starts_with('#') {
                continue;
            }
            let indent = line.len() - line.trim_start().len();
            let transformation = Transformation::rule_with(rule, Mode::Once, config)
                .map_err(|error| shift(error, line_start + indent))?;
            rules.push(transformation);
        }
        Ok(Self { rules })
    }

    /// Wraps already-built transformations; their modes are kept.
    #[must_use]
    pub const fn from_rules(rules: Vec<Transformation<N>>) -> Self {
        Self { rules }
    }

    /// Returns the rules in order.
    #[must_use]
    pub fn rules(&self) -> &[Transformation<N>] {
        &self.rules
    }

    /// Returns the number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns whether there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn shift(error: CompileError, by: usize) -> CompileError {
    match error {
        CompileError::Syntax { position, message } => CompileError::Syntax {
            position: position + by,
            message,
        },
        CompileError::UndefinedCapture { name, position } => CompileError::UndefinedCapture {
            name,
            position: position + by,
        },
        CompileError::InvalidQuantifier { position, message } => CompileError::InvalidQuantifier {
            position: position + by,
            message,
        },
        CompileError::UnknownPredicate { name, position } => CompileError::UnknownPredicate {
            name,
            position: position + by,
        },
    }
}

/// Counters describing a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOutcome {
    applications: usize,
    passes: usize,
    skipped: usize,
}

impl RunOutcome {
    /// Returns the number of replacements applied.
    #[must_use]
    pub const fn applications(&self) -> usize {
        self.applications
    }

    /// Returns the number of passes run, including a final pass that found
    /// nothing.
    #[must_use]
    pub const fn passes(&self) -> usize {
        self.passes
    }

    /// Returns the number of matches dropped because an earlier
    /// application removed their nodes.
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.skipped
    }

    fn absorb(&mut self, pass: Pass) {
        self.passes += 1;
        self.applications += pass.applications;
        self.skipped += pass.skipped;
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Pass {
    applications: usize,
    skipped: usize,
}

impl Pass {
    const fn found_nothing(self) -> bool {
        self.applications == 0 && self.skipped == 0
    }
}

/// Runs transformations against trees.
///
/// # Example
///
/// ```
/// use treepace_core::{Node, TextFormat, Tree};
/// use treepace_pattern::{Mode, Runner, Transformation};
///
/// let mut tree = Tree::new(TextFormat::Paren.load::<Node>("list (item item)")?);
/// let rule = Transformation::rule("list/item -> li", Mode::Once)?;
/// let outcome = Runner::new().run(&rule, &mut tree)?;
/// assert_eq!(outcome.applications(), 2);
/// assert_eq!(TextFormat::Paren.save(tree.root()), "list (li li)");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Runner<V = String> {
    predicates: Predicates<V>,
    config: EngineConfig,
}

impl<V> Runner<V> {
    /// Creates a runner with no predicates and the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
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

    /// Uses `config` for pass caps and match limits.
    #[must_use]
    pub const fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the runner's configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs one transformation against `tree`.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::Compile`] for a predicate reference the
    /// runner cannot resolve, [`TransformError::Apply`] when a replacement
    /// fails, and [`TransformError::DidNotConverge`] when repeat mode hits
    /// the pass cap with matches remaining.
    pub fn run<N>(
        &self,
        transformation: &Transformation<N>,
        tree: &mut Tree<N>,
    ) -> Result<RunOutcome, TransformError>
    where
        N: TreeNode<Value = V>,
        V: Literal,
    {
        self.predicates.check(transformation.pattern())?;
        let outcome = match transformation.mode() {
            Mode::Once => {
                let mut outcome = RunOutcome::default();
                outcome.absorb(self.pass(transformation, tree)?);
                outcome
            }
            Mode::Repeat => self.repeat(transformation, tree)?,
        };
        debug!(
            target: RUNNER_TARGET,
            pattern = transformation.pattern().source(),
            mode = %transformation.mode(),
            applications = outcome.applications,
            passes = outcome.passes,
            skipped = outcome.skipped,
            "transformation finished"
        );
        Ok(outcome)
    }

    /// Runs every rule in order, cycling until a whole cycle applies
    /// nothing.
    ///
    /// Each cycle counts as one pass against the configured cap.
    ///
    /// # Errors
    ///
    /// Returns the first rule error, or [`TransformError::DidNotConverge`]
    /// when the cap is reached and another cycle would still apply.
    pub fn run_program<N>(
        &self,
        rules: &RuleSet<N>,
        tree: &mut Tree<N>,
    ) -> Result<RunOutcome, TransformError>
    where
        N: TreeNode<Value = V>,
        V: Literal,
    {
        for rule in rules.rules() {
            self.predicates.check(rule.pattern())?;
        }
        let mut outcome = RunOutcome::default();
        loop {
            if outcome.passes >= self.config.max_passes() {
                let pending = rules.rules().iter().any(|rule| self.has_match(rule, tree));
                if pending {
                    return Err(TransformError::DidNotConverge {
                        passes: outcome.passes,
                        applications: outcome.applications,
                    });
                }
                outcome.passes += 1;
                return Ok(outcome);
            }

            let mut cycle = Pass::default();
            for rule in rules.rules() {
                let step = self.run(rule, tree)?;
                cycle.applications += step.applications;
                cycle.skipped += step.skipped;
            }
            outcome.absorb(cycle);
            debug!(
                target: RUNNER_TARGET,
                cycle = outcome.passes,
                applications = cycle.applications,
                "rule cycle finished"
            );
            if cycle.applications == 0 {
                return Ok(outcome);
            }
        }
    }

    fn repeat<N>(
        &self,
        transformation: &Transformation<N>,
        tree: &mut Tree<N>,
    ) -> Result<RunOutcome, TransformError>
    where
        N: TreeNode<Value = V>,
        V: Literal,
    {
        let mut outcome = RunOutcome::default();
        loop {
            if outcome.passes >= self.config.max_passes() {
                if self.has_match(transformation, tree) {
                    return Err(TransformError::DidNotConverge {
                        passes: outcome.passes,
                        applications: outcome.applications,
                    });
                }
                outcome.passes += 1;
                return Ok(outcome);
            }
            let pass = self.pass(transformation, tree)?;
            outcome.absorb(pass);
            trace!(
                target: RUNNER_TARGET,
                pass = outcome.passes,
                applications = pass.applications,
                "pass finished"
            );
            if pass.found_nothing() {
                return Ok(outcome);
            }
        }
    }

    fn matcher<'t, N>(&self, transformation: &'t Transformation<N>) -> Matcher<'t, V>
    where
        N: TreeNode<Value = V>,
    {
        Matcher::new(transformation.pattern())
            .with_predicates(&self.predicates)
            .with_config(self.config)
    }

    fn has_match<N>(&self, transformation: &Transformation<N>, tree: &Tree<N>) -> bool
    where
        N: TreeNode<Value = V>,
        V: Literal,
    {
        self.matcher(transformation).find_first(tree.root()).is_some()
    }

    fn pass<N>(&self, transformation: &Transformation<N>, tree: &mut Tree<N>) -> Result<Pass, ApplyError>
    where
        N: TreeNode<Value = V>,
        V: Literal,
    {
        let matches = self.matcher(transformation).find_all(tree.root());
        let mut pass = Pass::default();
        for found in &matches {
            if !still_attached(tree, found) {
                trace!(
                    target: RUNNER_TARGET,
                    node = %found.target().id(),
                    "skipping match whose nodes were removed"
                );
                pass.skipped += 1;
                continue;
            }
            apply(tree, found, transformation.replacement())?;
            pass.applications += 1;
        }
        Ok(pass)
    }
}

impl<V> Default for Runner<V> {
    fn default() -> Self {
        Self::new()
    }
}

fn still_attached<N: TreeNode>(tree: &Tree<N>, found: &Match<N>) -> bool {
    found.consumed().iter().all(|node| tree.contains(node))
}

/// Runs `transformation` against `tree` with a default [`Runner`].
///
/// # Errors
///
/// See [`Runner::run`].
pub fn run<N>(transformation: &Transformation<N>, tree: &mut Tree<N>) -> Result<RunOutcome, TransformError>
where
    N: TreeNode,
    N::Value: Literal,
{
    Runner::new().run(transformation, tree)
}
