//! Pattern abstract syntax tree.
//!
//! The AST is immutable once built and holds no reference to any concrete
//! tree, so a compiled pattern can be matched against many trees.

use std::fmt;

use strum::Display;

/// Structural relation between a step's node and the previously consumed
/// node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Axis {
    /// A direct child (`/`).
    Child,
    /// Any proper descendant, in document order (`//`).
    Descendant,
    /// The immediately following sibling (`,`).
    NextSibling,
    /// Any other sibling, in document order (`&`).
    AnySibling,
}

impl Axis {
    /// Returns the notation token for this axis.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Child => "/",
            Self::Descendant => "//",
            Self::NextSibling => ",",
            Self::AnySibling => "&",
        }
    }
}

/// A test applied to a candidate node's value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueTest {
    /// The value equals the literal text.
    Literal(String),
    /// Any value (`.`).
    Wildcard,
    /// A host predicate looked up by name (`[name]`).
    Predicate(String),
    /// A subtree equal in shape and values to the node most recently bound
    /// to an earlier capture (`$name`).
    Reference(String),
}

impl fmt::Display for ValueTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => write!(f, "{text:?}"),
            Self::Wildcard => f.write_str("."),
            Self::Predicate(name) => write!(f, "[{name}]"),
            Self::Reference(name) => write!(f, "${name}"),
        }
    }
}

/// A zero-width positional constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Anchor {
    /// The match starts at the node the scan started from (leading `/`).
    Root,
    /// The current node has no children (trailing `$`).
    Leaf,
}

/// One element of a [`PatternNode::Sequence`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// The axis joining this step to the previous one.
    ///
    /// `None` for the first step of a sequence, which inherits the axis the
    /// sequence itself was reached by, and for zero-width anchor steps.
    pub axis: Option<Axis>,
    /// The sub-pattern matched at this step.
    pub node: PatternNode,
}

/// A node of the pattern AST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternNode {
    /// Consumes one node whose value passes the test.
    Test(ValueTest),
    /// Matches each step in turn, each along its axis.
    Sequence(Vec<Step>),
    /// Tries each alternative in declared order.
    Alternation(Vec<PatternNode>),
    /// Matches the sub-pattern between `min` and `max` times.
    Repetition {
        /// The repeated sub-pattern.
        node: Box<PatternNode>,
        /// Minimum number of repetitions.
        min: u32,
        /// Maximum number of repetitions; `None` is unbounded.
        max: Option<u32>,
        /// Whether more repetitions are tried first.
        greedy: bool,
    },
    /// Binds the nodes consumed by the sub-pattern to a name.
    Capture {
        /// The capture name.
        name: String,
        /// The captured sub-pattern.
        node: Box<PatternNode>,
    },
    /// A zero-width positional constraint.
    Anchor(Anchor),
    /// Moves to the parent of the current node without consuming it (`>`).
    Parent,
}

impl PatternNode {
    /// Returns whether this sub-pattern can succeed without consuming a node.
    #[must_use]
    pub fn can_be_empty(&self) -> bool {
        match self {
            Self::Test(_) => false,
            Self::Sequence(steps) => steps.iter().all(|step| step.node.can_be_empty()),
            Self::Alternation(branches) => branches.iter().any(Self::can_be_empty),
            Self::Repetition { node, min, .. } => *min == 0 || node.can_be_empty(),
            Self::Capture { node, .. } => node.can_be_empty(),
            Self::Anchor(_) | Self::Parent => true,
        }
    }

    /// Returns whether every successful match of this sub-pattern consumes
    /// exactly one node.
    #[must_use]
    pub fn consumes_exactly_one(&self) -> bool {
        match self {
            Self::Test(_) => true,
            Self::Capture { node, .. } => node.consumes_exactly_one(),
            Self::Alternation(branches) => branches.iter().all(Self::consumes_exactly_one),
            Self::Sequence(_) | Self::Repetition { .. } | Self::Anchor(_) | Self::Parent => false,
        }
    }

    /// Returns the number of instructions this sub-pattern lowers to.
    ///
    /// Bounded repetitions are unrolled, so nested bounds multiply. The
    /// count saturates at `usize::MAX`.
    #[must_use]
    pub fn program_len(&self) -> usize {
        match self {
            Self::Test(_) | Self::Anchor(_) | Self::Parent => 1,
            Self::Sequence(steps) => steps
                .iter()
                .fold(0, |total, step| total.saturating_add(step.node.program_len())),
            Self::Alternation(branches) => {
                let jumps = branches.len().saturating_sub(1).saturating_mul(2);
                branches
                    .iter()
                    .fold(jumps, |total, branch| total.saturating_add(branch.program_len()))
            }
            Self::Repetition { node, min, max, .. } => {
                let body = node.program_len();
                let required = count(*min).saturating_mul(body);
                let optional = match max {
                    Some(upper) => {
                        count(upper.saturating_sub(*min)).saturating_mul(body.saturating_add(1))
                    }
                    None => body.saturating_add(2),
                };
                required.saturating_add(optional)
            }
            Self::Capture { node, .. } => node.program_len(),
        }
    }

    /// Returns the capture names declared in this sub-pattern, in order of
    /// first declaration.
    #[must_use]
    pub fn capture_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            match node {
                Self::Test(_) | Self::Anchor(_) | Self::Parent => {}
                Self::Sequence(steps) => pending.extend(steps.iter().rev().map(|step| &step.node)),
                Self::Alternation(branches) => pending.extend(branches.iter().rev()),
                Self::Repetition { node: inner, .. } => pending.push(inner),
                Self::Capture { name, node: inner } => {
                    if !names.contains(&name.as_str()) {
                        names.push(name.as_str());
                    }
                    pending.push(inner);
                }
            }
        }
        names
    }
}

fn count(times: u32) -> usize {
    usize::try_from(times).unwrap_or(usize::MAX)
}
