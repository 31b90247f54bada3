//! Pattern compiler and rewriting engine for Treepace, a regular-expression
//! language for trees.
//!
//! This crate provides:
//!
//! - **Pattern compilation** via [`Pattern`], which parses the notation into
//!   a [`PatternNode`] tree and lowers it into a [`Program`]
//! - **Matching** via [`Matcher`], a lazy backtracking search producing
//!   [`Match`] results with named captures
//! - **Replacement** via [`apply`], substituting a [`Template`] or a host
//!   callback for a match and notifying observers
//! - **Transformation** via [`Runner`], applying a [`Transformation`] once or
//!   until no match remains, and running multi-rule [`RuleSet`]s
//!
//! # Pattern Language
//!
//! - `item`, `"two words"` - a node with exactly this value
//! - `.` - any node
//! - `[name]` - a node accepted by a host predicate
//! - `a/b` - `b` is a child of `a`; `a b` means the same
//! - `a//b` - `b` is a descendant of `a`
//! - `a,b` - `b` is the next sibling of `a`
//! - `a&b` - `b` is any other sibling of `a`
//! - `a|b` - either, tried left to right
//! - `?`, `*`, `+`, `{m}`, `{m,}`, `{m,n}` - repetition, greedy unless
//!   followed by `?`
//! - `x:item` - capture the consumed nodes as `x`
//! - `x:.,$x` - `$x` matches a node equal to the one captured as `x`
//! - `a/b>/c` - `>` steps back up to the parent without consuming it
//! - leading `/` - the match must start at the scanned root; trailing `$` -
//!   the current node is a leaf
//! - `pattern -> template` - an inline replacement; `$x` inserts a capture
//!   and `$0` the matched node
//!
//! # Example
//!
//! ```
//! use treepace_core::{ChangeLog, Node, TextFormat, Tree, TreeNode};
//! use treepace_pattern::{Mode, Transformation, run};
//!
//! let mut tree = Tree::new(TextFormat::Paren.load::<Node>("list (item item)")?);
//! let log = ChangeLog::new();
//! tree.root().add_observer(log.observer());
//!
//! let rule = Transformation::rule("list/item -> li", Mode::Once)?;
//! let outcome = run(&rule, &mut tree)?;
//!
//! assert_eq!(outcome.applications(), 2);
//! assert_eq!(TextFormat::Paren.save(tree.root()), "list (li li)");
//! assert_eq!(log.len(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod config;
mod error;
mod matcher;
mod pattern;
mod predicates;
mod program;
mod rewriter;
mod runner;
mod template;

pub use config::EngineConfig;
pub use error::{ApplyError, CompileError, TransformError};
pub use matcher::{CapturedValue, Match, Matcher, Matches};
pub use pattern::{Anchor, Axis, Pattern, PatternNode, Step, ValueTest};
pub use predicates::{PredicateFn, Predicates};
pub use program::{CaptureKind, CaptureSlot, Instruction, MAX_PROGRAM_LEN, Program};
pub use rewriter::{Applied, Callback, Replacement, apply};
pub use runner::{Mode, RuleSet, RunOutcome, Runner, Transformation, run};
pub use template::{Template, TemplateAtom, TemplateNode};

#[cfg(test)]
mod tests;
