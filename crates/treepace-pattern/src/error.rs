//! Error types for compiling, applying, and running transformations.
//!
//! Compilation errors carry the byte offset into the pattern text. Apply
//! errors carry the identity of the offending node. No match is never an
//! error; an empty match sequence is a normal result.

use thiserror::Error;
use treepace_core::NodeId;

/// Errors raised while compiling pattern or template text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// The text does not follow the pattern notation.
    #[error("syntax error at offset {position}: {message}")]
    Syntax {
        /// Byte offset of the offending token.
        position: usize,
        /// Description of the problem.
        message: String,
    },

    /// A template references a capture the pattern never declares, or a
    /// pattern back-reference precedes its capture.
    #[error("reference to undeclared capture '{name}' at offset {position}")]
    UndefinedCapture {
        /// The referenced capture name.
        name: String,
        /// Byte offset of the reference.
        position: usize,
    },

    /// A repetition's bounds are unusable.
    #[error("invalid quantifier at offset {position}: {message}")]
    InvalidQuantifier {
        /// Byte offset of the quantifier.
        position: usize,
        /// Description of the problem.
        message: String,
    },

    /// A predicate reference names no registered predicate.
    #[error("unknown predicate '[{name}]' at offset {position}")]
    UnknownPredicate {
        /// The referenced predicate name.
        name: String,
        /// Byte offset of the reference.
        position: usize,
    },
}

impl CompileError {
    /// Creates a syntax error.
    #[must_use]
    pub fn syntax(position: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            message: message.into(),
        }
    }

    /// Creates an invalid quantifier error.
    #[must_use]
    pub fn quantifier(position: usize, message: impl Into<String>) -> Self {
        Self::InvalidQuantifier {
            position,
            message: message.into(),
        }
    }

    /// Returns the byte offset the error refers to.
    #[must_use]
    pub const fn position(&self) -> usize {
        match self {
            Self::Syntax { position, .. }
            | Self::UndefinedCapture { position, .. }
            | Self::InvalidQuantifier { position, .. }
            | Self::UnknownPredicate { position, .. } => *position,
        }
    }
}

/// Errors raised while substituting a replacement for a match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ApplyError {
    /// A callback returned a node that is still part of the tree.
    #[error("replacement node {node} is attached to the tree: {description}")]
    DetachedReplacement {
        /// The offending replacement node.
        node: NodeId,
        /// What is wrong with it.
        description: String,
    },

    /// The tree root was matched and the replacement is not a single node.
    #[error("root {node} must be replaced by exactly one node, got {count}")]
    InvalidRootReplacement {
        /// The matched root node.
        node: NodeId,
        /// Number of replacement nodes produced.
        count: usize,
    },
}

impl ApplyError {
    /// Creates a detached replacement error.
    #[must_use]
    pub fn detached(node: NodeId, description: impl Into<String>) -> Self {
        Self::DetachedReplacement {
            node,
            description: description.into(),
        }
    }
}

/// Errors raised by the transformation runner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TransformError {
    /// The pattern, template, or a predicate reference is invalid.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// A replacement could not be applied. Earlier applications are kept.
    #[error(transparent)]
    Apply(#[from] ApplyError),

    /// Repeat mode reached its pass cap while matches persisted.
    #[error("transformation did not converge after {passes} passes ({applications} applications)")]
    DidNotConverge {
        /// Passes run before giving up.
        passes: usize,
        /// Replacements applied before giving up.
        applications: usize,
    },
}
