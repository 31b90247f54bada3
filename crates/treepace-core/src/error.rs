//! Error types for loading trees from text.

use thiserror::Error;

/// Errors raised while parsing a tree from one of the [`crate::TextFormat`]s.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum FormatError {
    /// The input contained no node.
    #[error("tree text is empty")]
    Empty,

    /// A token appeared where it is not allowed.
    #[error("unexpected {found} at offset {position}")]
    UnexpectedToken {
        /// Byte offset of the token.
        position: usize,
        /// Description of the token.
        found: String,
    },

    /// A parenthesised child list was opened but never closed.
    #[error("unclosed '(' at offset {position}")]
    Unclosed {
        /// Byte offset of the opening parenthesis.
        position: usize,
    },

    /// A quoted value was not terminated.
    #[error("unterminated quoted value starting at offset {position}")]
    UnterminatedString {
        /// Byte offset of the opening quote.
        position: usize,
    },

    /// More than one top-level node was found.
    #[error("second root node at offset {position}")]
    MultipleRoots {
        /// Byte offset (or line start) of the extra root.
        position: usize,
    },
}

impl FormatError {
    /// Creates an unexpected token error.
    #[must_use]
    pub fn unexpected(position: usize, found: impl Into<String>) -> Self {
        Self::UnexpectedToken {
            position,
            found: found.into(),
        }
    }
}
