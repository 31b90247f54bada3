//! Conversion between node values and literal text.

/// Node values that can be compared with, and built from, literal text.
///
/// Pattern literals test values through [`Literal::matches_literal`];
/// replacement templates and text formats build values through
/// [`Literal::from_literal`]. Pattern back-references compare values with
/// each other, hence the `PartialEq` bound.
pub trait Literal: PartialEq {
    /// Returns whether this value is equal to the literal `text`.
    fn matches_literal(&self, text: &str) -> bool;

    /// Builds a value from literal `text`.
    fn from_literal(text: &str) -> Self;
}

impl Literal for String {
    fn matches_literal(&self, text: &str) -> bool {
        self == text
    }

    fn from_literal(text: &str) -> Self {
        text.to_owned()
    }
}
