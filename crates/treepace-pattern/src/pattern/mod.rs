//! Pattern compilation.
//!
//! [`Pattern::compile`] tokenizes the notation, parses it by recursive
//! descent into a [`PatternNode`] tree, validates it, and lowers it into a
//! [`Program`]. An optional `-> template` suffix is parsed into a
//! [`Template`] whose capture references must all be declared by the
//! pattern.

mod ast;
mod lexer;
pub(crate) mod parser;

use std::fmt;
use std::str::FromStr;

use tracing::trace;

pub use ast::{Anchor, Axis, PatternNode, Step, ValueTest};
pub(crate) use lexer::{TokenKind, tokenize};

use crate::config::EngineConfig;
use crate::error::CompileError;
use crate::program::Program;
use crate::template::Template;
use parser::{Parser, PredicateRef};

const COMPILE_TARGET: &str = "treepace::compile";

/// A compiled tree pattern.
///
/// # Example
///
/// ```
/// use treepace_pattern::Pattern;
///
/// let pattern = Pattern::compile("list/x:item -> li")?;
/// assert_eq!(pattern.capture_names(), vec!["x"]);
/// assert!(pattern.template().is_some());
/// # Ok::<(), treepace_pattern::CompileError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    ast: PatternNode,
    program: Program,
    template: Option<Template>,
    predicates: Vec<PredicateRef>,
}

impl Pattern {
    /// Compiles pattern text with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`CompileError`] if the text is malformed, a quantifier is
    /// invalid, or a reference names a capture not declared before it.
    pub fn compile(text: &str) -> Result<Self, CompileError> {
        Self::compile_with(text, &EngineConfig::default())
    }

    /// Compiles pattern text, checking quantifier bounds against `config`.
    ///
    /// # Errors
    ///
    /// Returns a [`CompileError`] if the text is malformed, a quantifier is
    /// invalid, or a reference names a capture not declared before it.
    pub fn compile_with(text: &str, config: &EngineConfig) -> Result<Self, CompileError> {
        let tokens = tokenize(text)?;
        let mut parser = Parser::new(&tokens, text.len(), config.max_quantifier_bound());
        let ast = parser.pattern()?;
        let template = if parser.eat(&TokenKind::Arrow) {
            Some(Template::from_roots(parser.template()?))
        } else {
            None
        };
        parser.finish()?;

        let captures = ast.capture_names();
        if let Some(template) = &template {
            template.check_references(&captures)?;
        }
        let program = Program::compile(&ast);
        trace!(target: COMPILE_TARGET, pattern = text, program = %program, "compiled pattern");

        Ok(Self {
            source: text.to_owned(),
            ast,
            program,
            template,
            predicates: parser.into_predicates(),
        })
    }

    /// Returns the text the pattern was compiled from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the parsed AST.
    #[must_use]
    pub const fn ast(&self) -> &PatternNode {
        &self.ast
    }

    /// Returns the compiled instruction listing.
    #[must_use]
    pub const fn program(&self) -> &Program {
        &self.program
    }

    /// Returns the inline replacement template, if the text had one.
    #[must_use]
    pub const fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    /// Returns the declared capture names in order of first declaration.
    #[must_use]
    pub fn capture_names(&self) -> Vec<&str> {
        self.ast.capture_names()
    }

    /// Returns each predicate reference with its byte offset.
    pub fn predicate_references(&self) -> impl Iterator<Item = (&str, usize)> {
        self.predicates
            .iter()
            .map(|(name, position)| (name.as_str(), *position))
    }
}

impl FromStr for Pattern {
    type Err = CompileError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::compile(text)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
