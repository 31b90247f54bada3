//! Replacement templates.
//!
//! A template is a forest written in the same notation as patterns:
//! `ul/li`, `pair/(left, right)`, `wrapper/$x`, `$0`. Bare words and quoted
//! text create new nodes, `$name` expands to the nodes bound to a capture,
//! and `$0` expands to the match target.

use std::fmt;

use treepace_core::{Literal, NodeId, TreeNode, is_ancestor_or_self};

use crate::error::CompileError;
use crate::matcher::Match;
use crate::pattern::parser::Parser;
use crate::pattern::tokenize;

/// The head of a template node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateAtom {
    /// A new node holding the literal value.
    Literal(String),
    /// The nodes bound to a capture.
    Capture {
        /// The referenced capture name.
        name: String,
        /// Byte offset of the reference.
        position: usize,
    },
    /// The match target (`$0`).
    Target,
}

/// A template node and its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateNode {
    atom: TemplateAtom,
    children: Vec<TemplateNode>,
}

impl TemplateNode {
    pub(crate) const fn new(atom: TemplateAtom, children: Vec<Self>) -> Self {
        Self { atom, children }
    }

    /// Returns the node's head.
    #[must_use]
    pub const fn atom(&self) -> &TemplateAtom {
        &self.atom
    }

    /// Returns the node's children.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }
}

/// A parsed replacement template.
///
/// # Example
///
/// ```
/// use treepace_pattern::Template;
///
/// let template = Template::parse("pair/(left, $x)")?;
/// assert_eq!(template.to_string(), "pair/(left, $x)");
/// # Ok::<(), treepace_pattern::CompileError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    roots: Vec<TemplateNode>,
}

/// Nodes produced by instantiating a template for one match.
pub(crate) struct Instance<N> {
    pub(crate) roots: Vec<N>,
    pub(crate) moved: Vec<N>,
}

impl Template {
    /// Parses standalone template text.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::Syntax`] if the text is malformed.
    pub fn parse(text: &str) -> Result<Self, CompileError> {
        let tokens = tokenize(text)?;
        let mut parser = Parser::new(&tokens, text.len(), 0);
        let roots = parser.template()?;
        parser.finish()?;
        Ok(Self::from_roots(roots))
    }

    pub(crate) const fn from_roots(roots: Vec<TemplateNode>) -> Self {
        Self { roots }
    }

    /// Returns the top-level template nodes.
    #[must_use]
    pub fn roots(&self) -> &[TemplateNode] {
        &self.roots
    }

    /// Returns each capture reference with its byte offset, in order.
    #[must_use]
    pub fn references(&self) -> Vec<(&str, usize)> {
        let mut found = Vec::new();
        let mut pending: Vec<&TemplateNode> = self.roots.iter().rev().collect();
        while let Some(node) = pending.pop() {
            if let TemplateAtom::Capture { name, position } = &node.atom {
                found.push((name.as_str(), *position));
            }
            pending.extend(node.children.iter().rev());
        }
        found
    }

    /// Checks every reference against the declared capture names.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::UndefinedCapture`] for the first reference to
    /// an undeclared name.
    pub fn check_references(&self, declared: &[&str]) -> Result<(), CompileError> {
        match self
            .references()
            .into_iter()
            .find(|(name, _)| !declared.contains(name))
        {
            Some((name, position)) => Err(CompileError::UndefinedCapture {
                name: name.to_owned(),
                position,
            }),
            None => Ok(()),
        }
    }

    /// Returns how many top-level nodes the template produces for `found`.
    pub(crate) fn root_count<N: TreeNode>(&self, found: &Match<N>) -> usize {
        self.roots
            .iter()
            .map(|root| match &root.atom {
                TemplateAtom::Literal(_) | TemplateAtom::Target => 1,
                TemplateAtom::Capture { name, .. } => found.nodes(name).len(),
            })
            .sum()
    }

    /// Builds the replacement forest for `found`.
    ///
    /// The target must already be detached. The first use of a node inside
    /// the target's subtree moves it; every other use is a deep clone, so no
    /// node ends up with two parents.
    pub(crate) fn instantiate<N>(&self, found: &Match<N>) -> Instance<N>
    where
        N: TreeNode,
        N::Value: Literal,
    {
        let mut builder = Builder {
            found,
            used: Vec::new(),
            moved: Vec::new(),
        };
        let roots = builder.forest(&self.roots);
        Instance {
            roots,
            moved: builder.moved,
        }
    }
}

struct Builder<'a, N> {
    found: &'a Match<N>,
    used: Vec<NodeId>,
    moved: Vec<N>,
}

impl<N> Builder<'_, N>
where
    N: TreeNode,
    N::Value: Literal,
{
    fn forest(&mut self, nodes: &[TemplateNode]) -> Vec<N> {
        nodes.iter().flat_map(|node| self.node(node)).collect()
    }

    fn node(&mut self, node: &TemplateNode) -> Vec<N> {
        let found = self.found;
        match &node.atom {
            TemplateAtom::Literal(text) => {
                let created = N::create(N::Value::from_literal(text));
                for child in self.forest(&node.children) {
                    created.push_child(child);
                }
                vec![created]
            }
            TemplateAtom::Target => vec![self.reuse(found.target())],
            TemplateAtom::Capture { name, .. } => found
                .nodes(name)
                .iter()
                .map(|bound| self.reuse(bound))
                .collect(),
        }
    }

    fn reuse(&mut self, node: &N) -> N {
        let id = node.id();
        let movable = is_ancestor_or_self(self.found.target(), node) && !self.used.contains(&id);
        if !movable {
            return node.deep_clone();
        }
        self.used.push(id);
        node.detach();
        self.moved.push(node.clone());
        node.clone()
    }
}

fn write_forest(f: &mut fmt::Formatter<'_>, nodes: &[TemplateNode]) -> fmt::Result {
    for (index, node) in nodes.iter().enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        write_node(f, node)?;
    }
    Ok(())
}

fn write_node(f: &mut fmt::Formatter<'_>, node: &TemplateNode) -> fmt::Result {
    match &node.atom {
        TemplateAtom::Literal(text) if is_bare(text) => f.write_str(text)?,
        TemplateAtom::Literal(text) => write!(f, "{text:?}")?,
        TemplateAtom::Capture { name, .. } => write!(f, "${name}")?,
        TemplateAtom::Target => f.write_str("$0")?,
    }
    match node.children.as_slice() {
        [] => Ok(()),
        [only] => {
            f.write_str("/")?;
            write_node(f, only)
        }
        many => {
            f.write_str("/(")?;
            write_forest(f, many)?;
            f.write_str(")")
        }
    }
}

fn is_bare(text: &str) -> bool {
    !text.is_empty()
        && !text.contains("->")
        && text
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-'))
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_forest(f, &self.roots)
    }
}
