//! Recursive-descent parser for pattern and template notation.

use crate::error::CompileError;
use crate::program::MAX_PROGRAM_LEN;
use crate::template::{TemplateAtom, TemplateNode};

use super::ast::{Anchor, Axis, PatternNode, Step, ValueTest};
use super::lexer::{Token, TokenKind};

/// A predicate reference and the offset it appeared at.
pub(crate) type PredicateRef = (String, usize);

pub(crate) struct Parser<'t> {
    tokens: &'t [Token],
    index: usize,
    end: usize,
    max_bound: u32,
    predicates: Vec<PredicateRef>,
    closed_captures: Vec<String>,
}

const fn starts_element(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Word(_)
            | TokenKind::Quoted(_)
            | TokenKind::Dot
            | TokenKind::Predicate(_)
            | TokenKind::Reference(_)
            | TokenKind::LParen
    )
}

const fn axis_of(kind: &TokenKind) -> Option<Axis> {
    match kind {
        TokenKind::Slash => Some(Axis::Child),
        TokenKind::DoubleSlash => Some(Axis::Descendant),
        TokenKind::Comma => Some(Axis::NextSibling),
        TokenKind::Amp => Some(Axis::AnySibling),
        _ => None,
    }
}

const fn quantifier_of(kind: &TokenKind) -> Option<(u32, Option<u32>)> {
    match kind {
        TokenKind::Question => Some((0, Some(1))),
        TokenKind::Star => Some((0, None)),
        TokenKind::Plus => Some((1, None)),
        TokenKind::Braces { min, max } => Some((*min, *max)),
        _ => None,
    }
}

impl<'t> Parser<'t> {
    /// Creates a parser over `tokens` taken from text of length `end`.
    pub(crate) const fn new(tokens: &'t [Token], end: usize, max_bound: u32) -> Self {
        Self {
            tokens,
            index: 0,
            end,
            max_bound,
            predicates: Vec::new(),
            closed_captures: Vec::new(),
        }
    }

    /// Returns the predicate references seen so far.
    pub(crate) fn into_predicates(self) -> Vec<PredicateRef> {
        self.predicates
    }

    fn peek(&self) -> Option<&'t TokenKind> {
        self.tokens.get(self.index).map(|token| &token.kind)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.index).map_or(self.end, |token| token.position)
    }

    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        let found = self.peek() == Some(kind);
        if found {
            self.index += 1;
        }
        found
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), CompileError> {
        if self.eat(kind) {
            return Ok(());
        }
        Err(self.unexpected(&format!("expected {kind}")))
    }

    fn unexpected(&self, expected: &str) -> CompileError {
        let position = self.position();
        match self.peek() {
            Some(found) => CompileError::syntax(position, format!("{expected}, found {found}")),
            None => CompileError::syntax(position, format!("{expected}, found end of input")),
        }
    }

    /// Fails if any token is left unconsumed.
    pub(crate) fn finish(&self) -> Result<(), CompileError> {
        if self.peek().is_none() {
            return Ok(());
        }
        Err(self.unexpected("expected end of pattern"))
    }

    /// Parses a full search pattern, stopping before `->` or end of input.
    pub(crate) fn pattern(&mut self) -> Result<PatternNode, CompileError> {
        if self.eat(&TokenKind::DoubleSlash) {
            return self.alternation();
        }
        if !self.eat(&TokenKind::Slash) {
            return self.alternation();
        }
        let body = self.alternation()?;
        Ok(PatternNode::Sequence(vec![
            Step {
                axis: None,
                node: PatternNode::Anchor(Anchor::Root),
            },
            Step {
                axis: None,
                node: body,
            },
        ]))
    }

    fn alternation(&mut self) -> Result<PatternNode, CompileError> {
        let first = self.sequence()?;
        if self.peek() != Some(&TokenKind::Pipe) {
            return Ok(first);
        }
        let mut branches = vec![first];
        while self.eat(&TokenKind::Pipe) {
            branches.push(self.sequence()?);
        }
        Ok(PatternNode::Alternation(branches))
    }

    fn sequence(&mut self) -> Result<PatternNode, CompileError> {
        let first = self.element()?;
        let mut steps = vec![Step {
            axis: None,
            node: first,
        }];
        self.trailing_steps(&mut steps);

        while let Some(kind) = self.peek() {
            let axis = match axis_of(kind) {
                Some(axis) => {
                    self.index += 1;
                    axis
                }
                // Juxtaposed elements join on the child axis.
                None if starts_element(kind) => Axis::Child,
                None => break,
            };
            let node = self.element()?;
            steps.push(Step {
                axis: Some(axis),
                node,
            });
            self.trailing_steps(&mut steps);
        }

        match <[Step; 1]>::try_from(steps) {
            Ok([step]) => Ok(step.node),
            Err(many) => Ok(PatternNode::Sequence(many)),
        }
    }

    /// Collects the zero-width `$` and `>` steps that may follow an element.
    fn trailing_steps(&mut self, steps: &mut Vec<Step>) {
        loop {
            let node = if self.eat(&TokenKind::Dollar) {
                PatternNode::Anchor(Anchor::Leaf)
            } else if self.eat(&TokenKind::Up) {
                PatternNode::Parent
            } else {
                return;
            };
            steps.push(Step { axis: None, node });
        }
    }

    fn element(&mut self) -> Result<PatternNode, CompileError> {
        let next = self.tokens.get(self.index + 1).map(|token| &token.kind);
        if let (Some(TokenKind::Word(name)), Some(TokenKind::Colon)) = (self.peek(), next) {
            self.index += 2;
            let node = self.element()?;
            self.closed_captures.push(name.clone());
            return Ok(PatternNode::Capture {
                name: name.clone(),
                node: Box::new(node),
            });
        }
        let primary = self.primary()?;
        self.quantified(primary)
    }

    fn primary(&mut self) -> Result<PatternNode, CompileError> {
        let Some(kind) = self.peek().filter(|kind| starts_element(kind)) else {
            return Err(self.unexpected("expected a pattern element"));
        };
        let position = self.position();
        self.index += 1;
        let node = match kind {
            TokenKind::Word(text) | TokenKind::Quoted(text) => {
                PatternNode::Test(ValueTest::Literal(text.clone()))
            }
            TokenKind::Predicate(name) => {
                self.predicates.push((name.clone(), position));
                PatternNode::Test(ValueTest::Predicate(name.clone()))
            }
            TokenKind::Reference(name) => {
                if !self.closed_captures.contains(name) {
                    return Err(CompileError::UndefinedCapture {
                        name: name.clone(),
                        position,
                    });
                }
                PatternNode::Test(ValueTest::Reference(name.clone()))
            }
            TokenKind::LParen => {
                let inner = self.alternation()?;
                self.expect(&TokenKind::RParen)?;
                inner
            }
            _ => PatternNode::Test(ValueTest::Wildcard),
        };
        Ok(node)
    }

    fn quantified(&mut self, node: PatternNode) -> Result<PatternNode, CompileError> {
        let Some((min, max)) = self.peek().and_then(quantifier_of) else {
            return Ok(node);
        };
        let position = self.position();
        self.index += 1;
        let greedy = !self.eat(&TokenKind::Question);

        if let Some(upper) = max.filter(|upper| min > *upper) {
            return Err(CompileError::quantifier(
                position,
                format!("minimum {min} exceeds maximum {upper}"),
            ));
        }
        let bound = max.unwrap_or(min);
        if bound > self.max_bound {
            return Err(CompileError::quantifier(
                position,
                format!("bound {bound} exceeds the limit of {}", self.max_bound),
            ));
        }
        if max.is_none() && node.can_be_empty() {
            return Err(CompileError::quantifier(
                position,
                "unbounded repetition of a pattern that can match without consuming a node",
            ));
        }
        if self.peek().and_then(quantifier_of).is_some() {
            return Err(CompileError::syntax(self.position(), "quantifier follows a quantifier"));
        }

        let repetition = PatternNode::Repetition {
            node: Box::new(node),
            min,
            max,
            greedy,
        };
        if repetition.program_len() > MAX_PROGRAM_LEN {
            return Err(CompileError::quantifier(
                position,
                format!("repetition expands to more than {MAX_PROGRAM_LEN} instructions"),
            ));
        }
        Ok(repetition)
    }

    /// Parses a replacement template; empty input yields no nodes.
    pub(crate) fn template(&mut self) -> Result<Vec<TemplateNode>, CompileError> {
        if self.peek().is_none() {
            return Ok(Vec::new());
        }
        self.template_list()
    }

    fn template_list(&mut self) -> Result<Vec<TemplateNode>, CompileError> {
        let mut nodes = vec![self.template_node()?];
        while self.eat(&TokenKind::Comma) {
            nodes.push(self.template_node()?);
        }
        Ok(nodes)
    }

    fn template_node(&mut self) -> Result<TemplateNode, CompileError> {
        let position = self.position();
        let atom = match self.peek() {
            Some(TokenKind::Word(text) | TokenKind::Quoted(text)) => {
                TemplateAtom::Literal(text.clone())
            }
            Some(TokenKind::Reference(name)) if name == "0" => TemplateAtom::Target,
            Some(TokenKind::Reference(name)) => TemplateAtom::Capture {
                name: name.clone(),
                position,
            },
            _ => return Err(self.unexpected("expected a template node")),
        };
        self.index += 1;

        if !self.eat(&TokenKind::Slash) {
            return Ok(TemplateNode::new(atom, Vec::new()));
        }
        if !matches!(atom, TemplateAtom::Literal(_)) {
            return Err(CompileError::syntax(
                position,
                "a capture reference cannot have children",
            ));
        }
        let children = if self.eat(&TokenKind::LParen) {
            let list = self.template_list()?;
            self.expect(&TokenKind::RParen)?;
            list
        } else {
            vec![self.template_node()?]
        };
        Ok(TemplateNode::new(atom, children))
    }
}
