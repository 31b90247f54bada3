//! Text formats for loading and saving trees.
//!
//! Two formats are supported:
//!
//! - **Parenthesised** text: `root (item1 (sub) item2)`. Each value is a bare
//!   word or a double-quoted string; a parenthesised list after a value holds
//!   its children.
//! - **Indented** text: one value per line, children indented deeper than
//!   their parent. A line starting with `"` holds one quoted value; any other
//!   line is taken verbatim after trimming.
//!
//! Both writers quote values that would not survive a reload as bare text.
//! Inside quotes, `\"` and `\\` stand for themselves and `\n` and `\r` for
//! line breaks.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::FormatError;
use crate::node::TreeNode;
use crate::value::Literal;

const INDENT: &str = "    ";

/// Supported tree text formats.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TextFormat {
    /// Parenthesised single-line text.
    #[default]
    Paren,
    /// One node per line, nesting expressed by indentation.
    Indented,
}

impl TextFormat {
    /// Parses `text` into a new unattached tree.
    ///
    /// # Errors
    ///
    /// Returns a [`FormatError`] if the text is empty, malformed, or holds
    /// more than one root node.
    pub fn load<N>(self, text: &str) -> Result<N, FormatError>
    where
        N: TreeNode,
        N::Value: Literal,
    {
        match self {
            Self::Paren => load_paren(text),
            Self::Indented => load_indented(text),
        }
    }

    /// Renders the subtree rooted at `node`.
    #[must_use]
    pub fn save<N>(self, node: &N) -> String
    where
        N: TreeNode,
        N::Value: fmt::Display,
    {
        match self {
            Self::Paren => save_paren(node),
            Self::Indented => save_indented(node),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    Value(String),
}

fn tokenize(text: &str) -> Result<Vec<(usize, Token)>, FormatError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        match ch {
            c if c.is_whitespace() => {}
            '(' => tokens.push((offset, Token::Open)),
            ')' => tokens.push((offset, Token::Close)),
            '"' => {
                let mut value = String::new();
                let mut closed = false;
                while let Some((_, c)) = chars.next() {
                    match c {
                        '"' => {
                            closed = true;
                            break;
                        }
                        '\\' => {
                            if let Some((_, escaped)) = chars.next() {
                                value.push(unescape(escaped));
                            }
                        }
                        other => value.push(other),
                    }
                }
                if !closed {
                    return Err(FormatError::UnterminatedString { position: offset });
                }
                tokens.push((offset, Token::Value(value)));
            }
            first => {
                let mut value = String::from(first);
                while let Some((_, c)) = chars.peek().copied() {
                    if c.is_whitespace() || matches!(c, '(' | ')' | '"') {
                        break;
                    }
                    value.push(c);
                    chars.next();
                }
                tokens.push((offset, Token::Value(value)));
            }
        }
    }

    Ok(tokens)
}

fn load_paren<N>(text: &str) -> Result<N, FormatError>
where
    N: TreeNode,
    N::Value: Literal,
{
    let mut open: Vec<(usize, N)> = Vec::new();
    let mut last: Option<N> = None;
    let mut root: Option<N> = None;

    for (position, token) in tokenize(text)? {
        match token {
            Token::Value(value) => {
                let node = N::create(N::Value::from_literal(&value));
                if let Some((_, parent)) = open.last() {
                    parent.push_child(node.clone());
                } else if root.is_some() {
                    return Err(FormatError::MultipleRoots { position });
                } else {
                    root = Some(node.clone());
                }
                last = Some(node);
            }
            Token::Open => {
                let node = last
                    .take()
                    .ok_or_else(|| FormatError::unexpected(position, "'('"))?;
                open.push((position, node));
            }
            Token::Close => {
                open.pop()
                    .ok_or_else(|| FormatError::unexpected(position, "')'"))?;
                last = None;
            }
        }
    }

    if let Some((position, _)) = open.pop() {
        return Err(FormatError::Unclosed { position });
    }
    root.ok_or(FormatError::Empty)
}

fn load_indented<N>(text: &str) -> Result<N, FormatError>
where
    N: TreeNode,
    N::Value: Literal,
{
    let mut stack: Vec<(usize, N)> = Vec::new();
    let mut root: Option<N> = None;
    let mut line_start = 0;

    for line in text.split_inclusive('\n') {
        let position = line_start;
        line_start += line.len();

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let depth = line.len() - line.trim_start().len();

        while stack.last().is_some_and(|(width, _)| *width >= depth) {
            stack.pop();
        }

        let value = unquote_line(trimmed, position + depth)?;
        let node = N::create(N::Value::from_literal(&value));
        if let Some((_, parent)) = stack.last() {
            parent.push_child(node.clone());
        } else if root.is_some() {
            return Err(FormatError::MultipleRoots { position });
        } else {
            root = Some(node.clone());
        }
        stack.push((depth, node));
    }

    root.ok_or(FormatError::Empty)
}

const fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        'r' => '\r',
        other => other,
    }
}

/// Decodes one trimmed indented line, which is either bare or fully quoted.
fn unquote_line(line: &str, position: usize) -> Result<String, FormatError> {
    let Some(body) = line.strip_prefix('"') else {
        return Ok(line.to_owned());
    };
    let mut value = String::new();
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                let rest = chars.as_str();
                if rest.is_empty() {
                    return Ok(value);
                }
                let offset = position + line.len() - rest.len();
                return Err(FormatError::unexpected(offset, "text after quoted value"));
            }
            '\\' => {
                if let Some(escaped) = chars.next() {
                    value.push(unescape(escaped));
                }
            }
            other => value.push(other),
        }
    }
    Err(FormatError::UnterminatedString { position })
}

fn needs_quotes(text: &str) -> bool {
    text.is_empty()
        || text
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '"' | '\\'))
}

fn write_value(out: &mut String, text: &str) {
    if !needs_quotes(text) {
        out.push_str(text);
        return;
    }
    out.push('"');
    for c in text.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            other => out.push(other),
        }
    }
    out.push('"');
}

enum Emit<N> {
    Node(N),
    Separator,
    Close,
}

fn save_paren<N>(node: &N) -> String
where
    N: TreeNode,
    N::Value: fmt::Display,
{
    let mut out = String::new();
    let mut pending = vec![Emit::Node(node.clone())];

    while let Some(item) = pending.pop() {
        match item {
            Emit::Separator => out.push(' '),
            Emit::Close => out.push(')'),
            Emit::Node(current) => {
                let text = current.with_value(ToString::to_string);
                write_value(&mut out, &text);
                let children = current.children();
                if children.is_empty() {
                    continue;
                }
                out.push_str(" (");
                pending.push(Emit::Close);
                for (index, child) in children.into_iter().enumerate().rev() {
                    pending.push(Emit::Node(child));
                    if index > 0 {
                        pending.push(Emit::Separator);
                    }
                }
            }
        }
    }

    out
}

fn save_indented<N>(node: &N) -> String
where
    N: TreeNode,
    N::Value: fmt::Display,
{
    let mut out = String::new();
    let mut pending = vec![(0_usize, node.clone())];

    while let Some((depth, current)) = pending.pop() {
        if !out.is_empty() {
            out.push('\n');
        }
        let text = current.with_value(ToString::to_string);
        out.push_str(&INDENT.repeat(depth));
        write_value(&mut out, &text);
        pending.extend(
            current
                .children()
                .into_iter()
                .rev()
                .map(|child| (depth + 1, child)),
        );
    }

    out
}
