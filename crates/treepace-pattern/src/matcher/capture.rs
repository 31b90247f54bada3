//! Match results and captured values.
//!
//! Captures bind names to the nodes consumed inside the captured
//! sub-pattern.

use std::collections::BTreeMap;

use treepace_core::TreeNode;

use crate::program::{CaptureKind, Program};

/// Nodes bound to a capture name.
#[derive(Debug, Clone)]
pub enum CapturedValue<N> {
    /// A capture that binds exactly one node.
    Single(N),
    /// A capture inside a repetition, around a multi-node sub-pattern, or
    /// declared more than once.
    Multiple(Vec<N>),
}

impl<N> CapturedValue<N> {
    /// Returns the bound nodes in consumption order.
    #[must_use]
    pub fn nodes(&self) -> &[N] {
        match self {
            Self::Single(node) => std::slice::from_ref(node),
            Self::Multiple(nodes) => nodes,
        }
    }

    /// Returns the capture as a single node, if applicable.
    #[must_use]
    pub const fn as_single(&self) -> Option<&N> {
        match self {
            Self::Single(node) => Some(node),
            Self::Multiple(_) => None,
        }
    }

    /// Returns the capture as a node sequence, if applicable.
    #[must_use]
    pub fn as_multiple(&self) -> Option<&[N]> {
        match self {
            Self::Multiple(nodes) => Some(nodes),
            Self::Single(_) => None,
        }
    }
}

/// One match of a pattern against a tree.
///
/// The target is the last node the pattern consumed; it is the root of the
/// region a replacement substitutes.
#[derive(Debug, Clone)]
pub struct Match<N> {
    start: N,
    target: N,
    consumed: Vec<N>,
    captures: BTreeMap<String, CapturedValue<N>>,
}

impl<N: TreeNode> Match<N> {
    /// Builds a match from the consumed nodes and the `FIND` instruction
    /// that consumed each one, in consumption order.
    ///
    /// Returns `None` when nothing was consumed.
    pub(crate) fn from_consumed(program: &Program, consumed: Vec<(N, usize)>) -> Option<Self> {
        let start = consumed.first()?.0.clone();
        let target = consumed.last()?.0.clone();

        let mut bound: Vec<Vec<N>> = vec![Vec::new(); program.captures().len()];
        for (node, pc) in &consumed {
            for slot in program.slots_at(*pc) {
                if let Some(nodes) = bound.get_mut(*slot) {
                    nodes.push(node.clone());
                }
            }
        }

        let captures = program
            .captures()
            .iter()
            .zip(bound)
            .filter(|(_, nodes)| !nodes.is_empty())
            .map(|(slot, mut nodes)| {
                let value = match (slot.kind(), nodes.len()) {
                    (CaptureKind::Single, 1) => match nodes.pop() {
                        Some(node) => CapturedValue::Single(node),
                        None => CapturedValue::Multiple(nodes),
                    },
                    _ => CapturedValue::Multiple(nodes),
                };
                (slot.name().to_owned(), value)
            })
            .collect();

        Some(Self {
            start,
            target,
            consumed: consumed.into_iter().map(|(node, _)| node).collect(),
            captures,
        })
    }

    /// Returns the node the match started at.
    #[must_use]
    pub const fn start(&self) -> &N {
        &self.start
    }

    /// Returns the root of the matched region.
    #[must_use]
    pub const fn target(&self) -> &N {
        &self.target
    }

    /// Returns every consumed node in consumption order.
    #[must_use]
    pub fn consumed(&self) -> &[N] {
        &self.consumed
    }

    /// Returns the captures keyed by name.
    #[must_use]
    pub const fn captures(&self) -> &BTreeMap<String, CapturedValue<N>> {
        &self.captures
    }

    /// Returns the value bound to `name`, if the match bound it.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CapturedValue<N>> {
        self.captures.get(name)
    }

    /// Returns the nodes bound to `name`; empty when unbound.
    #[must_use]
    pub fn nodes(&self, name: &str) -> &[N] {
        self.captures
            .get(name)
            .map(CapturedValue::nodes)
            .unwrap_or_default()
    }
}
