//! Compiled instruction listing executed by the matcher.
//!
//! A pattern AST is lowered into a flat list of instructions:
//!
//! - `FIND axis test` consumes one node along `axis` whose value passes
//!   `test`. The first `FIND` a match executes always consumes the start
//!   node, whatever its axis.
//! - `ASSERT anchor` checks a zero-width constraint.
//! - `PARENT` moves to the parent of the last consumed node.
//! - `SPLIT a, b` continues at `a` and leaves `b` as a choice point.
//! - `JUMP a` continues at `a`.
//! - `MATCH` reports a solution.
//!
//! Bounded repetitions are unrolled; unbounded ones become a `SPLIT`/`JUMP`
//! loop. A repetition whose unrolled form would exceed [`MAX_PROGRAM_LEN`]
//! instructions is rejected at compile time.

use std::fmt;

use crate::pattern::{Anchor, Axis, PatternNode, ValueTest};

/// Largest instruction count a single repetition may unroll to.
pub const MAX_PROGRAM_LEN: usize = 65_536;

/// Whether a capture binds one node or a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureKind {
    /// The capture always binds exactly one node.
    Single,
    /// The capture may bind any number of nodes.
    Multiple,
}

/// A named capture slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSlot {
    name: String,
    kind: CaptureKind,
}

impl CaptureSlot {
    /// Returns the capture name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether the slot binds one node or many.
    #[must_use]
    pub const fn kind(&self) -> CaptureKind {
        self.kind
    }
}

/// One matcher instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Consume a node along `axis` that passes `test`, recording it in
    /// each capture slot listed in `slots`.
    Find {
        /// Axis relative to the last consumed node.
        axis: Axis,
        /// Test applied to the candidate's value.
        test: ValueTest,
        /// Capture slots the consumed node is recorded in.
        slots: Vec<usize>,
    },
    /// Check a zero-width constraint.
    Assert(Anchor),
    /// Move to the parent of the current node without consuming it.
    Parent,
    /// Continue at `primary`, keeping `secondary` as a choice point.
    Split {
        /// Preferred continuation.
        primary: usize,
        /// Continuation tried on backtrack.
        secondary: usize,
    },
    /// Continue at the given instruction.
    Jump(usize),
    /// Report a solution.
    Match,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Find { axis, test, slots } => {
                write!(f, "FIND {axis} {test}")?;
                for slot in slots {
                    write!(f, " @{slot}")?;
                }
                Ok(())
            }
            Self::Assert(anchor) => write!(f, "ASSERT {anchor}"),
            Self::Parent => f.write_str("PARENT"),
            Self::Split { primary, secondary } => write!(f, "SPLIT {primary}, {secondary}"),
            Self::Jump(target) => write!(f, "JUMP {target}"),
            Self::Match => f.write_str("MATCH"),
        }
    }
}

/// A compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    instructions: Vec<Instruction>,
    captures: Vec<CaptureSlot>,
}

impl Program {
    /// Lowers a pattern AST into instructions.
    #[must_use]
    pub fn compile(root: &PatternNode) -> Self {
        let mut compiler = Compiler::default();
        compiler.emit(root, Axis::Child);
        compiler.instructions.push(Instruction::Match);
        Self {
            instructions: compiler.instructions,
            captures: compiler.captures,
        }
    }

    /// Returns the instruction listing.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Returns the instruction at `pc`.
    #[must_use]
    pub fn instruction(&self, pc: usize) -> Option<&Instruction> {
        self.instructions.get(pc)
    }

    /// Returns the capture slots, indexed by slot number.
    #[must_use]
    pub fn captures(&self) -> &[CaptureSlot] {
        &self.captures
    }

    /// Returns the slot number of the capture called `name`.
    pub(crate) fn slot(&self, name: &str) -> Option<usize> {
        self.captures.iter().position(|capture| capture.name == name)
    }

    /// Returns the capture slots recorded by the `FIND` at `pc`.
    pub(crate) fn slots_at(&self, pc: usize) -> &[usize] {
        match self.instructions.get(pc) {
            Some(Instruction::Find { slots, .. }) => slots,
            _ => &[],
        }
    }

    /// Returns whether every match must start at the scan root.
    #[must_use]
    pub fn is_rooted(&self) -> bool {
        matches!(self.instructions.first(), Some(Instruction::Assert(Anchor::Root)))
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pc, instruction) in self.instructions.iter().enumerate() {
            if pc > 0 {
                writeln!(f)?;
            }
            write!(f, "{pc}: {instruction}")?;
        }
        Ok(())
    }
}

#[derive(Default)]
struct Compiler {
    instructions: Vec<Instruction>,
    captures: Vec<CaptureSlot>,
    active: Vec<usize>,
    repetition_depth: usize,
}

impl Compiler {
    fn emit(&mut self, node: &PatternNode, axis: Axis) {
        match node {
            PatternNode::Test(test) => self.instructions.push(Instruction::Find {
                axis,
                test: test.clone(),
                slots: self.active.clone(),
            }),
            PatternNode::Sequence(steps) => {
                for step in steps {
                    self.emit(&step.node, step.axis.unwrap_or(axis));
                }
            }
            PatternNode::Alternation(branches) => self.emit_alternation(branches, axis),
            PatternNode::Repetition {
                node: body,
                min,
                max,
                greedy,
            } => {
                self.repetition_depth += 1;
                self.emit_repetition(body, *min, *max, *greedy, axis);
                self.repetition_depth -= 1;
            }
            PatternNode::Capture { name, node: body } => {
                let slot = self.declare(name, body);
                self.active.push(slot);
                self.emit(body, axis);
                self.active.pop();
            }
            PatternNode::Anchor(anchor) => self.instructions.push(Instruction::Assert(*anchor)),
            PatternNode::Parent => self.instructions.push(Instruction::Parent),
        }
    }

    fn declare(&mut self, name: &str, body: &PatternNode) -> usize {
        if let Some(slot) = self.captures.iter().position(|capture| capture.name == name) {
            if let Some(existing) = self.captures.get_mut(slot) {
                existing.kind = CaptureKind::Multiple;
            }
            return slot;
        }
        let kind = if self.repetition_depth == 0 && body.consumes_exactly_one() {
            CaptureKind::Single
        } else {
            CaptureKind::Multiple
        };
        self.captures.push(CaptureSlot {
            name: name.to_owned(),
            kind,
        });
        self.captures.len() - 1
    }

    fn placeholder(&mut self) -> usize {
        self.instructions.push(Instruction::Jump(usize::MAX));
        self.instructions.len() - 1
    }

    fn patch(&mut self, at: usize, instruction: Instruction) {
        if let Some(slot) = self.instructions.get_mut(at) {
            *slot = instruction;
        }
    }

    fn split(&mut self, at: usize, taken: usize, skipped: usize, greedy: bool) {
        let (primary, secondary) = if greedy { (taken, skipped) } else { (skipped, taken) };
        self.patch(at, Instruction::Split { primary, secondary });
    }

    fn emit_alternation(&mut self, branches: &[PatternNode], axis: Axis) {
        let mut exits = Vec::new();
        let last = branches.len().saturating_sub(1);
        for (index, branch) in branches.iter().enumerate() {
            if index == last {
                self.emit(branch, axis);
                break;
            }
            let split = self.placeholder();
            self.emit(branch, axis);
            exits.push(self.placeholder());
            let next = self.instructions.len();
            self.split(split, split + 1, next, true);
        }
        let end = self.instructions.len();
        for exit in exits {
            self.patch(exit, Instruction::Jump(end));
        }
    }

    fn emit_repetition(
        &mut self,
        body: &PatternNode,
        min: u32,
        upper: Option<u32>,
        greedy: bool,
        axis: Axis,
    ) {
        for _ in 0..min {
            self.emit(body, axis);
        }
        let Some(max) = upper else {
            let head = self.placeholder();
            self.emit(body, axis);
            self.instructions.push(Instruction::Jump(head));
            let end = self.instructions.len();
            self.split(head, head + 1, end, greedy);
            return;
        };
        let mut optional = Vec::new();
        for _ in min..max {
            optional.push(self.placeholder());
            self.emit(body, axis);
        }
        let end = self.instructions.len();
        for split in optional {
            self.split(split, split + 1, end, greedy);
        }
    }
}
