//! The backtracking machine that executes a [`Program`] from one start node.
//!
//! Choice points live on an explicit stack, so neither deep trees nor long
//! repetitions grow the call stack. A machine is resumable: after reporting
//! a solution it can be asked for the next one, which continues from the
//! most recent choice point.

use std::rc::Rc;

use treepace_core::{Literal, TreeNode, same_structure};

use crate::pattern::{Anchor, Axis, ValueTest};
use crate::predicates::Predicates;
use crate::program::{Instruction, Program};

/// Persistent list of consumed nodes, newest first. Threads that share a
/// prefix share its entries.
struct Consumed<N> {
    node: N,
    pc: usize,
    previous: Option<Rc<Consumed<N>>>,
}

type Log<N> = Option<Rc<Consumed<N>>>;

fn entries<N>(log: &Log<N>) -> impl Iterator<Item = &Consumed<N>> {
    std::iter::successors(log.as_deref(), |entry| entry.previous.as_deref())
}

struct Thread<N> {
    pc: usize,
    context: Option<N>,
    log: Log<N>,
}

/// Candidate nodes along an axis, produced lazily in document order.
struct Candidates<N> {
    pending: Vec<N>,
    descend: bool,
}

impl<N: TreeNode> Candidates<N> {
    fn only(node: N) -> Self {
        Self {
            pending: vec![node],
            descend: false,
        }
    }

    fn along(axis: Axis, context: &N) -> Self {
        let reversed = |nodes: Vec<N>, descend| Self {
            pending: nodes.into_iter().rev().collect(),
            descend,
        };
        match axis {
            Axis::Child => reversed(context.children(), false),
            Axis::Descendant => reversed(context.children(), true),
            Axis::NextSibling => {
                let next = context.parent().zip(context.index()).and_then(
                    |(parent, index)| parent.child_at(index + 1),
                );
                reversed(next.into_iter().collect(), false)
            }
            Axis::AnySibling => {
                let siblings = context
                    .parent()
                    .map(|parent| parent.children())
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|sibling| !sibling.is_same(context))
                    .collect();
                reversed(siblings, false)
            }
        }
    }
}

impl<N: TreeNode> Iterator for Candidates<N> {
    type Item = N;

    fn next(&mut self) -> Option<N> {
        let node = self.pending.pop()?;
        if self.descend {
            self.pending.extend(node.children().into_iter().rev());
        }
        Some(node)
    }
}

enum Choice<N> {
    Branch(Thread<N>),
    Candidates {
        pc: usize,
        log: Log<N>,
        candidates: Candidates<N>,
    },
}

/// Executes a program for one start node.
pub(super) struct Machine<'m, N: TreeNode> {
    program: &'m Program,
    predicates: &'m Predicates<N::Value>,
    scan_root: N,
    start: N,
    choices: Vec<Choice<N>>,
}

impl<'m, N> Machine<'m, N>
where
    N: TreeNode,
    N::Value: Literal,
{
    pub(super) fn new(
        program: &'m Program,
        predicates: &'m Predicates<N::Value>,
        scan_root: N,
        start: N,
    ) -> Self {
        let initial = Thread {
            pc: 0,
            context: None,
            log: None,
        };
        Self {
            program,
            predicates,
            scan_root,
            start,
            choices: vec![Choice::Branch(initial)],
        }
    }

    /// Runs until the next solution that consumed at least one node.
    ///
    /// Returns the consumed nodes, oldest first, paired with the program
    /// counter of the `FIND` that consumed each one.
    pub(super) fn next_solution(&mut self) -> Option<Vec<(N, usize)>> {
        let program = self.program;
        let mut thread = self.resume()?;
        loop {
            let Some(instruction) = program.instruction(thread.pc) else {
                thread = self.resume()?;
                continue;
            };
            match instruction {
                Instruction::Find { axis, .. } => {
                    let candidates = match &thread.context {
                        Some(context) => Candidates::along(*axis, context),
                        None => Candidates::only(self.start.clone()),
                    };
                    self.choices.push(Choice::Candidates {
                        pc: thread.pc,
                        log: thread.log,
                        candidates,
                    });
                    thread = self.resume()?;
                }
                Instruction::Parent => {
                    match thread.context.as_ref().and_then(TreeNode::parent) {
                        Some(parent) => {
                            thread.context = Some(parent);
                            thread.pc += 1;
                        }
                        None => thread = self.resume()?,
                    }
                }
                Instruction::Assert(anchor) => {
                    if self.holds(*anchor, thread.context.as_ref()) {
                        thread.pc += 1;
                    } else {
                        thread = self.resume()?;
                    }
                }
                Instruction::Split { primary, secondary } => {
                    self.choices.push(Choice::Branch(Thread {
                        pc: *secondary,
                        context: thread.context.clone(),
                        log: thread.log.clone(),
                    }));
                    thread.pc = *primary;
                }
                Instruction::Jump(target) => thread.pc = *target,
                Instruction::Match => {
                    if thread.log.is_some() {
                        return Some(Self::collect(&thread.log));
                    }
                    thread = self.resume()?;
                }
            }
        }
    }

    /// Pops choice points until one yields a thread to continue.
    fn resume(&mut self) -> Option<Thread<N>> {
        let program = self.program;
        while let Some(choice) = self.choices.pop() {
            let (pc, log, mut candidates) = match choice {
                Choice::Branch(thread) => return Some(thread),
                Choice::Candidates { pc, log, candidates } => (pc, log, candidates),
            };
            let Some(Instruction::Find { test, .. }) = program.instruction(pc) else {
                continue;
            };
            let found = candidates.find(|candidate| {
                self.accepts(test, candidate, &log)
                    && !entries(&log).any(|entry| entry.node.is_same(candidate))
            });
            if let Some(node) = found {
                let thread = Thread {
                    pc: pc + 1,
                    context: Some(node.clone()),
                    log: Some(Rc::new(Consumed {
                        node,
                        pc,
                        previous: log.clone(),
                    })),
                };
                self.choices.push(Choice::Candidates { pc, log, candidates });
                return Some(thread);
            }
        }
        None
    }

    fn accepts(&self, test: &ValueTest, node: &N, log: &Log<N>) -> bool {
        match test {
            ValueTest::Wildcard => true,
            ValueTest::Literal(text) => node.with_value(|value| value.matches_literal(text)),
            ValueTest::Predicate(name) => self.predicates.evaluate(name, node),
            ValueTest::Reference(name) => self
                .bound(name, log)
                .is_some_and(|bound| same_structure(bound, node)),
        }
    }

    /// Returns the node most recently recorded in the capture `name`.
    fn bound<'l>(&self, name: &str, log: &'l Log<N>) -> Option<&'l N> {
        let slot = self.program.slot(name)?;
        entries(log)
            .find(|entry| self.program.slots_at(entry.pc).contains(&slot))
            .map(|entry| &entry.node)
    }

    fn holds(&self, anchor: Anchor, context: Option<&N>) -> bool {
        match anchor {
            Anchor::Root => self.start.is_same(&self.scan_root),
            Anchor::Leaf => context.is_some_and(|node| node.child_count() == 0),
        }
    }

    fn collect(log: &Log<N>) -> Vec<(N, usize)> {
        let mut consumed: Vec<_> = entries(log)
            .map(|entry| (entry.node.clone(), entry.pc))
            .collect();
        consumed.reverse();
        consumed
    }
}
