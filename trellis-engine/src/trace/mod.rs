//! Rule trace: the explanation log of every recorded bound change.

mod export;

pub use export::TraceRow;

use serde::Serialize;

use trellis_core::{Bound, Component, Label};

/// What produced a trace entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CauseKind {
    Fact,
    Rule,
    /// Propagation to an inconsistent-predicate partner.
    Ipl,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceEntry {
    /// Timestep the change was applied to.
    pub time: u64,
    /// Timestep the cause read from (`time - delta` for rules).
    pub cause_time: u64,
    /// Inner fixpoint pass within `time`.
    pub pass: u64,
    pub component: Component,
    pub label: Label,
    pub old_bound: Bound,
    pub new_bound: Bound,
    /// Fact or rule name.
    pub cause: String,
    pub cause_kind: CauseKind,
    pub consistent: bool,
    pub message: Option<String>,
    /// Per-clause groundings, filled when atom tracing is on.
    pub groundings: Vec<Vec<Component>>,
}

#[derive(Debug, Clone, Default)]
pub struct RuleTrace {
    entries: Vec<TraceEntry>,
    max_clauses: usize,
}

impl RuleTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, entry: TraceEntry) {
        self.entries.push(entry);
    }

    /// Widen the clause columns to at least `count`.
    pub(crate) fn reserve_clauses(&mut self, count: usize) {
        self.max_clauses = self.max_clauses.max(count);
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.max_clauses = 0;
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of `Clause-n` columns in exported rows.
    pub fn max_clauses(&self) -> usize {
        self.max_clauses
    }

    pub fn node_entries(&self) -> impl Iterator<Item = &TraceEntry> {
        self.entries.iter().filter(|e| e.component.is_node())
    }

    pub fn edge_entries(&self) -> impl Iterator<Item = &TraceEntry> {
        self.entries.iter().filter(|e| e.component.is_edge())
    }

    /// Entries flagged inconsistent.
    pub fn inconsistencies(&self) -> impl Iterator<Item = &TraceEntry> {
        self.entries.iter().filter(|e| !e.consistent)
    }

    pub fn entries_for(&self, component: Component, label: Label) -> impl Iterator<Item = &TraceEntry> {
        self.entries
            .iter()
            .filter(move |e| e.component == component && e.label == label)
    }
}
