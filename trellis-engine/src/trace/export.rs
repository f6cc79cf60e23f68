//! Flat, string-valued rows for tabular export.

use serde::Serialize;

use trellis_core::TrellisResult;

use super::{CauseKind, RuleTrace, TraceEntry};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceRow {
    pub time: u64,
    pub cause_time: u64,
    pub pass: u64,
    pub component: String,
    pub label: String,
    pub old_bound: String,
    pub new_bound: String,
    pub cause: String,
    pub cause_kind: CauseKind,
    pub consistent: bool,
    pub message: String,
    /// `Clause-1..n`; empty strings pad rules with fewer clauses.
    pub clauses: Vec<String>,
}

impl TraceRow {
    fn from_entry(entry: &TraceEntry, width: usize) -> Self {
        let mut clauses: Vec<String> = entry
            .groundings
            .iter()
            .map(|items| {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                format!("[{}]", parts.join(", "))
            })
            .collect();
        clauses.resize(width.max(clauses.len()), String::new());
        Self {
            time: entry.time,
            cause_time: entry.cause_time,
            pass: entry.pass,
            component: entry.component.to_string(),
            label: entry.label.to_string(),
            old_bound: entry.old_bound.to_string(),
            new_bound: entry.new_bound.to_string(),
            cause: entry.cause.clone(),
            cause_kind: entry.cause_kind,
            consistent: entry.consistent,
            message: entry.message.clone().unwrap_or_default(),
            clauses,
        }
    }
}

impl RuleTrace {
    /// Header names matching [`TraceRow`] field order.
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = [
            "Time",
            "Cause Time",
            "Pass",
            "Component",
            "Label",
            "Old Bound",
            "New Bound",
            "Cause",
            "Cause Kind",
            "Consistent",
            "Message",
        ]
        .iter()
        .map(|c| c.to_string())
        .collect();
        columns.extend((1..=self.max_clauses()).map(|i| format!("Clause-{i}")));
        columns
    }

    pub fn rows(&self) -> Vec<TraceRow> {
        let width = self.max_clauses();
        self.entries()
            .iter()
            .map(|e| TraceRow::from_entry(e, width))
            .collect()
    }

    pub fn node_rows(&self) -> Vec<TraceRow> {
        let width = self.max_clauses();
        self.node_entries()
            .map(|e| TraceRow::from_entry(e, width))
            .collect()
    }

    pub fn edge_rows(&self) -> Vec<TraceRow> {
        let width = self.max_clauses();
        self.edge_entries()
            .map(|e| TraceRow::from_entry(e, width))
            .collect()
    }

    pub fn to_json(&self) -> TrellisResult<String> {
        Ok(serde_json::to_string_pretty(&self.rows())?)
    }
}
