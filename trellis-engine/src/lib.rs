//! # trellis-engine
//!
//! Temporal, interval-valued forward reasoning over a directed graph.
//!
//! Facts and rules assign each node and edge a bound `[l, u] ⊆ [0, 1]` per
//! label. The engine grounds rules against graph neighbourhoods, tightens
//! bounds by intersection, resolves contradictions, and steps through
//! discrete timesteps until a fixpoint or a requested horizon.
//!
//! Entry point is [`Reasoner`].

mod channel;
mod consistency;
mod facts;
mod fixpoint;
mod grounding;
mod reasoner;

pub mod functions;
pub mod graph;
pub mod interpretation;
pub mod trace;

pub use fixpoint::ReasonSummary;
pub use functions::{AnnotationFn, FunctionRegistry, HeadFn};
pub use graph::Graph;
pub use interpretation::{AtomChange, FilterRow, Interpretation, Snapshot, SnapshotDiff};
pub use reasoner::{LoadReport, Reasoner, Timesteps};
pub use trace::{CauseKind, RuleTrace, TraceEntry, TraceRow};
