//! # trellis-core
//!
//! Foundation crate for the Trellis temporal reasoning engine.
//! Defines the interval/world value types, rules, facts, thresholds,
//! config, errors, interning, and tracing setup.
//! The engine crate depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod tracing;
pub mod types;

// Re-export the most commonly used types at the crate root.
pub use config::{ConvergenceConfig, ConvergenceMode, ReasonerConfig, UpdateMode};
pub use errors::{TrellisError, TrellisErrorCode, TrellisResult};
pub use models::{
    Bound, Clause, ClauseKind, Comparator, Component, Fact, HeadTerm, InconsistentPair,
    InferredEdge, Quantifier, QuantifierType, Rule, RuleBuilder, RuleKind, Threshold, World,
};
pub use types::collections::{FxHashMap, FxHashSet};
pub use types::identifiers::{Label, NodeId};
