mod bound;
mod clause;
mod component;
mod fact;
mod ipl;
mod rule;
mod threshold;
mod world;

pub use bound::Bound;
pub use clause::{Clause, ClauseKind, Comparator, Comparison};
pub use component::Component;
pub use fact::{Fact, FactBuilder};
pub use ipl::InconsistentPair;
pub use rule::{HeadTerm, InferredEdge, Rule, RuleBuilder, RuleKind};
pub use threshold::{CountMode, CountScope, Quantifier, QuantifierType, Threshold};
pub use world::{World, WorldUpdate};
