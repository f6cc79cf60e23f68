//! Rule grounding against the graph and a source snapshot.
//!
//! Grounding runs in two phases. The join (phase A) walks the clauses in
//! order and narrows every variable's groundings. Head evaluation (phase B)
//! then enumerates head groundings and re-tests each clause threshold
//! restricted to that head, producing one [`Proposal`] per passing head.

mod heads;
mod join;

use rayon::prelude::*;
use smallvec::SmallVec;
use tracing::trace;

use trellis_core::{Bound, Component, HeadTerm, Label, Rule};

use crate::functions::FunctionRegistry;
use crate::graph::Graph;
use crate::interpretation::Snapshot;

use heads::{head_groundings, support_for, HeadGrounding};
use join::{JoinState, Var};

/// Read-only inputs for grounding one rule.
#[derive(Clone, Copy)]
pub(crate) struct GroundingContext<'a> {
    pub graph: &'a Graph,
    pub source: &'a Snapshot,
    pub registry: &'a FunctionRegistry,
    pub source_time: u64,
    pub allow_ground_rules: bool,
    pub atom_trace: bool,
    pub parallel: bool,
}

/// A bound a rule wants to commit.
#[derive(Debug, Clone)]
pub(crate) struct Proposal {
    pub rule_index: usize,
    pub component: Component,
    pub label: Label,
    pub bound: Bound,
    pub source_time: u64,
    /// The target edge does not exist yet and must be created on commit.
    pub creates_edge: bool,
    pub groundings: Vec<Vec<Component>>,
}

/// Ground `rule` and return its proposals in head order.
pub(crate) fn ground_rule(rule_index: usize, rule: &Rule, ctx: &GroundingContext<'_>) -> Vec<Proposal> {
    let mut join = JoinState::new(rule, ctx.graph, ctx.allow_ground_rules);
    let head_vars: SmallVec<[Var; 2]> = rule
        .head
        .iter()
        .filter_map(|term| match term {
            HeadTerm::Variable(name) => join.var(name),
            HeadTerm::Function { .. } => None,
        })
        .collect();
    if !join.run(rule, ctx.graph, ctx.source, &head_vars) {
        return Vec::new();
    }

    let heads = head_groundings(rule, &join, ctx);
    trace!(rule = %rule.name, heads = heads.len(), "head groundings");
    let propose = |head: &HeadGrounding| -> Option<Proposal> {
        let support = support_for(rule, &join, head, ctx)?;
        Some(Proposal {
            rule_index,
            component: head.component,
            label: rule.target,
            bound: head_bound(rule, &support.annotations, ctx.registry),
            source_time: ctx.source_time,
            creates_edge: head.creates_edge,
            groundings: support.groundings,
        })
    };
    if ctx.parallel {
        heads.par_iter().filter_map(propose).collect()
    } else {
        heads.iter().filter_map(propose).collect()
    }
}

fn head_bound(rule: &Rule, annotations: &[Vec<Bound>], registry: &FunctionRegistry) -> Bound {
    let Some(function) = rule
        .annotation_function
        .as_deref()
        .and_then(|name| registry.annotation(name))
    else {
        return rule.head_bound;
    };
    let lists: Vec<&[Bound]> = annotations.iter().map(Vec::as_slice).collect();
    let (lower, upper) = function(&lists, &rule.weights);
    Bound::clamped(lower, upper)
}
