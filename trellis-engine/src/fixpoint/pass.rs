//! One inner fixpoint pass: ground every eligible rule, then commit.
//!
//! Grounding never sees writes from the pass it belongs to. Proposals are
//! collected in rule order (rayon's indexed collect keeps that order in
//! parallel mode) and committed one by one afterwards, so both modes produce
//! the same interpretation and the same trace.

use rayon::prelude::*;
use tracing::trace;

use trellis_core::{Component, Rule, TrellisResult, UpdateMode};

use crate::consistency::{Cause, CommitStats, Committer, Write};
use crate::grounding::{ground_rule, GroundingContext, Proposal};
use crate::graph::Graph;
use crate::trace::CauseKind;

use super::{Inputs, RunState};

/// Rules that run in `pass` of timestep `time`.
fn eligible(rule: &Rule, time: u64, pass: u64) -> bool {
    rule.delta <= time && (pass == 0 || rule.immediate)
}

pub(super) fn ground_pass(
    inputs: &Inputs<'_>,
    graph: &Graph,
    state: &RunState,
    time: u64,
    pass: u64,
) -> Vec<Proposal> {
    let rules: Vec<(usize, &Rule)> = inputs
        .rules
        .iter()
        .enumerate()
        .filter(|(_, rule)| eligible(rule, time, pass))
        .collect();
    let ground = |&(index, rule): &(usize, &Rule)| -> Vec<Proposal> {
        let source_time = time - rule.delta;
        let Some(source) = state.interpretation.snapshot(source_time) else {
            return Vec::new();
        };
        let ctx = GroundingContext {
            graph,
            source,
            registry: inputs.registry,
            source_time,
            allow_ground_rules: inputs.config.allow_ground_rules,
            atom_trace: inputs.config.atom_trace,
            parallel: inputs.config.parallel_computing,
        };
        ground_rule(index, rule, &ctx)
    };
    let grouped: Vec<Vec<Proposal>> = if inputs.config.parallel_computing {
        rules.par_iter().map(ground).collect()
    } else {
        rules.iter().map(ground).collect()
    };
    let proposals: Vec<Proposal> = grouped.into_iter().flatten().collect();
    trace!(time, pass, rules = rules.len(), proposals = proposals.len(), "pass grounded");
    proposals
}

pub(super) fn commit_proposals(
    inputs: &Inputs<'_>,
    graph: &mut Graph,
    state: &mut RunState,
    proposals: Vec<Proposal>,
    time: u64,
    pass: u64,
) -> TrellisResult<CommitStats> {
    let mut stats = CommitStats::default();
    let RunState {
        interpretation,
        trace,
        forced,
        ..
    } = state;
    let Some(snapshot) = interpretation.snapshot_mut(time) else {
        return Ok(stats);
    };
    let mut committer = Committer {
        config: inputs.config,
        ipl: inputs.ipl,
        trace,
        forced,
        time,
        pass,
    };
    for proposal in proposals {
        let rule = &inputs.rules[proposal.rule_index];
        if proposal.creates_edge {
            if let Component::Edge(source, target) = proposal.component {
                graph.insert_inferred_edge(source, target);
                let world = snapshot.world_mut(proposal.component);
                if let Some(label) = rule.inferred_edge.as_ref().and_then(|e| e.label) {
                    world.insert_scope(label);
                }
            }
        }
        let cause = Cause {
            name: &rule.name,
            kind: CauseKind::Rule,
            time: proposal.source_time,
            groundings: proposal.groundings,
            traced: true,
        };
        let write = Write {
            component: proposal.component,
            label: proposal.label,
            bound: proposal.bound,
            mode: UpdateMode::Intersection,
            make_static: rule.is_static,
        };
        stats.absorb(committer.commit(snapshot, write, &cause)?);
    }
    Ok(stats)
}
