//! Timestep driver.
//!
//! For each timestep: open the snapshot, apply due facts, then run inner
//! passes until a pass changes nothing (or the convergence predicate holds
//! for that pass). Delayed rules only take part in the first pass of a
//! timestep since their source snapshot is already frozen.

mod pass;

use serde::Serialize;
use tracing::{debug, info, warn};

use trellis_core::constants::GRAPH_ATTRIBUTE_FACT;
use trellis_core::{Fact, InconsistentPair, ReasonerConfig, Rule, TrellisResult};

use crate::channel::FactChannel;
use crate::consistency::{Cause, CommitStats, Committer, ForcedWrites, Write};
use crate::facts::FactSchedule;
use crate::functions::FunctionRegistry;
use crate::graph::Graph;
use crate::interpretation::{Interpretation, Snapshot, SnapshotDiff};
use crate::trace::{CauseKind, RuleTrace};

/// Outcome of one `reason` / `reason_again` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ReasonSummary {
    /// Timesteps computed by this call.
    pub timesteps: u64,
    /// Inner passes run by this call.
    pub passes: u64,
    /// Bound changes committed by this call.
    pub changes: usize,
    /// The last timesteps met the convergence predicate with no fact pending.
    pub converged: bool,
    pub inconsistencies: usize,
    /// Last completed timestep.
    pub last_time: Option<u64>,
}

/// Inputs that stay fixed during a run.
pub(crate) struct Inputs<'a> {
    pub config: &'a ReasonerConfig,
    pub rules: &'a [Rule],
    pub registry: &'a FunctionRegistry,
    pub ipl: &'a [InconsistentPair],
    pub channel: &'a FactChannel,
}

/// Everything a run mutates.
#[derive(Debug, Default)]
pub(crate) struct RunState {
    pub interpretation: Interpretation,
    pub trace: RuleTrace,
    pub schedule: FactSchedule,
    /// Forced writes of the timestep being computed.
    pub forced: ForcedWrites,
    pub last_time: Option<u64>,
    pub passes: u64,
}

impl RunState {
    pub fn clear(&mut self) {
        self.interpretation.clear();
        self.trace.clear();
        self.schedule.clear();
        self.forced.clear();
        self.last_time = None;
        self.passes = 0;
    }

    /// Schedule a fact for a run resuming at `resume`. Dynamic facts whose
    /// window already closed are dropped.
    pub fn schedule_from(&mut self, fact: Fact, resume: u64) -> bool {
        if !fact.is_static && fact.end < resume {
            warn!(fact = %fact.name, end = fact.end, resume, "fact window ended before resume point; dropped");
            return false;
        }
        self.schedule.push(fact);
        true
    }
}

/// Run timesteps `start..=end`, or until convergence when `end` is `None`.
pub(crate) fn run(
    inputs: &Inputs<'_>,
    graph: &mut Graph,
    state: &mut RunState,
    start: u64,
    end: Option<u64>,
) -> TrellisResult<ReasonSummary> {
    let persistent = inputs.config.effective_persistent();
    let max_delta = inputs.rules.iter().map(|r| r.delta).max().unwrap_or(0);
    let required = max_delta.max(1);
    let has_immediate = inputs.rules.iter().any(|r| r.immediate);
    let width = inputs.rules.iter().map(Rule::clause_count).max().unwrap_or(0);
    state.trace.reserve_clauses(width);

    info!(
        start,
        end = ?end,
        rules = inputs.rules.len(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        parallel = inputs.config.parallel_computing,
        "reasoning started"
    );

    let mut summary = ReasonSummary::default();
    let mut streak = 0;
    let mut time = start;
    loop {
        if end.is_some_and(|end| time > end) {
            break;
        }
        for fact in inputs.channel.drain() {
            state.schedule_from(fact, time);
        }
        state.interpretation.begin_timestep(time, graph, persistent);
        state.forced.clear();

        let mut step = apply_facts(inputs, state, time)?;
        let mut pass = 0;
        loop {
            let proposals = pass::ground_pass(inputs, graph, state, time, pass);
            let stats = pass::commit_proposals(inputs, graph, state, proposals, time, pass)?;
            step.absorb(stats);
            state.passes += 1;
            summary.passes += 1;
            if stats.changes == 0
                || inputs.config.convergence.is_converged(stats.changes, stats.max_delta)
                || !has_immediate
            {
                break;
            }
            pass += 1;
        }

        summary.timesteps += 1;
        summary.changes += step.changes;
        summary.inconsistencies += step.inconsistencies;
        summary.last_time = Some(time);
        state.last_time = Some(time);

        let diff = timestep_diff(&state.interpretation, time);
        streak = if inputs.config.convergence.is_converged(diff.changed, diff.max_delta) {
            streak + 1
        } else {
            0
        };
        debug!(
            time,
            passes = pass + 1,
            changes = step.changes,
            changed_atoms = diff.changed,
            max_delta = diff.max_delta,
            "timestep complete"
        );

        let settled = streak >= required && !state.schedule.has_pending() && inputs.channel.is_empty();
        summary.converged = settled;
        if end.is_none() && settled {
            break;
        }
        time += 1;
    }

    info!(
        timesteps = summary.timesteps,
        passes = summary.passes,
        changes = summary.changes,
        inconsistencies = summary.inconsistencies,
        converged = summary.converged,
        "reasoning finished"
    );
    Ok(summary)
}

fn apply_facts(inputs: &Inputs<'_>, state: &mut RunState, time: u64) -> TrellisResult<CommitStats> {
    let mut stats = CommitStats::default();
    let due = state.schedule.due(time);
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
        pass: 0,
    };
    for fact in &due {
        if !snapshot.contains(&fact.component) {
            debug!(fact = %fact.name, component = %fact.component, "fact component not in graph; skipped");
            continue;
        }
        let graph_attribute = fact.name == GRAPH_ATTRIBUTE_FACT;
        let cause = Cause {
            name: &fact.name,
            kind: CauseKind::Fact,
            time,
            groundings: Vec::new(),
            traced: !graph_attribute || inputs.config.save_graph_attributes_to_trace,
        };
        let write = Write {
            component: fact.component,
            label: fact.label,
            bound: fact.bound,
            mode: inputs.config.update_mode,
            make_static: fact.is_static,
        };
        stats.absorb(committer.commit(snapshot, write, &cause)?);
    }
    Ok(stats)
}

fn timestep_diff(interpretation: &Interpretation, time: u64) -> SnapshotDiff {
    let empty = Snapshot::new();
    let previous = time
        .checked_sub(1)
        .and_then(|t| interpretation.snapshot(t))
        .unwrap_or(&empty);
    interpretation
        .snapshot(time)
        .map(|current| current.diff(previous))
        .unwrap_or_default()
}
