//! The owning reasoning facade.
//!
//! A `Reasoner` holds the loaded graph, rules, facts, inconsistent
//! predicate pairs and function registry, plus the state of the last run.
//! Each `reason` call starts over from a fresh copy of the loaded graph;
//! `reason_again` continues the previous run in place.

use crossbeam_channel::Sender;
use tracing::{info, warn};

use trellis_core::models::FactBuilder;
use trellis_core::{
    Bound, Fact, InconsistentPair, NodeId, ReasonerConfig, Rule, RuleBuilder, TrellisError,
    TrellisResult,
};

use crate::channel::FactChannel;
use crate::fixpoint::{self, Inputs, ReasonSummary, RunState};
use crate::functions::FunctionRegistry;
use crate::graph::Graph;
use crate::interpretation::Interpretation;
use crate::trace::RuleTrace;

/// How many timesteps to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timesteps {
    /// `reason`: timesteps `0..=n`. `reason_again`: `n` more timesteps.
    Fixed(u64),
    /// Until the convergence predicate holds. No upper limit.
    UntilConvergence,
}

/// Result of a bulk load with `raise_errors = false`.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub accepted: usize,
    /// Index within the batch and the reason it was rejected.
    pub rejected: Vec<(usize, TrellisError)>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct Reasoner {
    config: ReasonerConfig,
    loaded_graph: Option<Graph>,
    /// Copy of the loaded graph that the current run mutates.
    graph: Option<Graph>,
    rules: Vec<Rule>,
    facts: Vec<Fact>,
    ipl: Vec<InconsistentPair>,
    registry: FunctionRegistry,
    channel: FactChannel,
    state: RunState,
}

impl Reasoner {
    pub fn new(config: ReasonerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &ReasonerConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ReasonerConfig {
        &mut self.config
    }

    pub fn load_graph(&mut self, graph: Graph) {
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "graph loaded"
        );
        self.loaded_graph = Some(graph);
        self.graph = None;
        self.state.clear();
    }

    /// The graph of the current run, or the loaded graph before any run.
    pub fn graph(&self) -> Option<&Graph> {
        self.graph.as_ref().or(self.loaded_graph.as_ref())
    }

    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Build and add a batch of rules. With `raise_errors` the first invalid
    /// rule fails the whole batch; otherwise invalid rules are reported and
    /// skipped.
    pub fn add_rules_bulk(
        &mut self,
        rules: impl IntoIterator<Item = RuleBuilder>,
        raise_errors: bool,
    ) -> TrellisResult<LoadReport> {
        let (built, report) = load_bulk(rules.into_iter().map(RuleBuilder::build), raise_errors, "rule")?;
        self.rules.extend(built);
        Ok(report)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn add_fact(&mut self, fact: Fact) {
        self.facts.push(fact);
    }

    /// Build and add a batch of facts, with the same error policy as
    /// [`Reasoner::add_rules_bulk`].
    pub fn add_facts_bulk(
        &mut self,
        facts: impl IntoIterator<Item = FactBuilder>,
        raise_errors: bool,
    ) -> TrellisResult<LoadReport> {
        let (built, report) = load_bulk(facts.into_iter().map(FactBuilder::build), raise_errors, "fact")?;
        self.facts.extend(built);
        Ok(report)
    }

    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    /// Declare two labels mutually exclusive.
    pub fn add_inconsistent_predicate(&mut self, first: &str, second: &str) {
        self.ipl.push(InconsistentPair::new(first, second));
    }

    pub fn inconsistent_predicates(&self) -> &[InconsistentPair] {
        &self.ipl
    }

    pub fn add_annotation_function<F>(&mut self, name: &str, function: F)
    where
        F: Fn(&[&[Bound]], &[f64]) -> (f64, f64) + Send + Sync + 'static,
    {
        self.registry.register_annotation(name, function);
    }

    pub fn add_head_function<F>(&mut self, name: &str, function: F)
    where
        F: Fn(&[NodeId]) -> Vec<NodeId> + Send + Sync + 'static,
    {
        self.registry.register_head(name, function);
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// A handle for feeding facts from other threads. Queued facts are picked
    /// up at the next timestep boundary.
    pub fn fact_sender(&self) -> Sender<Fact> {
        self.channel.sender()
    }

    fn check_ready(&self) -> TrellisResult<()> {
        if self.loaded_graph.is_none() {
            return Err(TrellisError::MissingGraph);
        }
        if self.rules.is_empty() {
            return Err(TrellisError::MissingRules);
        }
        for rule in &self.rules {
            self.registry.check_rule(rule)?;
        }
        Ok(())
    }

    /// Reason from t=0 over a fresh copy of the loaded graph.
    pub fn reason(&mut self, timesteps: Timesteps) -> TrellisResult<ReasonSummary> {
        self.check_ready()?;
        let Some(loaded) = &self.loaded_graph else {
            return Err(TrellisError::MissingGraph);
        };
        let graph = self.graph.insert(loaded.clone());
        self.state.clear();
        self.state
            .schedule
            .extend(graph.attribute_facts(self.config.static_graph_facts));
        self.state.schedule.extend(self.facts.iter().cloned());

        let end = match timesteps {
            Timesteps::Fixed(n) => Some(n),
            Timesteps::UntilConvergence => None,
        };
        let inputs = Inputs {
            config: &self.config,
            rules: &self.rules,
            registry: &self.registry,
            ipl: &self.ipl,
            channel: &self.channel,
        };
        fixpoint::run(&inputs, graph, &mut self.state, 0, end)
    }

    /// Continue the previous run for `timesteps` more steps, adding `facts`
    /// (absolute times) first. Without a previous run this is `reason`.
    pub fn reason_again(
        &mut self,
        timesteps: Timesteps,
        facts: Vec<Fact>,
    ) -> TrellisResult<ReasonSummary> {
        let Some(last) = self.state.last_time.filter(|_| self.graph.is_some()) else {
            self.facts.extend(facts);
            return self.reason(timesteps);
        };
        if self.rules.is_empty() {
            return Err(TrellisError::MissingRules);
        }
        for rule in &self.rules {
            self.registry.check_rule(rule)?;
        }
        let resume = last + 1;
        for fact in facts {
            if self.state.schedule_from(fact.clone(), resume) {
                self.facts.push(fact);
            }
        }
        let end = match timesteps {
            Timesteps::Fixed(0) => {
                warn!("reason_again called with zero timesteps; nothing to do");
                return Ok(ReasonSummary {
                    last_time: Some(last),
                    ..ReasonSummary::default()
                });
            }
            Timesteps::Fixed(n) => Some(resume + n - 1),
            Timesteps::UntilConvergence => None,
        };
        let Some(graph) = self.graph.as_mut() else {
            return Err(TrellisError::MissingGraph);
        };
        let inputs = Inputs {
            config: &self.config,
            rules: &self.rules,
            registry: &self.registry,
            ipl: &self.ipl,
            channel: &self.channel,
        };
        fixpoint::run(&inputs, graph, &mut self.state, resume, end)
    }

    pub fn interpretation(&self) -> &Interpretation {
        &self.state.interpretation
    }

    pub fn rule_trace(&self) -> &RuleTrace {
        &self.state.trace
    }

    /// Last completed timestep of the current run.
    pub fn last_time(&self) -> Option<u64> {
        self.state.last_time
    }

    /// Total inner passes across `reason` and following `reason_again` calls.
    pub fn total_passes(&self) -> u64 {
        self.state.passes
    }

    /// Drop graph, rules, facts, inconsistent pairs and run state. Config
    /// and registered functions are kept.
    pub fn reset(&mut self) {
        self.loaded_graph = None;
        self.graph = None;
        self.rules.clear();
        self.facts.clear();
        self.ipl.clear();
        self.state.clear();
        self.channel.drain();
    }

    pub fn reset_rules(&mut self) {
        self.rules.clear();
    }

    pub fn reset_facts(&mut self) {
        self.facts.clear();
    }

    /// Drop the graph and everything computed over it.
    pub fn reset_graph(&mut self) {
        self.loaded_graph = None;
        self.graph = None;
        self.state.clear();
    }
}

fn load_bulk<T>(
    items: impl Iterator<Item = TrellisResult<T>>,
    raise_errors: bool,
    kind: &str,
) -> TrellisResult<(Vec<T>, LoadReport)> {
    let mut built = Vec::new();
    let mut report = LoadReport::default();
    for (index, item) in items.enumerate() {
        match item {
            Ok(value) => built.push(value),
            Err(error) if raise_errors => return Err(error),
            Err(error) => {
                warn!(index, kind, error = %error, "record rejected");
                report.rejected.push((index, error));
            }
        }
    }
    report.accepted = built.len();
    Ok((built, report))
}
