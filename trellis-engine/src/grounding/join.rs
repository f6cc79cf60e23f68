//! Phase A: clause-by-clause join that narrows variable groundings.
//!
//! Each variable holds an ordered grounding list (`None` while unbound,
//! meaning "every node"). Edge and comparison clauses add a relation between
//! their two variables. After every clause the relations and groundings are
//! refined against each other until nothing shrinks.

use smallvec::{smallvec, SmallVec};
use tracing::trace;

use trellis_core::types::collections::FxHashSet;
use trellis_core::{Clause, ClauseKind, Component, NodeId, Rule, Threshold};

use crate::graph::Graph;
use crate::interpretation::Snapshot;

pub(crate) type Var = usize;

/// One candidate grounding of a clause, one node per clause variable.
pub(crate) type Item = SmallVec<[NodeId; 2]>;

/// Allowed pairs between two variables, oriented `(left, right)`.
#[derive(Debug, Clone)]
pub(crate) struct Relation {
    pub left: Var,
    pub right: Var,
    pub pairs: Vec<(NodeId, NodeId)>,
}

impl Relation {
    pub fn involves(&self, a: Var, b: Var) -> bool {
        (self.left == a && self.right == b) || (self.left == b && self.right == a)
    }

    /// Nodes of `other` paired with `node` bound at `var`.
    pub fn partners(&self, var: Var, node: NodeId) -> FxHashSet<NodeId> {
        if var == self.left {
            self.pairs.iter().filter(|p| p.0 == node).map(|p| p.1).collect()
        } else {
            self.pairs.iter().filter(|p| p.1 == node).map(|p| p.0).collect()
        }
    }

    /// Whether `(a_node, b_node)` bound at `(a, b)` is an allowed pair.
    pub fn allows(&self, a: Var, a_node: NodeId, b_node: NodeId) -> bool {
        if a == self.left {
            self.pairs.contains(&(a_node, b_node))
        } else {
            self.pairs.contains(&(b_node, a_node))
        }
    }
}

/// What a clause saw when it was evaluated.
#[derive(Debug, Clone)]
pub(crate) struct ClauseRecord {
    pub vars: SmallVec<[Var; 2]>,
    pub candidates: Vec<Item>,
    pub satisfying: Vec<Item>,
    /// Relations between this clause's variables and head variables, as they
    /// stood before the clause narrowed anything.
    pub links: Vec<Relation>,
}

#[derive(Debug, Clone)]
pub(crate) struct JoinState {
    names: Vec<String>,
    pub groundings: Vec<Option<Vec<NodeId>>>,
    pub relations: Vec<Relation>,
    pub records: Vec<ClauseRecord>,
}

impl JoinState {
    pub fn new(rule: &Rule, graph: &Graph, allow_ground_rules: bool) -> Self {
        let mut names: Vec<String> = Vec::new();
        for name in rule
            .head
            .iter()
            .map(|term| term.variable())
            .chain(rule.body_variables())
        {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        let groundings = names
            .iter()
            .map(|name| {
                if !allow_ground_rules {
                    return None;
                }
                NodeId::existing(name)
                    .filter(|id| graph.contains_node(*id))
                    .map(|id| vec![id])
            })
            .collect();
        Self {
            names,
            groundings,
            relations: Vec::new(),
            records: Vec::with_capacity(rule.clauses.len()),
        }
    }

    pub fn var(&self, name: &str) -> Option<Var> {
        self.names.iter().position(|n| n == name)
    }

    /// Current groundings of `var`, or every node while unbound.
    pub fn nodes_of(&self, var: Var, graph: &Graph) -> Vec<NodeId> {
        match &self.groundings[var] {
            Some(nodes) => nodes.clone(),
            None => graph.nodes(),
        }
    }

    pub fn relation(&self, a: Var, b: Var) -> Option<&Relation> {
        self.relations.iter().find(|r| r.involves(a, b))
    }

    fn is_bound(&self, var: Var) -> bool {
        self.groundings[var].is_some()
    }

    /// Evaluate every clause in order. Returns false as soon as a clause
    /// whose threshold needs a satisfying grounding has none.
    pub fn run(&mut self, rule: &Rule, graph: &Graph, source: &Snapshot, head_vars: &[Var]) -> bool {
        for (index, (clause, threshold)) in rule.clauses.iter().zip(&rule.thresholds).enumerate() {
            let vars: SmallVec<[Var; 2]> = clause
                .variables
                .iter()
                .filter_map(|name| self.var(name))
                .collect();
            if vars.len() != clause.variables.len() {
                return false;
            }
            let links = self.capture_links(&vars, head_vars);
            let candidates = self.candidates(clause, &vars, graph);
            let satisfying: Vec<Item> = candidates
                .iter()
                .filter(|item| clause_satisfied(clause, item, source))
                .cloned()
                .collect();
            trace!(
                rule = %rule.name,
                clause = index,
                candidates = candidates.len(),
                satisfying = satisfying.len(),
                "clause evaluated"
            );
            if !self.bind(threshold, &vars, &candidates, &satisfying) {
                trace!(rule = %rule.name, clause = index, "no satisfying grounding");
                return false;
            }
            self.records.push(ClauseRecord {
                vars,
                candidates,
                satisfying,
                links,
            });
            self.refine();
        }
        true
    }

    fn capture_links(&self, vars: &[Var], head_vars: &[Var]) -> Vec<Relation> {
        let mut links = Vec::new();
        for &v in vars {
            for &h in head_vars {
                if v == h {
                    continue;
                }
                if let Some(rel) = self.relation(v, h) {
                    if !links.iter().any(|l: &Relation| l.involves(v, h)) {
                        links.push(rel.clone());
                    }
                }
            }
        }
        links
    }

    fn candidates(&self, clause: &Clause, vars: &[Var], graph: &Graph) -> Vec<Item> {
        match clause.kind {
            ClauseKind::Node => self
                .nodes_of(vars[0], graph)
                .into_iter()
                .map(|n| smallvec![n])
                .collect(),
            ClauseKind::Edge => self.edge_candidates(vars[0], vars[1], graph),
            ClauseKind::Comparison => {
                let (a, b) = (vars[0], vars[1]);
                if a == b {
                    return self
                        .nodes_of(a, graph)
                        .into_iter()
                        .map(|n| smallvec![n, n])
                        .collect();
                }
                if let Some(rel) = self.relation(a, b) {
                    return oriented_pairs(rel, a).into_iter().map(|(x, y)| smallvec![x, y]).collect();
                }
                let left = self.nodes_of(a, graph);
                let right = self.nodes_of(b, graph);
                left.iter()
                    .flat_map(|&x| right.iter().map(move |&y| smallvec![x, y]))
                    .collect()
            }
        }
    }

    fn edge_candidates(&self, source: Var, target: Var, graph: &Graph) -> Vec<Item> {
        if source == target {
            return self
                .nodes_of(source, graph)
                .into_iter()
                .filter(|&n| graph.contains_edge(n, n))
                .map(|n| smallvec![n, n])
                .collect();
        }
        if let Some(rel) = self.relation(source, target) {
            return oriented_pairs(rel, source)
                .into_iter()
                .filter(|&(s, t)| graph.contains_edge(s, t))
                .map(|(s, t)| smallvec![s, t])
                .collect();
        }
        let target_filter: Option<FxHashSet<NodeId>> = self.groundings[target]
            .as_ref()
            .map(|nodes| nodes.iter().copied().collect());
        if self.is_bound(source) {
            let mut items = Vec::new();
            for s in self.nodes_of(source, graph) {
                for t in graph.successors(s) {
                    if target_filter.as_ref().map_or(true, |f| f.contains(&t)) {
                        items.push(smallvec![s, t]);
                    }
                }
            }
            return items;
        }
        if self.is_bound(target) {
            let mut items = Vec::new();
            for t in self.nodes_of(target, graph) {
                for s in graph.predecessors(t) {
                    items.push(smallvec![s, t]);
                }
            }
            return items;
        }
        graph
            .edges()
            .into_iter()
            .map(|(s, t)| smallvec![s, t])
            .collect()
    }

    /// Narrow groundings after a clause. Returns false when the threshold
    /// needs a satisfying grounding and there is none.
    fn bind(&mut self, threshold: &Threshold, vars: &[Var], candidates: &[Item], satisfying: &[Item]) -> bool {
        let chosen = if threshold.requires_satisfying() {
            if satisfying.is_empty() {
                return false;
            }
            satisfying
        } else if candidates.is_empty() {
            return true;
        } else {
            candidates
        };
        for (position, &var) in vars.iter().enumerate() {
            let nodes = unique(chosen.iter().map(|item| item[position]));
            self.groundings[var] = Some(nodes);
        }
        if vars.len() == 2 && vars[0] != vars[1] {
            let pairs: Vec<(NodeId, NodeId)> = unique(chosen.iter().map(|item| (item[0], item[1])));
            self.add_relation(vars[0], vars[1], pairs);
        }
        true
    }

    fn add_relation(&mut self, left: Var, right: Var, pairs: Vec<(NodeId, NodeId)>) {
        if let Some(existing) = self.relations.iter_mut().find(|r| r.involves(left, right)) {
            let incoming: FxHashSet<(NodeId, NodeId)> = if existing.left == left {
                pairs.into_iter().collect()
            } else {
                pairs.into_iter().map(|(a, b)| (b, a)).collect()
            };
            existing.pairs.retain(|p| incoming.contains(p));
        } else {
            self.relations.push(Relation { left, right, pairs });
        }
    }

    /// Arc-consistency between relations and groundings.
    fn refine(&mut self) {
        loop {
            let mut changed = false;
            for index in 0..self.relations.len() {
                let (left, right) = (self.relations[index].left, self.relations[index].right);
                let left_set = self.grounding_set(left);
                let right_set = self.grounding_set(right);
                let relation = &mut self.relations[index];
                let before = relation.pairs.len();
                relation.pairs.retain(|(a, b)| {
                    left_set.as_ref().map_or(true, |s| s.contains(a))
                        && right_set.as_ref().map_or(true, |s| s.contains(b))
                });
                changed |= relation.pairs.len() != before;

                let left_nodes: FxHashSet<NodeId> = relation.pairs.iter().map(|p| p.0).collect();
                let right_nodes: FxHashSet<NodeId> = relation.pairs.iter().map(|p| p.1).collect();
                let left_projection = unique(relation.pairs.iter().map(|p| p.0));
                let right_projection = unique(relation.pairs.iter().map(|p| p.1));
                changed |= self.restrict(left, &left_nodes, left_projection);
                changed |= self.restrict(right, &right_nodes, right_projection);
            }
            if !changed {
                break;
            }
        }
    }

    fn restrict(&mut self, var: Var, allowed: &FxHashSet<NodeId>, projection: Vec<NodeId>) -> bool {
        if let Some(nodes) = self.groundings[var].as_mut() {
            let before = nodes.len();
            nodes.retain(|n| allowed.contains(n));
            return nodes.len() != before;
        }
        self.groundings[var] = Some(projection);
        true
    }

    pub fn grounding_set(&self, var: Var) -> Option<FxHashSet<NodeId>> {
        self.groundings[var]
            .as_ref()
            .map(|nodes| nodes.iter().copied().collect())
    }
}

/// Relation pairs oriented so `var` comes first.
fn oriented_pairs(relation: &Relation, var: Var) -> Vec<(NodeId, NodeId)> {
    if relation.left == var {
        relation.pairs.clone()
    } else {
        relation.pairs.iter().map(|&(a, b)| (b, a)).collect()
    }
}

fn unique<T: Copy + Eq + std::hash::Hash>(items: impl Iterator<Item = T>) -> Vec<T> {
    let mut seen = FxHashSet::default();
    items.filter(|item| seen.insert(*item)).collect()
}

/// Component a clause item refers to. Comparison items refer to their
/// left node.
pub(crate) fn item_component(clause: &Clause, item: &Item) -> Component {
    match clause.kind {
        ClauseKind::Edge => Component::Edge(item[0], item[1]),
        ClauseKind::Node | ClauseKind::Comparison => Component::Node(item[0]),
    }
}

pub(crate) fn clause_satisfied(clause: &Clause, item: &Item, source: &Snapshot) -> bool {
    match (clause.kind, &clause.comparison) {
        (ClauseKind::Comparison, Some(comparison)) => {
            let left = source.bound(&Component::Node(item[0]), clause.label);
            let right = source.bound(&Component::Node(item[1]), comparison.right_label);
            match (left, right) {
                (Some(l), Some(r)) => comparison.operator.apply(l.lower(), r.lower()),
                _ => false,
            }
        }
        (ClauseKind::Comparison, None) => false,
        _ => source.satisfies(&item_component(clause, item), clause.label, &clause.bound),
    }
}

/// The clause label is in scope for the item.
pub(crate) fn clause_available(clause: &Clause, item: &Item, source: &Snapshot) -> bool {
    match (clause.kind, &clause.comparison) {
        (ClauseKind::Comparison, Some(comparison)) => {
            source.has_label(&Component::Node(item[0]), clause.label)
                && source.has_label(&Component::Node(item[1]), comparison.right_label)
        }
        _ => source.has_label(&item_component(clause, item), clause.label),
    }
}
