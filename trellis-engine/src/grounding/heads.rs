//! Phase B: head groundings and the per-head threshold test.

use smallvec::SmallVec;
use tracing::trace;

use trellis_core::models::CountScope;
use trellis_core::types::collections::FxHashSet;
use trellis_core::{Bound, Component, HeadTerm, NodeId, Rule, RuleKind};

use super::join::{clause_available, item_component, Item, JoinState, Relation, Var};
use super::GroundingContext;

/// Head variables pinned to concrete nodes for one head grounding.
pub(crate) type Anchor = SmallVec<[(Var, NodeId); 2]>;

#[derive(Debug, Clone)]
pub(crate) struct HeadGrounding {
    pub component: Component,
    pub anchor: Anchor,
    /// The head is an edge missing from the graph.
    pub creates_edge: bool,
}

/// Clause-level evidence for one head grounding.
#[derive(Debug, Default)]
pub(crate) struct HeadSupport {
    pub annotations: Vec<Vec<Bound>>,
    pub groundings: Vec<Vec<Component>>,
}

struct HeadSide {
    var: Option<Var>,
    nodes: Vec<NodeId>,
}

fn head_side(term: &HeadTerm, join: &JoinState, ctx: &GroundingContext<'_>, rule: &Rule) -> HeadSide {
    let Some(var) = join.var(term.variable()) else {
        return HeadSide {
            var: None,
            nodes: Vec::new(),
        };
    };
    let nodes = join.nodes_of(var, ctx.graph);
    match term {
        HeadTerm::Variable(_) => HeadSide {
            var: Some(var),
            nodes,
        },
        HeadTerm::Function { name, .. } => {
            let targets = ctx
                .registry
                .head(name)
                .map(|function| function(nodes.as_slice()))
                .unwrap_or_default();
            let nodes = targets
                .into_iter()
                .filter(|target| {
                    let present = ctx.graph.contains_node(*target);
                    if !present {
                        trace!(rule = %rule.name, target = %target, "head function target not in graph");
                    }
                    present
                })
                .collect();
            HeadSide { var: None, nodes }
        }
    }
}

/// Enumerate head groundings for a rule whose body succeeded.
pub(crate) fn head_groundings(rule: &Rule, join: &JoinState, ctx: &GroundingContext<'_>) -> Vec<HeadGrounding> {
    match rule.kind() {
        RuleKind::Node => {
            let side = head_side(&rule.head[0], join, ctx, rule);
            side.nodes
                .into_iter()
                .map(|n| HeadGrounding {
                    component: Component::Node(n),
                    anchor: side.var.map(|v| (v, n)).into_iter().collect(),
                    creates_edge: false,
                })
                .collect()
        }
        RuleKind::Edge => {
            let source = head_side(&rule.head[0], join, ctx, rule);
            let target = head_side(&rule.head[1], join, ctx, rule);
            edge_pairs(rule, join, ctx, &source, &target)
                .into_iter()
                .map(|(s, t)| {
                    let mut anchor = Anchor::new();
                    if let Some(v) = source.var {
                        anchor.push((v, s));
                    }
                    if let Some(v) = target.var {
                        if source.var != Some(v) {
                            anchor.push((v, t));
                        }
                    }
                    HeadGrounding {
                        component: Component::Edge(s, t),
                        anchor,
                        creates_edge: !ctx.graph.contains_edge(s, t),
                    }
                })
                .collect()
        }
    }
}

fn edge_pairs(
    rule: &Rule,
    join: &JoinState,
    ctx: &GroundingContext<'_>,
    source: &HeadSide,
    target: &HeadSide,
) -> Vec<(NodeId, NodeId)> {
    let same_var = source.var.is_some() && source.var == target.var;
    if same_var {
        return source
            .nodes
            .iter()
            .filter(|&&n| rule.infers_edges() || ctx.graph.contains_edge(n, n))
            .map(|&n| (n, n))
            .collect();
    }
    let targets: FxHashSet<NodeId> = target.nodes.iter().copied().collect();
    if rule.infers_edges() {
        let mut pairs = Vec::new();
        for &s in &source.nodes {
            for &t in &target.nodes {
                if s != t {
                    pairs.push((s, t));
                }
            }
        }
        return pairs;
    }
    if let (Some(a), Some(b)) = (source.var, target.var) {
        if let Some(relation) = join.relation(a, b) {
            let sources: FxHashSet<NodeId> = source.nodes.iter().copied().collect();
            return relation
                .pairs
                .iter()
                .map(|&(x, y)| if relation.left == a { (x, y) } else { (y, x) })
                .filter(|(s, t)| {
                    sources.contains(s) && targets.contains(t) && ctx.graph.contains_edge(*s, *t)
                })
                .collect();
        }
    }
    let mut pairs = Vec::new();
    for &s in &source.nodes {
        for t in ctx.graph.successors(s) {
            if targets.contains(&t) {
                pairs.push((s, t));
            }
        }
    }
    pairs
}

fn find(relations: &[Relation], a: Var, b: Var) -> Option<&Relation> {
    relations.iter().find(|r| r.involves(a, b))
}

/// Nodes `var` may take given the anchored head variables, or `None` when
/// nothing links `var` to the head.
fn anchored_nodes(var: Var, anchor: &Anchor, relations: &[Relation]) -> Option<FxHashSet<NodeId>> {
    let mut allowed: Option<FxHashSet<NodeId>> = None;
    for &(head, node) in anchor {
        let set = if var == head {
            Some(std::iter::once(node).collect())
        } else {
            find(relations, var, head).map(|r| r.partners(head, node))
        };
        if let Some(set) = set {
            allowed = Some(match allowed {
                None => set,
                Some(previous) => previous.intersection(&set).copied().collect(),
            });
        }
    }
    allowed
}

fn within(item: &Item, allowed: &[Option<FxHashSet<NodeId>>]) -> bool {
    item.iter()
        .zip(allowed)
        .all(|(node, set)| set.as_ref().map_or(true, |s| s.contains(node)))
}

/// Evaluate every clause threshold against one head grounding. Returns the
/// clause evidence when all thresholds pass.
pub(crate) fn support_for(
    rule: &Rule,
    join: &JoinState,
    head: &HeadGrounding,
    ctx: &GroundingContext<'_>,
) -> Option<HeadSupport> {
    let collect_annotations = rule.annotation_function.is_some();
    let mut support = HeadSupport::default();
    for ((clause, threshold), record) in rule.clauses.iter().zip(&rule.thresholds).zip(&join.records) {
        let at_clause: Vec<Option<FxHashSet<NodeId>>> = record
            .vars
            .iter()
            .map(|&v| anchored_nodes(v, &head.anchor, &record.links))
            .collect();
        let at_end: Vec<Option<FxHashSet<NodeId>>> = record
            .vars
            .iter()
            .map(|&v| anchored_nodes(v, &head.anchor, &join.relations).or_else(|| join.grounding_set(v)))
            .collect();
        let pair_relation = match record.vars.as_slice() {
            &[a, b] if a != b => join.relation(a, b).map(|r| (a, r)),
            _ => None,
        };

        let candidates: Vec<&Item> = record
            .candidates
            .iter()
            .filter(|item| within(item, &at_clause))
            .collect();
        let satisfying: Vec<&Item> = record
            .satisfying
            .iter()
            .filter(|item| within(item, &at_clause) && within(item, &at_end))
            .filter(|item| pair_relation.map_or(true, |(a, r)| r.allows(a, item[0], item[1])))
            .collect();
        let denominator = match threshold.scope() {
            CountScope::Total => candidates.len(),
            CountScope::Available => candidates
                .iter()
                .filter(|item| clause_available(clause, item, ctx.source))
                .count(),
        };
        if !threshold.is_satisfied(denominator, satisfying.len()) {
            return None;
        }
        if collect_annotations {
            support.annotations.push(
                satisfying
                    .iter()
                    .map(|item| {
                        ctx.source
                            .bound(&item_component(clause, item), clause.label)
                            .unwrap_or(Bound::UNKNOWN)
                    })
                    .collect(),
            );
        }
        if ctx.atom_trace {
            support
                .groundings
                .push(satisfying.iter().map(|item| item_component(clause, item)).collect());
        }
    }
    Some(support)
}
