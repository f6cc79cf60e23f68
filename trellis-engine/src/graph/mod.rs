//! The reasoning graph: a petgraph `StableDiGraph` indexed by node id.
//!
//! Nodes and edges may carry `(label, bound)` attributes, which become facts
//! when reasoning starts. Edges inferred by rules are added in place; nothing
//! is ever removed, so indices stay stable for the whole run.

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::Direction;
use tracing::debug;

use trellis_core::constants::GRAPH_ATTRIBUTE_FACT;
use trellis_core::types::collections::FxHashMap;
use trellis_core::{Bound, Component, Fact, Label, NodeId};

/// Node payload.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub id: NodeId,
    pub attributes: Vec<(Label, Bound)>,
}

/// Edge payload.
#[derive(Debug, Clone, Default)]
pub struct EdgeData {
    pub attributes: Vec<(Label, Bound)>,
    /// Created by an edge-inferring rule.
    pub inferred: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Graph {
    graph: StableDiGraph<NodeData, EdgeData>,
    node_index: FxHashMap<NodeId, NodeIndex>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node if absent. Returns its id.
    pub fn add_node(&mut self, id: &str) -> NodeId {
        let id = NodeId::new(id);
        self.ensure_node(id);
        id
    }

    /// Add a node and attach attributes (appended if the node exists).
    pub fn add_node_with<'a>(
        &mut self,
        id: &str,
        attributes: impl IntoIterator<Item = (&'a str, Bound)>,
    ) -> NodeId {
        let node = self.add_node(id);
        let idx = self.ensure_node(node);
        self.graph[idx]
            .attributes
            .extend(attributes.into_iter().map(|(l, b)| (Label::new(l), b)));
        node
    }

    /// Add an edge, creating missing endpoints. Returns false if it existed.
    pub fn add_edge(&mut self, source: &str, target: &str) -> bool {
        self.add_edge_with(source, target, std::iter::empty())
    }

    pub fn add_edge_with<'a>(
        &mut self,
        source: &str,
        target: &str,
        attributes: impl IntoIterator<Item = (&'a str, Bound)>,
    ) -> bool {
        let s = self.ensure_node(NodeId::new(source));
        let t = self.ensure_node(NodeId::new(target));
        let attributes: Vec<(Label, Bound)> = attributes
            .into_iter()
            .map(|(l, b)| (Label::new(l), b))
            .collect();
        match self.graph.find_edge(s, t) {
            Some(edge) => {
                self.graph[edge].attributes.extend(attributes);
                false
            }
            None => {
                self.graph.add_edge(
                    s,
                    t,
                    EdgeData {
                        attributes,
                        inferred: false,
                    },
                );
                true
            }
        }
    }

    /// Add an edge produced by rule inference. Both endpoints must exist.
    pub(crate) fn insert_inferred_edge(&mut self, source: NodeId, target: NodeId) -> bool {
        let (Some(&s), Some(&t)) = (self.node_index.get(&source), self.node_index.get(&target))
        else {
            return false;
        };
        if self.graph.find_edge(s, t).is_some() {
            return false;
        }
        self.graph.add_edge(
            s,
            t,
            EdgeData {
                attributes: Vec::new(),
                inferred: true,
            },
        );
        debug!(source = %source, target = %target, "inferred edge added");
        true
    }

    fn ensure_node(&mut self, id: NodeId) -> NodeIndex {
        if let Some(&idx) = self.node_index.get(&id) {
            return idx;
        }
        let idx = self.graph.add_node(NodeData {
            id,
            attributes: Vec::new(),
        });
        self.node_index.insert(id, idx);
        idx
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.node_index.contains_key(&id)
    }

    pub fn contains_edge(&self, source: NodeId, target: NodeId) -> bool {
        match (self.node_index.get(&source), self.node_index.get(&target)) {
            (Some(&s), Some(&t)) => self.graph.find_edge(s, t).is_some(),
            _ => false,
        }
    }

    pub fn contains(&self, component: &Component) -> bool {
        match *component {
            Component::Node(id) => self.contains_node(id),
            Component::Edge(s, t) => self.contains_edge(s, t),
        }
    }

    /// All node ids in insertion order.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.graph.node_indices().map(|idx| self.graph[idx].id).collect()
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
        self.graph
            .edge_references()
            .map(|e| (self.graph[e.source()].id, self.graph[e.target()].id))
            .collect()
    }

    /// Every node and edge as a component.
    pub fn components(&self) -> impl Iterator<Item = Component> + '_ {
        let nodes = self
            .graph
            .node_indices()
            .map(|idx| Component::Node(self.graph[idx].id));
        let edges = self.graph.edge_references().map(|e| {
            Component::Edge(self.graph[e.source()].id, self.graph[e.target()].id)
        });
        nodes.chain(edges)
    }

    /// Out-neighbours of `id`, in insertion order.
    pub fn successors(&self, id: NodeId) -> Vec<NodeId> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// In-neighbours of `id`, in insertion order.
    pub fn predecessors(&self, id: NodeId) -> Vec<NodeId> {
        self.neighbors(id, Direction::Incoming)
    }

    fn neighbors(&self, id: NodeId, direction: Direction) -> Vec<NodeId> {
        let Some(&idx) = self.node_index.get(&id) else {
            return Vec::new();
        };
        let mut indices: Vec<NodeIndex> = self.graph.neighbors_directed(idx, direction).collect();
        indices.sort_unstable();
        indices.dedup();
        indices.into_iter().map(|n| self.graph[n].id).collect()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Number of edges added by inference.
    pub fn inferred_edge_count(&self) -> usize {
        self.graph.edge_weights().filter(|e| e.inferred).count()
    }

    /// Node and edge attributes as facts. Static facts hold from t=0 on;
    /// otherwise they hold at t=0 only.
    pub fn attribute_facts(&self, static_facts: bool) -> Vec<Fact> {
        let fact = |component: Component, label: Label, bound: Bound| Fact {
            name: GRAPH_ATTRIBUTE_FACT.to_string(),
            component,
            label,
            bound,
            start: 0,
            end: 0,
            is_static: static_facts,
        };
        let mut facts = Vec::new();
        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            for &(label, bound) in &node.attributes {
                facts.push(fact(Component::Node(node.id), label, bound));
            }
        }
        for edge in self.graph.edge_references() {
            let component =
                Component::Edge(self.graph[edge.source()].id, self.graph[edge.target()].id);
            for &(label, bound) in &edge.weight().attributes {
                facts.push(fact(component, label, bound));
            }
        }
        facts
    }
}
