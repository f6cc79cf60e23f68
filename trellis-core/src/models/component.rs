//! Graph components that own a World.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::identifiers::NodeId;

/// A node or a directed edge. Equality is by identity fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Node(NodeId),
    Edge(NodeId, NodeId),
}

impl Component {
    pub fn node(id: &str) -> Self {
        Component::Node(NodeId::new(id))
    }

    pub fn edge(source: &str, target: &str) -> Self {
        Component::Edge(NodeId::new(source), NodeId::new(target))
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Component::Node(_))
    }

    pub fn is_edge(&self) -> bool {
        matches!(self, Component::Edge(..))
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Node(id) => write!(f, "{id}"),
            Component::Edge(source, target) => write!(f, "({source}, {target})"),
        }
    }
}
