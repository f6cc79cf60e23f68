//! Time-windowed facts.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Bound, Component};
use crate::errors::{TrellisError, TrellisResult};
use crate::types::identifiers::{is_valid_identifier, is_valid_node_id, Label, NodeId};

/// `label(component):bound` holding on the inclusive window `[start, end]`.
/// Static facts hold from `start` onward regardless of `end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub name: String,
    pub component: Component,
    pub label: Label,
    pub bound: Bound,
    pub start: u64,
    pub end: u64,
    pub is_static: bool,
}

impl Fact {
    pub fn node(node: &str, label: &str) -> FactBuilder {
        FactBuilder::new(ComponentSpec::Node(node.to_string()), label)
    }

    pub fn edge(source: &str, target: &str, label: &str) -> FactBuilder {
        FactBuilder::new(ComponentSpec::Edge(source.to_string(), target.to_string()), label)
    }

    /// Whether the fact applies at `time`.
    pub fn is_active_at(&self, time: u64) -> bool {
        time >= self.start && (self.is_static || time <= self.end)
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}):{} @[{},{}]",
            self.label, self.component, self.bound, self.start, self.end
        )
    }
}

#[derive(Debug, Clone)]
enum ComponentSpec {
    Node(String),
    Edge(String, String),
}

/// Builder for [`Fact`]. Defaults: bound `[1,1]`, window `[0,0]`, not static.
#[derive(Debug, Clone)]
pub struct FactBuilder {
    component: ComponentSpec,
    label: String,
    name: Option<String>,
    lower: f64,
    upper: f64,
    start: u64,
    end: u64,
    is_static: bool,
}

impl FactBuilder {
    fn new(component: ComponentSpec, label: &str) -> Self {
        Self {
            component,
            label: label.to_string(),
            name: None,
            lower: 1.0,
            upper: 1.0,
            start: 0,
            end: 0,
            is_static: false,
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn bound(mut self, lower: f64, upper: f64) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    /// `~label(c)`: the bound `[0,0]`.
    pub fn negated(self) -> Self {
        self.bound(0.0, 0.0)
    }

    pub fn during(mut self, start: u64, end: u64) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn at(self, time: u64) -> Self {
        self.during(time, time)
    }

    pub fn set_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn build(self) -> TrellisResult<Fact> {
        if !is_valid_identifier(&self.label) {
            return Err(TrellisError::InvalidIdentifier {
                name: self.label,
                reason: "label must start with a letter or '_' and contain only alphanumerics or '_'"
                    .to_string(),
            });
        }
        let component = match &self.component {
            ComponentSpec::Node(id) => {
                check_node(id)?;
                Component::Node(NodeId::new(id))
            }
            ComponentSpec::Edge(source, target) => {
                check_node(source)?;
                check_node(target)?;
                Component::Edge(NodeId::new(source), NodeId::new(target))
            }
        };
        let bound = Bound::new(self.lower, self.upper)?;
        if self.start > self.end {
            return Err(TrellisError::InvalidFact {
                fact: format!("{}({component})", self.label),
                reason: format!("window start {} is after end {}", self.start, self.end),
            });
        }
        let name = self
            .name
            .unwrap_or_else(|| format!("{}({component})", self.label));
        Ok(Fact {
            name,
            component,
            label: Label::new(&self.label),
            bound,
            start: self.start,
            end: self.end,
            is_static: self.is_static,
        })
    }
}

fn check_node(id: &str) -> TrellisResult<()> {
    if is_valid_node_id(id) {
        Ok(())
    } else {
        Err(TrellisError::InvalidIdentifier {
            name: id.to_string(),
            reason: "node ids may not be empty or contain whitespace or rule delimiters"
                .to_string(),
        })
    }
}
