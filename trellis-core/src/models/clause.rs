//! Rule body atoms.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

use super::Bound;
use crate::types::identifiers::Label;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseKind {
    Node,
    Edge,
    Comparison,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    GreaterEqual,
    Greater,
    LessEqual,
    Less,
    Equal,
    NotEqual,
}

impl Comparator {
    pub fn apply(&self, left: f64, right: f64) -> bool {
        match self {
            Comparator::GreaterEqual => left >= right,
            Comparator::Greater => left > right,
            Comparator::LessEqual => left <= right,
            Comparator::Less => left < right,
            Comparator::Equal => left == right,
            Comparator::NotEqual => left != right,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::GreaterEqual => ">=",
            Comparator::Greater => ">",
            Comparator::LessEqual => "<=",
            Comparator::Less => "<",
            Comparator::Equal => "==",
            Comparator::NotEqual => "!=",
        }
    }
}

/// Right-hand side of `a(x) OP b(y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub operator: Comparator,
    pub right_label: Label,
}

/// One body atom: `label(vars):bound`, or a comparison between two atoms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    pub kind: ClauseKind,
    pub label: Label,
    pub variables: SmallVec<[String; 2]>,
    pub bound: Bound,
    pub comparison: Option<Comparison>,
}

impl Clause {
    /// `label(var)` requiring `[1,1]`.
    pub fn node(label: &str, var: &str) -> Self {
        Self {
            kind: ClauseKind::Node,
            label: Label::new(label),
            variables: smallvec![var.to_string()],
            bound: Bound::TRUE,
            comparison: None,
        }
    }

    /// `label(source, target)` requiring `[1,1]`.
    pub fn edge(label: &str, source: &str, target: &str) -> Self {
        Self {
            kind: ClauseKind::Edge,
            label: Label::new(label),
            variables: smallvec![source.to_string(), target.to_string()],
            bound: Bound::TRUE,
            comparison: None,
        }
    }

    /// `left(left_var) OP right(right_var)`, comparing lower bounds.
    pub fn comparison(
        left: &str,
        left_var: &str,
        operator: Comparator,
        right: &str,
        right_var: &str,
    ) -> Self {
        Self {
            kind: ClauseKind::Comparison,
            label: Label::new(left),
            variables: smallvec![left_var.to_string(), right_var.to_string()],
            bound: Bound::UNKNOWN,
            comparison: Some(Comparison {
                operator,
                right_label: Label::new(right),
            }),
        }
    }

    pub fn with_bound(mut self, bound: Bound) -> Self {
        self.bound = bound;
        self
    }

    /// `~label(...)`: requires `[0,0]`.
    pub fn negated(self) -> Self {
        self.with_bound(Bound::FALSE)
    }

    /// Number of variables the clause kind expects.
    pub fn expected_arity(&self) -> usize {
        match self.kind {
            ClauseKind::Node => 1,
            ClauseKind::Edge | ClauseKind::Comparison => 2,
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.comparison) {
            (ClauseKind::Comparison, Some(cmp)) => write!(
                f,
                "{}({}) {} {}({})",
                self.label,
                self.variables[0],
                cmp.operator.symbol(),
                cmp.right_label,
                self.variables.get(1).map(String::as_str).unwrap_or("")
            ),
            _ => write!(f, "{}({}):{}", self.label, self.variables.join(","), self.bound),
        }
    }
}
