//! Validated rules.
//!
//! Rules arrive already structured (text parsing lives outside this crate);
//! [`RuleBuilder::build`] is the single validation point and reports problems
//! as the parse-error kinds of [`TrellisError`].

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{Bound, Clause, ClauseKind, Threshold};
use crate::errors::{TrellisError, TrellisResult};
use crate::types::identifiers::{is_valid_identifier, is_valid_node_id, Label};

/// A head argument: a rule variable, or a registered head function applied
/// to the groundings of a variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadTerm {
    Variable(String),
    Function { name: String, argument: String },
}

impl HeadTerm {
    pub fn var(name: &str) -> Self {
        HeadTerm::Variable(name.to_string())
    }

    pub fn function(name: &str, argument: &str) -> Self {
        HeadTerm::Function {
            name: name.to_string(),
            argument: argument.to_string(),
        }
    }

    /// The body variable this term reads.
    pub fn variable(&self) -> &str {
        match self {
            HeadTerm::Variable(v) => v,
            HeadTerm::Function { argument, .. } => argument,
        }
    }
}

impl fmt::Display for HeadTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeadTerm::Variable(v) => f.write_str(v),
            HeadTerm::Function { name, argument } => write!(f, "{name}({argument})"),
        }
    }
}

/// Edges to create when an edge rule grounds a pair that is not yet connected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferredEdge {
    pub source: String,
    pub target: String,
    /// Extra label brought into scope on the created edge.
    pub label: Option<Label>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Node,
    Edge,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub target: Label,
    pub head: SmallVec<[HeadTerm; 2]>,
    /// Temporal offset. 0 means the rule reads and writes the same timestep.
    pub delta: u64,
    pub clauses: Vec<Clause>,
    /// One per clause.
    pub thresholds: Vec<Threshold>,
    /// Bound written to the head when no annotation function is named.
    pub head_bound: Bound,
    pub annotation_function: Option<String>,
    /// One per clause, passed to the annotation function.
    pub weights: Vec<f64>,
    pub inferred_edge: Option<InferredEdge>,
    pub is_static: bool,
    pub immediate: bool,
}

impl Rule {
    pub fn builder(name: &str, target: &str) -> RuleBuilder {
        RuleBuilder::new(name, target)
    }

    pub fn kind(&self) -> RuleKind {
        if self.head.len() == 2 {
            RuleKind::Edge
        } else {
            RuleKind::Node
        }
    }

    pub fn infers_edges(&self) -> bool {
        self.inferred_edge.is_some()
    }

    pub fn clause_count(&self) -> usize {
        self.clauses.len()
    }

    /// Variables that appear in the body, in first-use order.
    pub fn body_variables(&self) -> Vec<&str> {
        let mut vars: Vec<&str> = Vec::new();
        for clause in &self.clauses {
            for var in &clause.variables {
                if !vars.contains(&var.as_str()) {
                    vars.push(var);
                }
            }
        }
        vars
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head: Vec<String> = self.head.iter().map(ToString::to_string).collect();
        let body: Vec<String> = self.clauses.iter().map(ToString::to_string).collect();
        write!(
            f,
            "{}({}) <-{} {}",
            self.target,
            head.join(","),
            self.delta,
            body.join(", ")
        )
    }
}

/// Builder for [`Rule`]; `build` validates everything at once.
#[derive(Debug, Clone)]
pub struct RuleBuilder {
    name: String,
    target: String,
    head: SmallVec<[HeadTerm; 2]>,
    delta: u64,
    clauses: Vec<Clause>,
    thresholds: Vec<Threshold>,
    head_bound: Bound,
    annotation_function: Option<String>,
    weights: Option<Vec<f64>>,
    infer_edges: bool,
    inferred_edge_label: Option<String>,
    is_static: bool,
}

impl RuleBuilder {
    pub fn new(name: &str, target: &str) -> Self {
        Self {
            name: name.to_string(),
            target: target.to_string(),
            head: SmallVec::new(),
            delta: 0,
            clauses: Vec::new(),
            thresholds: Vec::new(),
            head_bound: Bound::TRUE,
            annotation_function: None,
            weights: None,
            infer_edges: false,
            inferred_edge_label: None,
            is_static: false,
        }
    }

    /// Append a head variable. One for node rules, two for edge rules.
    pub fn head(mut self, var: &str) -> Self {
        self.head.push(HeadTerm::var(var));
        self
    }

    pub fn head_term(mut self, term: HeadTerm) -> Self {
        self.head.push(term);
        self
    }

    pub fn delta(mut self, delta: u64) -> Self {
        self.delta = delta;
        self
    }

    /// Append a clause with the existential threshold.
    pub fn clause(self, clause: Clause) -> Self {
        self.clause_with_threshold(clause, Threshold::default())
    }

    pub fn clause_with_threshold(mut self, clause: Clause, threshold: Threshold) -> Self {
        self.clauses.push(clause);
        self.thresholds.push(threshold);
        self
    }

    /// `forall(clause)` sugar.
    pub fn forall(self, clause: Clause) -> Self {
        self.clause_with_threshold(clause, Threshold::forall())
    }

    pub fn head_bound(mut self, bound: Bound) -> Self {
        self.head_bound = bound;
        self
    }

    pub fn annotation_function(mut self, name: &str) -> Self {
        self.annotation_function = Some(name.to_string());
        self
    }

    pub fn weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = Some(weights);
        self
    }

    /// Create missing head edges between the two head variables.
    pub fn infer_edges(mut self) -> Self {
        self.infer_edges = true;
        self
    }

    pub fn infer_edges_with_label(mut self, label: &str) -> Self {
        self.infer_edges = true;
        self.inferred_edge_label = Some(label.to_string());
        self
    }

    pub fn set_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn build(self) -> TrellisResult<Rule> {
        let invalid = |reason: String| TrellisError::InvalidRule {
            rule: self.name.clone(),
            reason,
        };

        check_identifier(&self.target)?;
        if self.name.trim().is_empty() {
            return Err(invalid("rule name is empty".to_string()));
        }
        if self.head.is_empty() || self.head.len() > 2 {
            return Err(invalid(format!(
                "expected 1 or 2 head terms, found {}",
                self.head.len()
            )));
        }
        for term in &self.head {
            check_variable(term.variable())?;
            if let HeadTerm::Function { name, .. } = term {
                check_identifier(name)?;
            }
        }
        if self.clauses.is_empty() {
            return Err(invalid("rule body has no clauses".to_string()));
        }
        if self.thresholds.len() != self.clauses.len() {
            return Err(invalid(format!(
                "{} thresholds for {} clauses",
                self.thresholds.len(),
                self.clauses.len()
            )));
        }
        for (i, clause) in self.clauses.iter().enumerate() {
            if clause.variables.len() != clause.expected_arity() {
                return Err(invalid(format!(
                    "clause {} ({}) expects {} variables, found {}",
                    i + 1,
                    clause.label,
                    clause.expected_arity(),
                    clause.variables.len()
                )));
            }
            for var in &clause.variables {
                check_variable(var)?;
            }
            check_identifier(clause.label.as_str())?;
            if clause.kind == ClauseKind::Comparison && clause.comparison.is_none() {
                return Err(invalid(format!("clause {} has no comparator", i + 1)));
            }
            // Re-validate: clauses are plain structs and may be built by hand.
            Bound::new(clause.bound.lower(), clause.bound.upper())?;
        }
        for (i, threshold) in self.thresholds.iter().enumerate() {
            if !threshold.is_valid() {
                return Err(invalid(format!("threshold {} is out of range: {threshold}", i + 1)));
            }
        }
        Bound::new(self.head_bound.lower(), self.head_bound.upper())?;

        let weights = match self.weights {
            Some(w) if w.len() != self.clauses.len() => {
                return Err(invalid(format!(
                    "{} weights for {} clauses",
                    w.len(),
                    self.clauses.len()
                )));
            }
            Some(w) => w,
            None => vec![1.0; self.clauses.len()],
        };
        if let Some(name) = &self.annotation_function {
            check_identifier(name)?;
        }

        let inferred_edge = if self.infer_edges {
            if self.head.len() != 2 {
                return Err(invalid("edge inference requires two head variables".to_string()));
            }
            let label = match &self.inferred_edge_label {
                Some(l) => {
                    check_identifier(l)?;
                    Some(Label::new(l))
                }
                None => None,
            };
            Some(InferredEdge {
                source: self.head[0].variable().to_string(),
                target: self.head[1].variable().to_string(),
                label,
            })
        } else {
            None
        };

        Ok(Rule {
            name: self.name,
            target: Label::new(&self.target),
            head: self.head,
            delta: self.delta,
            clauses: self.clauses,
            thresholds: self.thresholds,
            head_bound: self.head_bound,
            annotation_function: self.annotation_function,
            weights,
            inferred_edge,
            is_static: self.is_static,
            immediate: self.delta == 0,
        })
    }
}

fn check_identifier(name: &str) -> TrellisResult<()> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(TrellisError::InvalidIdentifier {
            name: name.to_string(),
            reason: "must start with a letter or '_' and contain only alphanumerics or '_'"
                .to_string(),
        })
    }
}

/// Variables may also be node ids, which ground rules pin to that node.
fn check_variable(name: &str) -> TrellisResult<()> {
    if is_valid_node_id(name) {
        Ok(())
    } else {
        Err(TrellisError::InvalidIdentifier {
            name: name.to_string(),
            reason: "variable must be non-empty without whitespace or rule delimiters".to_string(),
        })
    }
}
