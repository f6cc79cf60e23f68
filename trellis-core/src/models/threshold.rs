//! Quantified neighbour-satisfaction thresholds.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::PERCENT_BASE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantifier {
    GreaterEqual,
    Greater,
    LessEqual,
    Less,
    Equal,
}

impl Quantifier {
    fn compare(&self, value: f64, thresh: f64) -> bool {
        match self {
            Quantifier::GreaterEqual => value >= thresh,
            Quantifier::Greater => value > thresh,
            Quantifier::LessEqual => value <= thresh,
            Quantifier::Less => value < thresh,
            Quantifier::Equal => value == thresh,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Quantifier::GreaterEqual => ">=",
            Quantifier::Greater => ">",
            Quantifier::LessEqual => "<=",
            Quantifier::Less => "<",
            Quantifier::Equal => "==",
        }
    }
}

/// Absolute count or percentage of the candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountMode {
    Number,
    Percent,
}

/// What the satisfying count is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountScope {
    /// Every candidate.
    Total,
    /// Candidates that have the clause label in scope.
    Available,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantifierType {
    pub mode: CountMode,
    pub scope: CountScope,
}

/// `(quantifier, (number|percent, total|available), thresh)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub quantifier: Quantifier,
    pub quantifier_type: QuantifierType,
    pub thresh: f64,
}

impl Default for Threshold {
    /// Existential: at least one satisfying candidate.
    fn default() -> Self {
        Self::new(Quantifier::GreaterEqual, CountMode::Number, CountScope::Total, 1.0)
    }
}

impl Threshold {
    pub fn new(quantifier: Quantifier, mode: CountMode, scope: CountScope, thresh: f64) -> Self {
        Self {
            quantifier,
            quantifier_type: QuantifierType { mode, scope },
            thresh,
        }
    }

    /// Every candidate must satisfy: `(>=, percent/total, 100)`.
    pub fn forall() -> Self {
        Self::new(Quantifier::GreaterEqual, CountMode::Percent, CountScope::Total, 100.0)
    }

    pub fn scope(&self) -> CountScope {
        self.quantifier_type.scope
    }

    /// Compare `satisfying` against `denominator` candidates.
    /// Percent thresholds never pass with zero candidates.
    pub fn is_satisfied(&self, denominator: usize, satisfying: usize) -> bool {
        match self.quantifier_type.mode {
            CountMode::Number => self.quantifier.compare(satisfying as f64, self.thresh),
            CountMode::Percent => {
                if denominator == 0 {
                    return false;
                }
                // Cross-multiplied so boundaries like 7 of 10 at 70% stay exact.
                self.quantifier
                    .compare(satisfying as f64 * PERCENT_BASE, self.thresh * denominator as f64)
            }
        }
    }

    /// True when no candidate set with zero satisfying members can pass, so
    /// grounding may narrow the clause variable to the satisfying subset.
    pub fn requires_satisfying(&self) -> bool {
        let zero_passes = match self.quantifier_type.mode {
            CountMode::Number => self.quantifier.compare(0.0, self.thresh),
            CountMode::Percent => self.quantifier.compare(0.0, self.thresh),
        };
        !zero_passes
    }

    pub fn is_valid(&self) -> bool {
        match self.quantifier_type.mode {
            CountMode::Number => self.thresh.is_finite() && self.thresh >= 0.0,
            CountMode::Percent => (0.0..=100.0).contains(&self.thresh),
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.quantifier_type.mode {
            CountMode::Number => "number",
            CountMode::Percent => "percent",
        };
        let scope = match self.quantifier_type.scope {
            CountScope::Total => "total",
            CountScope::Available => "available",
        };
        write!(f, "({}, ({mode}, {scope}), {})", self.quantifier.symbol(), self.thresh)
    }
}
