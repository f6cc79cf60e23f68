//! Convergence criteria for the fixpoint driver.

use serde::{Deserialize, Serialize};

/// Which statistic decides that a pass (or timestep) has converged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConvergenceMode {
    /// Only zero changes count as converged.
    #[default]
    Perfect,
    /// Converged once the number of changed atoms is <= `threshold`.
    DeltaInterpretation,
    /// Converged once the largest bound movement is <= `threshold`.
    DeltaBound,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvergenceConfig {
    pub mode: ConvergenceMode,
    /// Atom count for `delta_interpretation`, bound width for `delta_bound`.
    pub threshold: f64,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            mode: ConvergenceMode::Perfect,
            threshold: 0.0,
        }
    }
}

impl ConvergenceConfig {
    pub fn perfect() -> Self {
        Self::default()
    }

    pub fn delta_interpretation(threshold: usize) -> Self {
        Self {
            mode: ConvergenceMode::DeltaInterpretation,
            threshold: threshold as f64,
        }
    }

    pub fn delta_bound(threshold: f64) -> Self {
        Self {
            mode: ConvergenceMode::DeltaBound,
            threshold,
        }
    }

    /// Decide convergence from one pass' (or timestep's) statistics.
    pub fn is_converged(&self, changes: usize, max_bound_delta: f64) -> bool {
        match self.mode {
            ConvergenceMode::Perfect => changes == 0,
            ConvergenceMode::DeltaInterpretation => changes as f64 <= self.threshold,
            ConvergenceMode::DeltaBound => max_bound_delta <= self.threshold,
        }
    }
}
