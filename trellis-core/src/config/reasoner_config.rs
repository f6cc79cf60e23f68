//! Reasoner settings.

use serde::{Deserialize, Serialize};

use super::ConvergenceConfig;

/// How a fact's bound is combined with the stored bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// Store `current ∩ proposed`.
    #[default]
    Intersection,
    /// Facts replace the stored bound. Rules always intersect.
    Override,
}

/// Settings consumed by the reasoner. Every field has a default, so a TOML
/// document only needs the keys it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasonerConfig {
    /// Record per-clause grounding tuples in the rule trace.
    pub atom_trace: bool,
    /// Legacy alias for `persistent`.
    pub canonical: bool,
    /// Resolve contradictions by resetting to [0,1] and freezing the atom.
    /// When false, contradicting bounds override the stored value.
    pub inconsistency_check: bool,
    /// Graph attributes become static facts instead of t=0 facts.
    pub static_graph_facts: bool,
    /// Keep the rule trace.
    pub store_interpretation_changes: bool,
    /// Ground rules on the rayon pool.
    pub parallel_computing: bool,
    /// Accepted for compatibility; there is a single engine.
    pub fp_version: bool,
    /// Rule variables named after existing nodes bind to those nodes.
    pub allow_ground_rules: bool,
    /// Dynamic bounds carry over between timesteps.
    pub persistent: bool,
    pub update_mode: UpdateMode,
    /// Escalate the first inconsistency into an error.
    pub abort_on_inconsistency: bool,
    /// Record graph-attribute facts in the rule trace.
    pub save_graph_attributes_to_trace: bool,
    pub convergence: ConvergenceConfig,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            atom_trace: false,
            canonical: false,
            inconsistency_check: true,
            static_graph_facts: true,
            store_interpretation_changes: true,
            parallel_computing: false,
            fp_version: false,
            allow_ground_rules: false,
            persistent: false,
            update_mode: UpdateMode::Intersection,
            abort_on_inconsistency: false,
            save_graph_attributes_to_trace: false,
            convergence: ConvergenceConfig::default(),
        }
    }
}

impl ReasonerConfig {
    /// Load config from a TOML string, falling back to defaults for missing fields.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Whether dynamic bounds persist from one timestep to the next.
    pub fn effective_persistent(&self) -> bool {
        self.persistent || self.canonical
    }
}
