//! Inconsistent predicate list entries.

use serde::{Deserialize, Serialize};

use crate::types::identifiers::Label;

/// Two labels that may not both hold: whenever one tightens to `b`, the
/// other must lie inside `[1-b.upper, 1-b.lower]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InconsistentPair(pub Label, pub Label);

impl InconsistentPair {
    pub fn new(first: &str, second: &str) -> Self {
        Self(Label::new(first), Label::new(second))
    }

    /// The partner of `label` if it belongs to this pair.
    pub fn partner_of(&self, label: Label) -> Option<Label> {
        if self.0 == label {
            Some(self.1)
        } else if self.1 == label {
            Some(self.0)
        } else {
            None
        }
    }
}
