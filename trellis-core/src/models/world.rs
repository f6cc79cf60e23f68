//! Per-component label → bound maps.

use serde::{Deserialize, Serialize};

use super::Bound;
use crate::types::collections::FxHashMap;
use crate::types::identifiers::Label;

/// Outcome of [`World::update`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldUpdate {
    pub previous: Bound,
    pub current: Bound,
    /// The stored interval moved.
    pub changed: bool,
    /// The write was ignored because the entry is static.
    pub blocked: bool,
}

/// The bounds of every label in scope for one component at one timestep.
///
/// A label is "in scope" once it has been inserted (by a fact, a rule, a
/// graph attribute, or an explicit scope declaration). Labels out of scope
/// are never satisfied and do not count as "available" for thresholds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct World {
    bounds: FxHashMap<Label, Bound>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// A world with every label in `labels` in scope at `[0,1]`.
    pub fn with_labels(labels: impl IntoIterator<Item = Label>) -> Self {
        let mut world = Self::new();
        for label in labels {
            world.insert_scope(label);
        }
        world
    }

    pub fn contains(&self, label: Label) -> bool {
        self.bounds.contains_key(&label)
    }

    pub fn get(&self, label: Label) -> Option<Bound> {
        self.bounds.get(&label).copied()
    }

    /// The stored bound, or `[0,1]` when the label is out of scope.
    pub fn bound(&self, label: Label) -> Bound {
        self.get(label).unwrap_or(Bound::UNKNOWN)
    }

    /// `current ⊆ target`. Out-of-scope labels never satisfy.
    pub fn satisfies(&self, label: Label, target: &Bound) -> bool {
        self.bounds
            .get(&label)
            .is_some_and(|current| current.is_subset_of(target))
    }

    /// Bring `label` into scope at `[0,1]` if it is not already.
    pub fn insert_scope(&mut self, label: Label) {
        self.bounds.entry(label).or_insert(Bound::UNKNOWN);
    }

    pub fn is_static(&self, label: Label) -> bool {
        self.bounds.get(&label).is_some_and(Bound::is_static)
    }

    /// Intersect `bound` into the stored value. Static entries are left
    /// untouched and reported as blocked.
    pub fn update(&mut self, label: Label, bound: &Bound) -> WorldUpdate {
        let entry = self.bounds.entry(label).or_insert(Bound::UNKNOWN);
        let previous = *entry;
        if previous.is_static() {
            return WorldUpdate {
                previous,
                current: previous,
                changed: false,
                blocked: true,
            };
        }
        let current = previous.intersect(bound);
        *entry = current;
        WorldUpdate {
            previous,
            current,
            changed: current != previous,
            blocked: false,
        }
    }

    /// Store `bound` as-is, static flag included. Used for overrides and
    /// inconsistency resolution, which bypass the intersection rule.
    pub fn set(&mut self, label: Label, bound: Bound) -> WorldUpdate {
        let previous = self.bound(label);
        self.bounds.insert(label, bound);
        WorldUpdate {
            previous,
            current: bound,
            changed: bound != previous,
            blocked: false,
        }
    }

    pub fn set_static(&mut self, label: Label, is_static: bool) {
        if let Some(bound) = self.bounds.get_mut(&label) {
            bound.set_static(is_static);
        }
    }

    /// Reset every non-static label to `[0,1]`, keeping it in scope.
    pub fn reset_dynamic(&mut self) {
        for bound in self.bounds.values_mut() {
            if !bound.is_static() {
                *bound = Bound::UNKNOWN;
            }
        }
    }

    /// Keep only the static labels.
    pub fn retain_static(&mut self) {
        self.bounds.retain(|_, bound| bound.is_static());
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Label, Bound)> + '_ {
        self.bounds.iter().map(|(label, bound)| (*label, *bound))
    }

    /// Labels and bounds ordered by label name.
    pub fn sorted(&self) -> Vec<(Label, Bound)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}
