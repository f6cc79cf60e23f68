//! One timestep's worth of worlds.

use trellis_core::types::collections::FxHashMap;
use trellis_core::{Bound, Component, Label, World};

/// Change statistics between two snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SnapshotDiff {
    /// Atoms whose bound differs (or that only exist on one side).
    pub changed: usize,
    /// Largest movement of either endpoint across changed atoms.
    pub max_delta: f64,
}

/// Component → World for a single timestep.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    worlds: FxHashMap<Component, World>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty world for every component.
    pub fn with_components(components: impl IntoIterator<Item = Component>) -> Self {
        Self {
            worlds: components.into_iter().map(|c| (c, World::new())).collect(),
        }
    }

    pub fn world(&self, component: &Component) -> Option<&World> {
        self.worlds.get(component)
    }

    /// Mutable world, created empty when the component is new.
    pub(crate) fn world_mut(&mut self, component: Component) -> &mut World {
        self.worlds.entry(component).or_default()
    }

    pub(crate) fn ensure(&mut self, component: Component) {
        self.worlds.entry(component).or_default();
    }

    pub fn contains(&self, component: &Component) -> bool {
        self.worlds.contains_key(component)
    }

    pub fn bound(&self, component: &Component, label: Label) -> Option<Bound> {
        self.worlds.get(component).and_then(|w| w.get(label))
    }

    /// Whether `label` is in scope for `component`.
    pub fn has_label(&self, component: &Component, label: Label) -> bool {
        self.worlds.get(component).is_some_and(|w| w.contains(label))
    }

    pub fn satisfies(&self, component: &Component, label: Label, target: &Bound) -> bool {
        self.worlds
            .get(component)
            .is_some_and(|w| w.satisfies(label, target))
    }

    pub fn len(&self) -> usize {
        self.worlds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.worlds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Component, &World)> {
        self.worlds.iter()
    }

    /// Components in sorted order.
    pub fn sorted(&self) -> Vec<(Component, &World)> {
        let mut entries: Vec<(Component, &World)> =
            self.worlds.iter().map(|(c, w)| (*c, w)).collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// The starting state of the following timestep. Static bounds always
    /// carry over; dynamic ones only when `persistent`.
    pub(crate) fn advance(&self, persistent: bool) -> Snapshot {
        let mut next = self.clone();
        if !persistent {
            for world in next.worlds.values_mut() {
                world.reset_dynamic();
            }
        }
        next
    }

    /// Compare against `previous`. Atoms missing on one side count as `[0,1]`
    /// there.
    pub fn diff(&self, previous: &Snapshot) -> SnapshotDiff {
        let mut diff = SnapshotDiff::default();
        let mut record = |now: Bound, before: Bound| {
            if now != before {
                diff.changed += 1;
                diff.max_delta = diff.max_delta.max(now.max_delta(&before));
            }
        };
        for (component, world) in &self.worlds {
            let before = previous.worlds.get(component);
            for (label, bound) in world.iter() {
                let old = before.and_then(|w| w.get(label)).unwrap_or(Bound::UNKNOWN);
                record(bound, old);
            }
        }
        for (component, world) in &previous.worlds {
            let now = self.worlds.get(component);
            for (label, bound) in world.iter() {
                if now.is_some_and(|w| w.contains(label)) {
                    continue;
                }
                record(Bound::UNKNOWN, bound);
            }
        }
        diff
    }
}
