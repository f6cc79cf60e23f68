//! Time-indexed interpretation: one [`Snapshot`] per computed timestep.
//!
//! Snapshot `t` is seeded from snapshot `t-1` when the timestep begins and
//! is then mutated only by fact application and rule commits at `t`. Earlier
//! snapshots are frozen and serve as the source for delayed rules.

mod snapshot;

pub use snapshot::{Snapshot, SnapshotDiff};

use std::collections::BTreeMap;

use serde::Serialize;

use trellis_core::{Bound, Component, Label};

use crate::graph::Graph;

/// Ordered dump of the interpretation: time → component → label → bound.
pub type InterpretationMap = BTreeMap<u64, BTreeMap<Component, BTreeMap<Label, Bound>>>;

/// One atom that moved between consecutive timesteps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AtomChange {
    pub component: Component,
    pub label: Label,
    pub previous: Bound,
    pub current: Bound,
}

/// A component whose world matched a filter at one timestep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterRow {
    pub time: u64,
    pub component: Component,
    /// One entry per requested label; `None` when the label did not match.
    pub bounds: Vec<(Label, Option<Bound>)>,
}

#[derive(Debug, Clone, Default)]
pub struct Interpretation {
    snapshots: Vec<Snapshot>,
}

impl Interpretation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of computed timesteps.
    pub fn timesteps(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// The most recent timestep, if any.
    pub fn last_time(&self) -> Option<u64> {
        self.snapshots.len().checked_sub(1).map(|t| t as u64)
    }

    pub fn snapshot(&self, time: u64) -> Option<&Snapshot> {
        usize::try_from(time).ok().and_then(|t| self.snapshots.get(t))
    }

    pub(crate) fn snapshot_mut(&mut self, time: u64) -> Option<&mut Snapshot> {
        usize::try_from(time).ok().and_then(|t| self.snapshots.get_mut(t))
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    /// Open timestep `time`. The first timestep starts with an empty world per
    /// graph component; later ones advance the previous snapshot. Components
    /// added to the graph since then get an empty world.
    pub(crate) fn begin_timestep(&mut self, time: u64, graph: &Graph, persistent: bool) {
        let index = time as usize;
        if index < self.snapshots.len() {
            self.snapshots.truncate(index);
        }
        let mut next = match self.snapshots.last() {
            Some(previous) => previous.advance(persistent),
            None => Snapshot::with_components(graph.components()),
        };
        for component in graph.components() {
            next.ensure(component);
        }
        // Gaps only happen when resuming past the last stored step.
        while self.snapshots.len() < index {
            self.snapshots.push(next.clone());
        }
        self.snapshots.push(next);
    }

    pub(crate) fn clear(&mut self) {
        self.snapshots.clear();
    }

    pub fn bound_at(&self, time: u64, component: &Component, label: Label) -> Option<Bound> {
        self.snapshot(time).and_then(|s| s.bound(component, label))
    }

    /// `bound(component, label) ⊆ target` at `time`.
    pub fn satisfies_at(
        &self,
        time: u64,
        component: &Component,
        label: Label,
        target: &Bound,
    ) -> bool {
        self.snapshot(time)
            .is_some_and(|s| s.satisfies(component, label, target))
    }

    /// Satisfaction against the final timestep.
    pub fn query(&self, component: &Component, label: Label, target: &Bound) -> bool {
        self.latest()
            .is_some_and(|s| s.satisfies(component, label, target))
    }

    pub fn to_map(&self) -> InterpretationMap {
        self.snapshots
            .iter()
            .enumerate()
            .map(|(t, snapshot)| {
                let worlds = snapshot
                    .iter()
                    .map(|(component, world)| (*component, world.iter().collect()))
                    .collect();
                (t as u64, worlds)
            })
            .collect()
    }

    /// Atoms at `time` whose bound differs from `time - 1`.
    pub fn changed_atoms(&self, time: u64) -> Vec<AtomChange> {
        let Some(current) = self.snapshot(time) else {
            return Vec::new();
        };
        let empty = Snapshot::new();
        let previous = time
            .checked_sub(1)
            .and_then(|t| self.snapshot(t))
            .unwrap_or(&empty);
        let mut changes = Vec::new();
        for (component, world) in current.sorted() {
            for (label, bound) in world.sorted() {
                let before = previous.bound(&component, label).unwrap_or(Bound::UNKNOWN);
                if before != bound {
                    changes.push(AtomChange {
                        component,
                        label,
                        previous: before,
                        current: bound,
                    });
                }
            }
        }
        changes
    }

    /// Per-timestep node rows where at least one of `labels` lies within
    /// `target`.
    pub fn filter_nodes(&self, labels: &[&str], target: &Bound) -> Vec<FilterRow> {
        self.filter(labels, target, Component::is_node)
    }

    /// Per-timestep edge rows where at least one of `labels` lies within
    /// `target`.
    pub fn filter_edges(&self, labels: &[&str], target: &Bound) -> Vec<FilterRow> {
        self.filter(labels, target, Component::is_edge)
    }

    fn filter(
        &self,
        labels: &[&str],
        target: &Bound,
        keep: impl Fn(&Component) -> bool,
    ) -> Vec<FilterRow> {
        let labels: Vec<Label> = labels.iter().map(|l| Label::new(l)).collect();
        let mut rows = Vec::new();
        for (t, snapshot) in self.snapshots.iter().enumerate() {
            for (component, world) in snapshot.sorted() {
                if !keep(&component) {
                    continue;
                }
                let bounds: Vec<(Label, Option<Bound>)> = labels
                    .iter()
                    .map(|&label| {
                        let hit = world.satisfies(label, target).then(|| world.bound(label));
                        (label, hit)
                    })
                    .collect();
                if bounds.iter().any(|(_, b)| b.is_some()) {
                    rows.push(FilterRow {
                        time: t as u64,
                        component,
                        bounds,
                    });
                }
            }
        }
        rows
    }
}
