//! Time-ordered fact schedule.
//!
//! Facts wait in `pending` (keyed by start time) until their window opens.
//! Static facts are applied once and then carried forward by the snapshots;
//! dynamic facts are re-applied at every timestep of their window.

use std::collections::BTreeMap;

use tracing::debug;

use trellis_core::Fact;

#[derive(Debug, Clone, Default)]
pub(crate) struct FactSchedule {
    pending: BTreeMap<u64, Vec<Fact>>,
    active: Vec<Fact>,
}

impl FactSchedule {
    pub fn push(&mut self, fact: Fact) {
        self.pending.entry(fact.start).or_default().push(fact);
    }

    pub fn extend(&mut self, facts: impl IntoIterator<Item = Fact>) {
        for fact in facts {
            self.push(fact);
        }
    }

    /// Facts to apply at `time`, in insertion order within each start time.
    pub fn due(&mut self, time: u64) -> Vec<Fact> {
        let later = self.pending.split_off(&(time.saturating_add(1)));
        let opened = std::mem::replace(&mut self.pending, later);
        self.active.extend(opened.into_values().flatten());

        let before = self.active.len();
        self.active.retain(|fact| fact.is_static || fact.end >= time);
        if self.active.len() != before {
            debug!(time, expired = before - self.active.len(), "facts expired");
        }

        let due = self.active.clone();
        // Static facts persist through the snapshots once applied.
        self.active.retain(|fact| !fact.is_static);
        due
    }

    /// Some fact has not reached its start time yet.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.active.clear();
    }
}
