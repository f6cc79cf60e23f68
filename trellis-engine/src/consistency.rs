//! Committing proposed bounds: PROPOSE → APPLY | RESOLVE.
//!
//! Every write to the interpretation goes through [`Committer::commit`]. A
//! proposal is consistent when its intersection with the stored bound is
//! non-empty and no inconsistent-predicate partner contradicts it.

use tracing::warn;

use trellis_core::types::collections::FxHashMap;
use trellis_core::{
    Bound, Component, InconsistentPair, Label, ReasonerConfig, TrellisError, TrellisResult,
    UpdateMode, World,
};

use crate::interpretation::Snapshot;
use crate::trace::{CauseKind, RuleTrace, TraceEntry};

/// Who proposed a bound, for trace entries and messages.
#[derive(Debug, Clone)]
pub(crate) struct Cause<'a> {
    pub name: &'a str,
    pub kind: CauseKind,
    pub time: u64,
    pub groundings: Vec<Vec<Component>>,
    /// Trace entries are written for this cause.
    pub traced: bool,
}

/// What a write should do.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Write {
    pub component: Component,
    pub label: Label,
    pub bound: Bound,
    pub mode: UpdateMode,
    pub make_static: bool,
}

/// Bounds already forced per atom in the current timestep. Repeating one is
/// applied but not counted as a change.
pub(crate) type ForcedWrites = FxHashMap<(Component, Label), Vec<Bound>>;

/// Accumulated effect of one or more commits.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct CommitStats {
    pub changes: usize,
    pub max_delta: f64,
    pub inconsistencies: usize,
}

impl CommitStats {
    fn changed(&mut self, previous: &Bound, current: &Bound) {
        self.changes += 1;
        self.max_delta = self.max_delta.max(current.max_delta(previous));
    }

    pub fn absorb(&mut self, other: CommitStats) {
        self.changes += other.changes;
        self.max_delta = self.max_delta.max(other.max_delta);
        self.inconsistencies += other.inconsistencies;
    }
}

pub(crate) struct Committer<'a> {
    pub config: &'a ReasonerConfig,
    pub ipl: &'a [InconsistentPair],
    pub trace: &'a mut RuleTrace,
    pub forced: &'a mut ForcedWrites,
    pub time: u64,
    pub pass: u64,
}

impl Committer<'_> {
    fn partners(&self, label: Label) -> impl Iterator<Item = Label> + '_ {
        self.ipl.iter().filter_map(move |pair| pair.partner_of(label))
    }

    pub fn commit(
        &mut self,
        snapshot: &mut Snapshot,
        write: Write,
        cause: &Cause<'_>,
    ) -> TrellisResult<CommitStats> {
        let mut stats = CommitStats::default();
        let partners: Vec<Label> = self.partners(write.label).collect();
        let world = snapshot.world_mut(write.component);
        let previous = world.bound(write.label);

        if world.is_static(write.label) {
            if previous != write.bound {
                self.record(
                    cause,
                    &write,
                    previous,
                    previous,
                    true,
                    Some(format!("{} is static; proposed {} ignored", write.label, write.bound)),
                );
            }
            return Ok(stats);
        }

        let candidate = match write.mode {
            UpdateMode::Override => write.bound,
            UpdateMode::Intersection => previous.intersect(&write.bound),
        };
        let conflict = if candidate.is_empty() {
            Some(format!(
                "{} proposed {} for {}({}) which does not overlap {}",
                cause.name, write.bound, write.label, write.component, previous
            ))
        } else {
            let complement = candidate.complement();
            partners.iter().find_map(|&partner| {
                let held = world.get(partner)?;
                held.intersect(&complement).is_empty().then(|| {
                    format!(
                        "{} proposed {} for {}({}) contradicting {} {}",
                        cause.name, write.bound, write.label, write.component, partner, held
                    )
                })
            })
        };

        match conflict {
            None => {
                let stored = candidate.with_static(write.make_static);
                world.set(write.label, stored);
                if stored != previous {
                    stats.changed(&previous, &stored);
                    self.record(cause, &write, previous, stored, true, None);
                }
                self.propagate_ipl(world, &write, stored, &partners, cause, &mut stats);
            }
            Some(message) => self.resolve(world, &write, previous, &partners, cause, message, &mut stats)?,
        }
        Ok(stats)
    }

    /// Tighten every partner of `label` against the complement of `stored`.
    fn propagate_ipl(
        &mut self,
        world: &mut World,
        write: &Write,
        stored: Bound,
        partners: &[Label],
        cause: &Cause<'_>,
        stats: &mut CommitStats,
    ) {
        let complement = stored.complement();
        for &partner in partners {
            if world.is_static(partner) {
                continue;
            }
            let held = world.bound(partner);
            let tightened = held.intersect(&complement);
            if tightened.is_empty() {
                continue;
            }
            if tightened == held {
                world.insert_scope(partner);
                continue;
            }
            world.set(partner, tightened);
            stats.changed(&held, &tightened);
            let partner_write = Write {
                label: partner,
                ..*write
            };
            let ipl_cause = Cause {
                kind: CauseKind::Ipl,
                groundings: Vec::new(),
                ..cause.clone()
            };
            self.record(&ipl_cause, &partner_write, held, tightened, true, None);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn resolve(
        &mut self,
        world: &mut World,
        write: &Write,
        previous: Bound,
        partners: &[Label],
        cause: &Cause<'_>,
        message: String,
        stats: &mut CommitStats,
    ) -> TrellisResult<()> {
        if self.config.abort_on_inconsistency {
            return Err(TrellisError::Inconsistency {
                time: self.time,
                component: write.component.to_string(),
                label: write.label.to_string(),
                message,
            });
        }
        if !self.config.inconsistency_check {
            let forced = write.bound.with_static(write.make_static);
            world.set(write.label, forced);
            let seen = self.forced.entry((write.component, write.label)).or_default();
            let repeated = seen.contains(&forced);
            if !repeated {
                seen.push(forced);
            }
            if forced != previous && !repeated {
                stats.changed(&previous, &forced);
            }
            self.record(cause, write, previous, forced, true, None);
            return Ok(());
        }

        warn!(time = self.time, component = %write.component, label = %write.label, "{message}");
        stats.inconsistencies += 1;
        let reset = Bound::UNKNOWN.with_static(true);
        world.set(write.label, reset);
        stats.changed(&previous, &reset);
        self.record(cause, write, previous, reset, false, Some(message.clone()));
        for &partner in partners {
            let held = world.bound(partner);
            world.set(partner, reset);
            if held != reset {
                stats.changed(&held, &reset);
            }
            let partner_write = Write {
                label: partner,
                ..*write
            };
            self.record(cause, &partner_write, held, reset, false, Some(message.clone()));
        }
        Ok(())
    }

    fn record(
        &mut self,
        cause: &Cause<'_>,
        write: &Write,
        old_bound: Bound,
        new_bound: Bound,
        consistent: bool,
        message: Option<String>,
    ) {
        if !cause.traced || !self.config.store_interpretation_changes {
            return;
        }
        self.trace.push(TraceEntry {
            time: self.time,
            cause_time: cause.time,
            pass: self.pass,
            component: write.component,
            label: write.label,
            old_bound,
            new_bound,
            cause: cause.name.to_string(),
            cause_kind: cause.kind,
            consistent,
            message,
            groundings: cause.groundings.clone(),
        });
    }
}
