//! Interval truth values.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::errors::{TrellisError, TrellisResult};

/// A closed interval `[lower, upper] ⊆ [0, 1]` plus a static flag.
///
/// Equality and hashing consider the interval only; `is_static` is
/// bookkeeping owned by the World that stores the bound. An intersection may
/// produce an empty interval (`lower > upper`); nothing here rejects it, the
/// consistency check interprets it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bound {
    lower: f64,
    upper: f64,
    #[serde(default, rename = "static")]
    is_static: bool,
}

impl Bound {
    /// The uninformative bound `[0, 1]`.
    pub const UNKNOWN: Bound = Bound::closed(0.0, 1.0);
    pub const TRUE: Bound = Bound::closed(1.0, 1.0);
    pub const FALSE: Bound = Bound::closed(0.0, 0.0);

    /// Construct without validation.
    pub const fn closed(lower: f64, upper: f64) -> Self {
        Self {
            lower,
            upper,
            is_static: false,
        }
    }

    /// Construct a validated bound: both ends inside [0,1] and ordered.
    pub fn new(lower: f64, upper: f64) -> TrellisResult<Self> {
        let in_range = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
        if !in_range(lower) || !in_range(upper) {
            return Err(TrellisError::BoundOutOfRange { lower, upper });
        }
        if lower > upper {
            return Err(TrellisError::BoundOrder { lower, upper });
        }
        Ok(Self::closed(lower, upper))
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn set_static(&mut self, is_static: bool) {
        self.is_static = is_static;
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    /// `[max(lowers), min(uppers)]`. The result is never static.
    pub fn intersect(&self, other: &Bound) -> Bound {
        Bound::closed(self.lower.max(other.lower), self.upper.min(other.upper))
    }

    /// `lower > upper`: the signal for an inconsistency.
    pub fn is_empty(&self) -> bool {
        self.lower > self.upper
    }

    /// `self ⊆ target`.
    pub fn is_subset_of(&self, target: &Bound) -> bool {
        target.lower <= self.lower && self.upper <= target.upper
    }

    pub fn overlaps(&self, other: &Bound) -> bool {
        !self.intersect(other).is_empty()
    }

    /// The bound a mutually exclusive partner must lie in: `[1-upper, 1-lower]`.
    pub fn complement(&self) -> Bound {
        Bound::closed(1.0 - self.upper, 1.0 - self.lower)
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Largest movement of either end between two bounds.
    pub fn max_delta(&self, other: &Bound) -> f64 {
        (self.lower - other.lower)
            .abs()
            .max((self.upper - other.upper).abs())
    }

    /// Clamp both ends into [0,1]; an inverted pair collapses to `[0,1]`.
    pub fn clamped(lower: f64, upper: f64) -> Bound {
        if lower.is_nan() || upper.is_nan() || lower > upper {
            return Bound::UNKNOWN;
        }
        Bound::closed(lower.clamp(0.0, 1.0), upper.clamp(0.0, 1.0))
    }
}

impl Default for Bound {
    fn default() -> Self {
        Bound::UNKNOWN
    }
}

impl PartialEq for Bound {
    fn eq(&self, other: &Self) -> bool {
        self.lower == other.lower && self.upper == other.upper
    }
}

impl Hash for Bound {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // +0.0 normalises -0.0 so equal bounds hash equally.
        (self.lower + 0.0).to_bits().hash(state);
        (self.upper + 0.0).to_bits().hash(state);
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.lower, self.upper)
    }
}
