//! Built-in annotation functions.
//!
//! Each receives the per-clause annotation lists (bounds of the satisfying
//! groundings) and the rule's per-clause weights, and returns a raw
//! `(lower, upper)` pair. The caller clamps the result.

use trellis_core::Bound;

/// Weighted mean of lower and upper ends across every annotation.
pub fn average(annotations: &[&[Bound]], weights: &[f64]) -> (f64, f64) {
    let (lower, upper) = weighted_means(annotations, weights);
    (lower, upper)
}

/// Weighted mean of the lower ends; upper is the largest upper end.
pub fn average_lower(annotations: &[&[Bound]], weights: &[f64]) -> (f64, f64) {
    let (lower, _) = weighted_means(annotations, weights);
    let upper = annotations
        .iter()
        .flat_map(|clause| clause.iter().map(Bound::upper))
        .fold(None, |acc: Option<f64>, u| Some(acc.map_or(u, |a| a.max(u))));
    (lower, upper.unwrap_or(1.0))
}

pub fn maximum(annotations: &[&[Bound]], _weights: &[f64]) -> (f64, f64) {
    fold_ends(annotations, f64::max).unwrap_or((0.0, 1.0))
}

pub fn minimum(annotations: &[&[Bound]], _weights: &[f64]) -> (f64, f64) {
    fold_ends(annotations, f64::min).unwrap_or((0.0, 1.0))
}

fn weighted_means(annotations: &[&[Bound]], weights: &[f64]) -> (f64, f64) {
    let mut lower = 0.0;
    let mut upper = 0.0;
    let mut total = 0.0;
    for (i, clause) in annotations.iter().enumerate() {
        let weight = weights.get(i).copied().unwrap_or(1.0);
        for bound in clause.iter() {
            lower += weight * bound.lower();
            upper += weight * bound.upper();
            total += weight;
        }
    }
    if total <= 0.0 {
        return (0.0, 1.0);
    }
    (lower / total, upper / total)
}

fn fold_ends(annotations: &[&[Bound]], pick: fn(f64, f64) -> f64) -> Option<(f64, f64)> {
    annotations
        .iter()
        .flat_map(|clause| clause.iter())
        .fold(None, |acc, bound| match acc {
            None => Some((bound.lower(), bound.upper())),
            Some((l, u)) => Some((pick(l, bound.lower()), pick(u, bound.upper()))),
        })
}
