//! Process-wide string interner for labels and node ids.
//!
//! Label and node names are interned once into a `ThreadedRodeo`, so the
//! handles are `Copy` and compare in O(1). The interner is append-only and
//! shared across threads; rayon workers intern inferred names safely.

use std::sync::OnceLock;

use lasso::{Spur, ThreadedRodeo};

static INTERNER: OnceLock<ThreadedRodeo> = OnceLock::new();

fn interner() -> &'static ThreadedRodeo {
    INTERNER.get_or_init(ThreadedRodeo::default)
}

/// Intern `value`, returning its stable key.
pub fn intern(value: &str) -> Spur {
    interner().get_or_intern(value)
}

/// Look up `value` without interning it.
pub fn lookup(value: &str) -> Option<Spur> {
    interner().get(value)
}

/// Resolve a key back to its text.
pub fn resolve(key: Spur) -> &'static str {
    interner().resolve(&key)
}

/// Number of distinct strings interned so far.
pub fn interned_count() -> usize {
    interner().len()
}
