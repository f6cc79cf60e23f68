//! Shared primitive types: hash collections, interning, identifiers.

pub mod collections;
pub mod identifiers;
pub mod interning;
