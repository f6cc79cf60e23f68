//! Interned identifiers: predicate labels and graph node ids.
//!
//! Both are thin `Copy` wrappers around a `lasso::Spur`. Equality and hashing
//! use the key; ordering uses the resolved text so that every sorted output
//! (trace tables, interpretation dumps) is stable across runs.

use std::cmp::Ordering;
use std::fmt;

use lasso::Spur;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::interning;

macro_rules! interned_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(Spur);

        impl $name {
            /// Intern `name` and return its handle.
            pub fn new(name: &str) -> Self {
                Self(interning::intern(name))
            }

            /// Returns the handle if `name` has been interned already.
            pub fn existing(name: &str) -> Option<Self> {
                interning::lookup(name).map(Self)
            }

            pub fn as_str(&self) -> &'static str {
                interning::resolve(self.0)
            }

            pub fn key(&self) -> Spur {
                self.0
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                if self.0 == other.0 {
                    return Ordering::Equal;
                }
                self.as_str().cmp(other.as_str())
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok(Self::new(&s))
            }
        }
    };
}

interned_id!(
    /// A predicate name. Two labels are equal iff their names are equal.
    Label
);

interned_id!(
    /// A graph node identifier.
    NodeId
);

/// Whether `name` is acceptable as a predicate label or rule variable:
/// starts with a letter or `_`, continues with alphanumerics or `_`.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Whether `name` is acceptable as a node id. Node ids are looser than
/// labels (they come from graph files) but may not contain whitespace or the
/// rule-syntax delimiters.
pub fn is_valid_node_id(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '[' | ']' | ',' | ':' | '~'))
}
