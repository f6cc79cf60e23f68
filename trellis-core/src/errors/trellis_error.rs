//! Top-level error type for the reasoning engine.

use super::error_code::{self, TrellisErrorCode};

/// Errors raised by rule/fact validation, configuration, and reasoning.
///
/// Inconsistencies are normally events recorded in the rule trace; the
/// `Inconsistency` variant only surfaces when `abort_on_inconsistency` is set.
#[derive(Debug, thiserror::Error)]
pub enum TrellisError {
    #[error("reasoning requires a graph; none was loaded")]
    MissingGraph,

    #[error("reasoning requires at least one rule; none were added")]
    MissingRules,

    #[error("bound [{lower}, {upper}] is outside [0, 1]")]
    BoundOutOfRange { lower: f64, upper: f64 },

    #[error("bound lower {lower} is greater than upper {upper}")]
    BoundOrder { lower: f64, upper: f64 },

    #[error("invalid identifier {name:?}: {reason}")]
    InvalidIdentifier { name: String, reason: String },

    #[error("invalid rule {rule}: {reason}")]
    InvalidRule { rule: String, reason: String },

    #[error("invalid fact {fact}: {reason}")]
    InvalidFact { fact: String, reason: String },

    #[error("unknown annotation function {name:?} referenced by rule {rule}")]
    UnknownAnnotationFunction { name: String, rule: String },

    #[error("unknown head function {name:?} referenced by rule {rule}")]
    UnknownHeadFunction { name: String, rule: String },

    #[error("inconsistency at t={time} on {component} {label}: {message}")]
    Inconsistency {
        time: u64,
        component: String,
        label: String,
        message: String,
    },

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TrellisErrorCode for TrellisError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingGraph => error_code::MISSING_GRAPH,
            Self::MissingRules => error_code::MISSING_RULES,
            Self::BoundOutOfRange { .. } => error_code::BOUND_RANGE,
            Self::BoundOrder { .. } => error_code::BOUND_ORDER,
            Self::InvalidIdentifier { .. } => error_code::INVALID_IDENTIFIER,
            Self::InvalidRule { .. } => error_code::INVALID_RULE,
            Self::InvalidFact { .. } => error_code::INVALID_FACT,
            Self::UnknownAnnotationFunction { .. } => error_code::UNKNOWN_ANNOTATION_FUNCTION,
            Self::UnknownHeadFunction { .. } => error_code::UNKNOWN_HEAD_FUNCTION,
            Self::Inconsistency { .. } => error_code::INCONSISTENCY,
            Self::Config(_) => error_code::CONFIG_INVALID,
            Self::Serialization(_) => error_code::SERIALIZATION,
        }
    }
}

/// Convenience type alias.
pub type TrellisResult<T> = Result<T, TrellisError>;
