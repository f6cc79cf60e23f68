//! Stable error codes surfaced alongside every `TrellisError`.

pub const MISSING_GRAPH: &str = "CONFIG_MISSING_GRAPH";
pub const MISSING_RULES: &str = "CONFIG_MISSING_RULES";
pub const CONFIG_INVALID: &str = "CONFIG_INVALID";
pub const BOUND_RANGE: &str = "PARSE_BOUND_RANGE";
pub const BOUND_ORDER: &str = "PARSE_BOUND_ORDER";
pub const INVALID_IDENTIFIER: &str = "PARSE_INVALID_IDENTIFIER";
pub const INVALID_RULE: &str = "PARSE_INVALID_RULE";
pub const INVALID_FACT: &str = "PARSE_INVALID_FACT";
pub const UNKNOWN_ANNOTATION_FUNCTION: &str = "UNKNOWN_ANNOTATION_FUNCTION";
pub const UNKNOWN_HEAD_FUNCTION: &str = "UNKNOWN_HEAD_FUNCTION";
pub const INCONSISTENCY: &str = "REASONING_INCONSISTENCY";
pub const SERIALIZATION: &str = "SERIALIZATION_ERROR";

/// Maps an error to a stable, machine-readable code.
pub trait TrellisErrorCode {
    fn error_code(&self) -> &'static str;
}
