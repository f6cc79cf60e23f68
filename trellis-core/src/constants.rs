//! Engine-wide constants.

/// Environment variable read by [`crate::tracing::init_tracing`].
pub const LOG_ENV_VAR: &str = "TRELLIS_LOG";

/// Default log filter when [`LOG_ENV_VAR`] is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Fact name given to facts derived from graph attributes.
pub const GRAPH_ATTRIBUTE_FACT: &str = "graph-attribute-fact";

/// Percent thresholds are compared as `satisfying * PERCENT_BASE` against `thresh * candidates`.
pub const PERCENT_BASE: f64 = 100.0;

/// Built-in annotation function names.
pub const ANN_AVERAGE: &str = "average";
pub const ANN_AVERAGE_LOWER: &str = "average_lower";
pub const ANN_MAXIMUM: &str = "maximum";
pub const ANN_MINIMUM: &str = "minimum";
