pub mod convergence_config;
pub mod reasoner_config;

pub use convergence_config::{ConvergenceConfig, ConvergenceMode};
pub use reasoner_config::{ReasonerConfig, UpdateMode};
