//! ReasonerConfig defaults, TOML loading and convergence predicates.

use trellis_core::*;

#[test]
fn defaults_match_documented_surface() {
    let config = ReasonerConfig::default();
    assert!(!config.atom_trace);
    assert!(config.inconsistency_check);
    assert!(config.static_graph_facts);
    assert!(config.store_interpretation_changes);
    assert!(!config.parallel_computing);
    assert!(!config.allow_ground_rules);
    assert!(!config.persistent);
    assert!(!config.abort_on_inconsistency);
    assert!(!config.save_graph_attributes_to_trace);
    assert_eq!(config.update_mode, UpdateMode::Intersection);
    assert_eq!(config.convergence.mode, ConvergenceMode::Perfect);
    assert!(!config.effective_persistent());
}

#[test]
fn partial_toml_keeps_defaults() {
    let config = ReasonerConfig::from_toml(
        r#"
        atom_trace = true
        persistent = true
        update_mode = "override"

        [convergence]
        mode = "delta_bound"
        threshold = 0.05
        "#,
    )
    .unwrap();
    assert!(config.atom_trace);
    assert!(config.effective_persistent());
    assert_eq!(config.update_mode, UpdateMode::Override);
    assert_eq!(config.convergence.mode, ConvergenceMode::DeltaBound);
    assert!((config.convergence.threshold - 0.05).abs() < 1e-12);
    assert!(config.inconsistency_check);
}

#[test]
fn canonical_implies_persistence() {
    let config = ReasonerConfig::from_toml("canonical = true").unwrap();
    assert!(!config.persistent);
    assert!(config.effective_persistent());
}

#[test]
fn malformed_toml_is_a_config_error() {
    let err = ReasonerConfig::from_toml("atom_trace = \"yes\"").unwrap_err();
    let wrapped: TrellisError = err.into();
    assert!(matches!(wrapped, TrellisError::Config(_)));
    assert_eq!(wrapped.error_code(), trellis_core::errors::codes::CONFIG_INVALID);
}

#[test]
fn convergence_predicates() {
    assert!(ConvergenceConfig::perfect().is_converged(0, 0.0));
    assert!(!ConvergenceConfig::perfect().is_converged(1, 0.0));

    let by_count = ConvergenceConfig::delta_interpretation(2);
    assert!(by_count.is_converged(2, 0.9));
    assert!(!by_count.is_converged(3, 0.0));

    let by_bound = ConvergenceConfig::delta_bound(0.1);
    assert!(by_bound.is_converged(40, 0.05));
    assert!(!by_bound.is_converged(1, 0.5));
}

#[test]
fn tracing_init_is_idempotent() {
    let first = trellis_core::tracing::init_tracing_with("debug");
    let second = trellis_core::tracing::init_tracing_with("debug");
    assert!(!(first && second));
}
