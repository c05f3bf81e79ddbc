use std::fs;
use std::time::Duration;

use armcell::domains::collision::AuditMode;
use armcell::domains::kinematics::ReachabilityMode;
use armcell::Config;
use tempfile::tempdir;

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.reachability.mode, ReachabilityMode::Strict);
    assert_eq!(config.audit.mode, AuditMode::Spatial);
    assert_eq!(config.optimizer.horizon_ms, 1_000_000);
    assert_eq!(config.pipeline_timeout(), Duration::from_secs(30));
    assert!(config.path.via_points);
    assert!(config.validate().is_ok());

    let budget = config.solver_budget();
    assert_eq!(budget.time_limit, Some(Duration::from_secs(10)));
    assert!(!budget.accept_bounded);
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let config = Config::from_toml_str(
        r#"
        [reachability]
        mode = "permissive"

        [optimizer]
        node_limit = 5000
        accept_bounded = true
        max_relative_gap = 0.1

        [audit]
        mode = "temporal"
        accelerated = true
        "#,
    )
    .unwrap();

    assert_eq!(config.reachability.mode, ReachabilityMode::Permissive);
    assert_eq!(config.optimizer.time_limit_ms, 10_000);
    assert_eq!(config.audit.mode, AuditMode::Temporal);
    assert_eq!(config.audit.stride, 4);

    let settings = config.planning_settings();
    assert_eq!(settings.reachability_mode, ReachabilityMode::Permissive);
    assert_eq!(settings.budget.node_limit, Some(5000));
    assert!(settings.budget.accept_bounded);
    assert_eq!(settings.budget.max_relative_gap, 0.1);
    assert_eq!(settings.auditor.mode(), AuditMode::Temporal);
}

#[test]
fn test_invalid_values_are_rejected() {
    assert!(Config::from_toml_str("[path]\nvia_fraction = 1.5\n").is_err());
    assert!(Config::from_toml_str("[optimizer]\nmax_relative_gap = -0.1\n").is_err());
    assert!(Config::from_toml_str("[pipeline]\ntimeout_ms = 0\n").is_err());
    assert!(Config::from_toml_str("[reachability]\nmode = \"sometimes\"\n").is_err());
}

#[tokio::test]
async fn test_config_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("armcell.toml");
    fs::write(&path, "[pipeline]\ntimeout_ms = 1500\n\n[logging]\nlevel = \"debug\"\n").unwrap();

    let config = Config::from_file(&path).await.unwrap();
    assert_eq!(config.pipeline_timeout(), Duration::from_millis(1500));
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.file.is_none());
}

#[test]
fn test_load_layers_file_over_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("armcell.toml");
    fs::write(&path, "[path]\nvia_points = false\nvia_offset = 0.1\n").unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert!(!config.path.via_points);
    assert_eq!(config.path_options().via_offset, 0.1);
    assert_eq!(config.path.via_fraction, 0.6);
}

#[test]
fn test_environment_overrides_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("armcell.toml");
    fs::write(&path, "[audit]\nmode = \"spatial\"\nstride = 8\n\n[optimizer]\nnode_limit = 100\n").unwrap();

    // only this test sets ARMCELL__* variables in this binary
    std::env::set_var("ARMCELL__AUDIT__MODE", "temporal");
    std::env::set_var("ARMCELL__OPTIMIZER__NODE_LIMIT", "2500");
    let loaded = Config::load(Some(&path));
    std::env::remove_var("ARMCELL__AUDIT__MODE");
    std::env::remove_var("ARMCELL__OPTIMIZER__NODE_LIMIT");

    let config = loaded.unwrap();
    assert_eq!(config.audit.mode, AuditMode::Temporal);
    assert_eq!(config.audit.stride, 8);
    assert_eq!(config.optimizer.node_limit, Some(2500));
}
