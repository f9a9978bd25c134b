//! Tests for layered configuration loading.

use std::sync::Mutex;
use std::time::Duration;

use ferry_core::config::{ConfigOverrides, FerryConfig, MigrationConfig};
use ferry_core::constants;
use ferry_core::errors::ConfigError;

/// Serializes tests that touch `HOME` and `FERRY_*` variables.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const FERRY_VARS: &[&str] = &[
    "FERRY_MIGRATION_MAX_EXPECTING_MS",
    "FERRY_MIGRATION_MAX_INITIALIZE_MS",
    "FERRY_MIGRATION_SAMPLE_COUNT",
    "FERRY_MIGRATION_TRANSACTION_CEILING_MS",
    "FERRY_CONNECTION_BUSY_TIMEOUT_MS",
];

/// Point `HOME` at an empty directory and clear every `FERRY_*` var.
fn isolated_env(home: &std::path::Path) {
    std::env::set_var("HOME", home);
    for var in FERRY_VARS {
        std::env::remove_var(var);
    }
}

#[test]
fn test_defaults() {
    let config = FerryConfig::default();
    assert_eq!(
        config.migration.effective_max_expecting(),
        constants::DEFAULT_MAX_EXPECTING_DURATION
    );
    assert_eq!(
        config.migration.effective_max_initialize(),
        Duration::from_millis(5)
    );
    assert_eq!(config.migration.effective_sample_count(), 10);
    assert_eq!(
        config.migration.effective_transaction_ceiling(),
        Duration::from_secs(1)
    );
    assert_eq!(
        config.connection.effective_busy_timeout(),
        Duration::from_secs(5)
    );
    assert!(config.connection.effective_wal());
    assert!(FerryConfig::validate(&config).is_ok());
}

#[test]
fn test_from_toml_partial() {
    let config = FerryConfig::from_toml(
        r#"
        [migration]
        max_expecting_ms = 20
        sample_count = 4

        [connection]
        wal = false
        "#,
    )
    .unwrap();
    assert_eq!(config.migration.max_expecting_ms, Some(20));
    assert_eq!(config.migration.max_initialize_ms, None);
    assert_eq!(config.migration.effective_sample_count(), 4);
    assert!(!config.connection.effective_wal());
}

#[test]
fn test_from_toml_rejects_garbage() {
    let err = FerryConfig::from_toml("[migration\nmax = ").unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
}

#[test]
fn test_validation_rules() {
    let invalid = [
        MigrationConfig {
            max_expecting_ms: Some(0),
            ..Default::default()
        },
        MigrationConfig {
            max_expecting_ms: Some(4),
            max_initialize_ms: Some(5),
            ..Default::default()
        },
        MigrationConfig {
            transaction_ceiling_ms: Some(5),
            ..Default::default()
        },
        MigrationConfig {
            sample_count: Some(0),
            ..Default::default()
        },
        MigrationConfig {
            sample_count: Some(constants::MAX_SAMPLE_COUNT + 1),
            ..Default::default()
        },
    ];
    for migration in invalid {
        let config = FerryConfig {
            migration: migration.clone(),
            ..Default::default()
        };
        assert!(
            matches!(
                FerryConfig::validate(&config),
                Err(ConfigError::ValidationFailed { .. })
            ),
            "accepted {migration:?}"
        );
    }
}

#[test]
fn test_layered_resolution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    let home = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    isolated_env(home.path());

    std::fs::create_dir_all(home.path().join(".ferry")).unwrap();
    std::fs::write(
        home.path().join(".ferry").join("config.toml"),
        "[migration]\nmax_expecting_ms = 30\nmax_initialize_ms = 3\nsample_count = 6\n",
    )
    .unwrap();
    std::fs::write(
        project.path().join("ferry.toml"),
        "[migration]\nmax_expecting_ms = 40\n",
    )
    .unwrap();
    std::env::set_var("FERRY_MIGRATION_SAMPLE_COUNT", "8");

    let overrides = ConfigOverrides {
        busy_timeout_ms: Some(250),
        ..Default::default()
    };
    let config = FerryConfig::load(project.path(), Some(&overrides));
    std::env::remove_var("FERRY_MIGRATION_SAMPLE_COUNT");
    let config = config.unwrap();

    // project beats user, user fills what project leaves unset
    assert_eq!(config.migration.max_expecting_ms, Some(40));
    assert_eq!(config.migration.max_initialize_ms, Some(3));
    // env beats files
    assert_eq!(config.migration.sample_count, Some(8));
    // overrides beat everything
    assert_eq!(
        config.connection.effective_busy_timeout(),
        Duration::from_millis(250)
    );
}

#[test]
fn test_sample_count_override_beats_env_and_files() {
    let _lock = ENV_MUTEX.lock().unwrap();
    let home = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    isolated_env(home.path());

    std::fs::write(
        project.path().join("ferry.toml"),
        "[migration]\nsample_count = 4\n",
    )
    .unwrap();
    std::env::set_var("FERRY_MIGRATION_SAMPLE_COUNT", "8");

    let overrides = ConfigOverrides {
        sample_count: Some(12),
        ..Default::default()
    };
    let config = FerryConfig::load(project.path(), Some(&overrides));
    std::env::remove_var("FERRY_MIGRATION_SAMPLE_COUNT");
    assert_eq!(config.unwrap().migration.effective_sample_count(), 12);

    // Overrides are validated like every other layer.
    let overrides = ConfigOverrides {
        sample_count: Some(0),
        ..Default::default()
    };
    let err = FerryConfig::load(project.path(), Some(&overrides)).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationFailed { .. }));
}

#[test]
fn test_load_rejects_invalid_result() {
    let _lock = ENV_MUTEX.lock().unwrap();
    let home = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    isolated_env(home.path());

    let overrides = ConfigOverrides {
        max_expecting_ms: Some(2),
        max_initialize_ms: Some(3),
        ..Default::default()
    };
    let err = FerryConfig::load(project.path(), Some(&overrides)).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationFailed { .. }));
}

#[test]
fn test_malformed_user_config_is_fatal() {
    let _lock = ENV_MUTEX.lock().unwrap();
    let home = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    isolated_env(home.path());

    std::fs::create_dir_all(home.path().join(".ferry")).unwrap();
    std::fs::write(home.path().join(".ferry").join("config.toml"), "not = [valid").unwrap();

    let err = FerryConfig::load(project.path(), None).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
}

#[test]
fn test_toml_roundtrip_keeps_values() {
    let config = FerryConfig::from_toml("[migration]\ntransaction_ceiling_ms = 200\n").unwrap();
    let reparsed = FerryConfig::from_toml(&config.to_toml().unwrap()).unwrap();
    assert_eq!(config, reparsed);
}
