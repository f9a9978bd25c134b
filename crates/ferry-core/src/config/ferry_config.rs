//! Top-level Ferry configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{ConnectionConfig, MigrationConfig};
use crate::constants::MAX_SAMPLE_COUNT;
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. Programmatic overrides (`ConfigOverrides`)
/// 2. Environment variables (`FERRY_*`)
/// 3. Project config (`ferry.toml` in the project root)
/// 4. User config (`~/.ferry/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct FerryConfig {
    pub migration: MigrationConfig,
    pub connection: ConnectionConfig,
}

/// Overrides applied on top of every other layer.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub max_expecting_ms: Option<u64>,
    pub max_initialize_ms: Option<u64>,
    pub transaction_ceiling_ms: Option<u64>,
    pub sample_count: Option<usize>,
    pub busy_timeout_ms: Option<u64>,
}

impl FerryConfig {
    /// Load configuration with layered resolution rooted at `root`.
    pub fn load(root: &Path, overrides: Option<&ConfigOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                if let Err(e) = Self::merge_toml_file(&mut config, &user_config_path) {
                    match e {
                        ConfigError::ParseError { .. } => return Err(e),
                        _ => tracing::warn!(
                            path = %user_config_path.display(),
                            error = %e,
                            "ignoring unreadable user config"
                        ),
                    }
                }
            }
        }

        let project_config_path = root.join("ferry.toml");
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        Self::apply_env_overrides(&mut config);

        if let Some(overrides) = overrides {
            Self::apply_overrides(&mut config, overrides);
        }

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(config: &FerryConfig) -> Result<(), ConfigError> {
        let migration = &config.migration;
        for (field, value) in [
            ("migration.max_expecting_ms", migration.max_expecting_ms),
            ("migration.max_initialize_ms", migration.max_initialize_ms),
            ("migration.transaction_ceiling_ms", migration.transaction_ceiling_ms),
        ] {
            if value == Some(0) {
                return Err(ConfigError::ValidationFailed {
                    field: field.to_string(),
                    message: "must be greater than 0".to_string(),
                });
            }
        }

        if migration.effective_max_initialize() > migration.effective_max_expecting() {
            return Err(ConfigError::ValidationFailed {
                field: "migration.max_initialize_ms".to_string(),
                message: "must not exceed migration.max_expecting_ms".to_string(),
            });
        }
        if migration.effective_transaction_ceiling() < migration.effective_max_expecting() {
            return Err(ConfigError::ValidationFailed {
                field: "migration.transaction_ceiling_ms".to_string(),
                message: "must be at least migration.max_expecting_ms".to_string(),
            });
        }

        let samples = migration.effective_sample_count();
        if !(1..=MAX_SAMPLE_COUNT).contains(&samples) {
            return Err(ConfigError::ValidationFailed {
                field: "migration.sample_count".to_string(),
                message: format!("must be between 1 and {MAX_SAMPLE_COUNT}"),
            });
        }
        Ok(())
    }

    fn user_config_path() -> Option<PathBuf> {
        home_dir().map(|h| h.join(".ferry").join("config.toml"))
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored.
    fn merge_toml_file(config: &mut FerryConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: FerryConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`; only `Some` values in `other` win.
    fn merge(base: &mut FerryConfig, other: &FerryConfig) {
        if other.migration.max_expecting_ms.is_some() {
            base.migration.max_expecting_ms = other.migration.max_expecting_ms;
        }
        if other.migration.max_initialize_ms.is_some() {
            base.migration.max_initialize_ms = other.migration.max_initialize_ms;
        }
        if other.migration.sample_count.is_some() {
            base.migration.sample_count = other.migration.sample_count;
        }
        if other.migration.transaction_ceiling_ms.is_some() {
            base.migration.transaction_ceiling_ms = other.migration.transaction_ceiling_ms;
        }

        if other.connection.busy_timeout_ms.is_some() {
            base.connection.busy_timeout_ms = other.connection.busy_timeout_ms;
        }
        if other.connection.wal.is_some() {
            base.connection.wal = other.connection.wal;
        }
    }

    /// Pattern: `FERRY_MIGRATION_MAX_EXPECTING_MS`, `FERRY_CONNECTION_BUSY_TIMEOUT_MS`, etc.
    fn apply_env_overrides(config: &mut FerryConfig) {
        if let Some(v) = env_parse("FERRY_MIGRATION_MAX_EXPECTING_MS") {
            config.migration.max_expecting_ms = Some(v);
        }
        if let Some(v) = env_parse("FERRY_MIGRATION_MAX_INITIALIZE_MS") {
            config.migration.max_initialize_ms = Some(v);
        }
        if let Some(v) = env_parse("FERRY_MIGRATION_SAMPLE_COUNT") {
            config.migration.sample_count = Some(v);
        }
        if let Some(v) = env_parse("FERRY_MIGRATION_TRANSACTION_CEILING_MS") {
            config.migration.transaction_ceiling_ms = Some(v);
        }
        if let Some(v) = env_parse("FERRY_CONNECTION_BUSY_TIMEOUT_MS") {
            config.connection.busy_timeout_ms = Some(v);
        }
    }

    fn apply_overrides(config: &mut FerryConfig, overrides: &ConfigOverrides) {
        if let Some(v) = overrides.max_expecting_ms {
            config.migration.max_expecting_ms = Some(v);
        }
        if let Some(v) = overrides.max_initialize_ms {
            config.migration.max_initialize_ms = Some(v);
        }
        if let Some(v) = overrides.transaction_ceiling_ms {
            config.migration.transaction_ceiling_ms = Some(v);
        }
        if let Some(v) = overrides.sample_count {
            config.migration.sample_count = Some(v);
        }
        if let Some(v) = overrides.busy_timeout_ms {
            config.connection.busy_timeout_ms = Some(v);
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Cross-platform home directory resolution.
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
