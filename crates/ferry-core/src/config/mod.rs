//! Configuration system for Ferry.
//! TOML-based, layered resolution: overrides > env > project > user > defaults.

pub mod connection_config;
pub mod ferry_config;
pub mod migration_config;

pub use connection_config::ConnectionConfig;
pub use ferry_config::{ConfigOverrides, FerryConfig};
pub use migration_config::MigrationConfig;
