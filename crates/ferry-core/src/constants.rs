//! Shared constants for the Ferry migration engine.

use std::time::Duration;

/// Action tag attached to every error raised by the migration engine.
pub const ACTION_MIGRATE: &str = "migrate";

/// Action tag for errors raised by a plain handle.
pub const ACTION_HANDLE: &str = "handle";

/// Target total duration of one migration transaction (default: 10ms).
pub const DEFAULT_MAX_EXPECTING_DURATION: Duration = Duration::from_millis(10);

/// Work budget used before any sample exists (default: 5ms).
pub const DEFAULT_MAX_INITIALIZE_DURATION: Duration = Duration::from_millis(5);

/// Number of (work, total) samples kept by the budgeter.
pub const DEFAULT_SAMPLE_COUNT: usize = 10;

/// Upper bound on sample count accepted by config validation.
pub const MAX_SAMPLE_COUNT: usize = 1024;

/// Hard wall-clock ceiling on a single migration transaction (default: 1s).
pub const DEFAULT_TRANSACTION_CEILING: Duration = Duration::from_millis(1000);

/// SQLite busy timeout (default: 5s).
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Prefix of schema aliases used for attached source databases.
pub const MIGRATION_SCHEMA_PREFIX: &str = "ferry_migration_";

/// Table name prefix reserved by SQLite.
pub const SQLITE_BUILTIN_TABLE_PREFIX: &str = "sqlite_";

/// Table name prefix reserved by Ferry.
pub const FERRY_BUILTIN_TABLE_PREFIX: &str = "ferry_";
