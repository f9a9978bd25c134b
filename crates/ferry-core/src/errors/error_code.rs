//! FerryErrorCode trait for stable, machine-readable error codes.

/// Every error enum implements this to expose a structured code string
/// that callers can match on without parsing messages.
pub trait FerryErrorCode {
    /// Returns the error code string (e.g., "DB_BUSY").
    fn error_code(&self) -> &'static str;

    /// Returns `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const DB_BUSY: &str = "DB_BUSY";
pub const DB_CORRUPT: &str = "DB_CORRUPT";
pub const DISK_FULL: &str = "DISK_FULL";
pub const INTERRUPTED: &str = "INTERRUPTED";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const MIGRATION_FAILED: &str = "MIGRATION_FAILED";
pub const ATTACH_CONFLICT: &str = "ATTACH_CONFLICT";
pub const TABLE_NOT_FOUND: &str = "TABLE_NOT_FOUND";
pub const DEADLINE_EXCEEDED: &str = "DEADLINE_EXCEEDED";
