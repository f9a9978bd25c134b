//! Migration engine errors.

use super::error_code::{self, FerryErrorCode};
use super::StorageError;

/// Errors that can occur while attaching sources or migrating rows.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("schema {current} is already attached; detach before attaching {requested}")]
    AlreadyAttached { current: String, requested: String },

    #[error("table {schema}.{table} not found")]
    TableNotFound { schema: String, table: String },

    #[error("table {table} has no columns to migrate")]
    NoColumns { table: String },

    #[error("invalid migration for table {table}: {message}")]
    InvalidUserInfo { table: String, message: String },

    #[error("migration transaction for {table} exceeded the {limit_ms}ms ceiling")]
    TransactionDeadlineExceeded { table: String, limit_ms: u64 },
}

impl FerryErrorCode for MigrationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Storage(e) => e.error_code(),
            Self::AlreadyAttached { .. } => error_code::ATTACH_CONFLICT,
            Self::TableNotFound { .. } => error_code::TABLE_NOT_FOUND,
            Self::TransactionDeadlineExceeded { .. } => error_code::DEADLINE_EXCEEDED,
            Self::NoColumns { .. } | Self::InvalidUserInfo { .. } => {
                error_code::MIGRATION_FAILED
            }
        }
    }
}
