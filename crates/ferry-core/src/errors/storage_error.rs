//! Storage errors raised by the SQLite layer.

use rusqlite::ErrorCode;

use super::error_code::{self, FerryErrorCode};

/// Errors surfaced by statement preparation, execution, and transactions.
///
/// Every variant that originates in SQLite carries the action tag of the
/// handle that raised it, so a failure inside the migration engine is
/// always reported with `action = "migrate"`.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error during {action} (code {code:?}): {message}")]
    Sqlite {
        action: &'static str,
        code: Option<i32>,
        message: String,
    },

    #[error("database busy during {action}: {message}")]
    DbBusy { action: &'static str, message: String },

    #[error("database corruption detected during {action}: {message}")]
    DbCorrupt { action: &'static str, message: String },

    #[error("disk full during {action}")]
    DiskFull { action: &'static str },

    #[error("statement interrupted during {action}")]
    Interrupted { action: &'static str },
}

impl StorageError {
    /// Classify a rusqlite error under the given action tag.
    pub fn from_sqlite(action: &'static str, err: &rusqlite::Error) -> Self {
        let message = err.to_string();
        match err.sqlite_error() {
            Some(ffi) => match ffi.code {
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
                    Self::DbBusy { action, message }
                }
                ErrorCode::DatabaseCorrupt | ErrorCode::NotADatabase => {
                    Self::DbCorrupt { action, message }
                }
                ErrorCode::DiskFull => Self::DiskFull { action },
                ErrorCode::OperationInterrupted => Self::Interrupted { action },
                _ => Self::Sqlite {
                    action,
                    code: Some(ffi.extended_code),
                    message,
                },
            },
            None => Self::Sqlite {
                action,
                code: None,
                message,
            },
        }
    }

    /// The action tag this error was raised under.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Sqlite { action, .. }
            | Self::DbBusy { action, .. }
            | Self::DbCorrupt { action, .. }
            | Self::DiskFull { action }
            | Self::Interrupted { action } => *action,
        }
    }
}

impl FerryErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::DbBusy { .. } => error_code::DB_BUSY,
            Self::DbCorrupt { .. } => error_code::DB_CORRUPT,
            Self::DiskFull { .. } => error_code::DISK_FULL,
            Self::Interrupted { .. } => error_code::INTERRUPTED,
            Self::Sqlite { .. } => error_code::STORAGE_ERROR,
        }
    }
}
