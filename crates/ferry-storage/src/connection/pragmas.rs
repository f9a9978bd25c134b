//! PRAGMA configuration applied to every Ferry connection.
//!
//! WAL mode (file databases), NORMAL sync, configurable busy_timeout,
//! temp_store MEMORY.

use ferry_core::config::ConnectionConfig;
use ferry_core::errors::StorageError;
use rusqlite::Connection;

/// Apply performance and safety pragmas to a connection.
pub fn apply_pragmas(
    conn: &Connection,
    config: &ConnectionConfig,
    action: &'static str,
) -> Result<(), StorageError> {
    conn.busy_timeout(config.effective_busy_timeout())
        .map_err(|e| StorageError::from_sqlite(action, &e))?;

    if config.effective_wal() {
        // In-memory databases report "memory" and keep it; that is fine.
        let _mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .map_err(|e| StorageError::from_sqlite(action, &e))?;
    }

    conn.execute_batch(
        "
        PRAGMA synchronous = NORMAL;
        PRAGMA temp_store = MEMORY;
        ",
    )
    .map_err(|e| StorageError::from_sqlite(action, &e))
}

/// Verify that WAL mode is active.
pub fn verify_wal_mode(conn: &Connection, action: &'static str) -> Result<bool, StorageError> {
    let mode: String = conn
        .pragma_query_value(None, "journal_mode", |row| row.get(0))
        .map_err(|e| StorageError::from_sqlite(action, &e))?;
    Ok(mode.eq_ignore_ascii_case("wal"))
}
