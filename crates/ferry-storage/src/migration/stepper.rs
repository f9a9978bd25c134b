//! One atomic unit of migration work: copy a row, then delete it from the source.

use ferry_core::errors::StorageError;
use rusqlite::Connection;

use super::info::MigrationInfo;

/// Result of a single [`transfer_one_row`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowTransfer {
    /// One row moved from source to target.
    Copied,
    /// The source has no eligible rows left; nothing was deleted.
    Exhausted,
}

/// Copy the next source row into the target and delete it from the source.
///
/// Must run inside an open transaction: the copy and the delete commit or
/// roll back together, so a row is never in both tables and never in
/// neither. Statements come from the connection's statement cache and are
/// reset before every execution.
pub fn transfer_one_row(
    conn: &Connection,
    info: &MigrationInfo,
    action: &'static str,
) -> Result<RowTransfer, StorageError> {
    debug_assert!(
        !conn.is_autocommit(),
        "row transfer requires an open transaction"
    );
    let sqlite = |e: rusqlite::Error| StorageError::from_sqlite(action, &e);

    let copied = conn
        .prepare_cached(info.statement_for_migrating_one_row())
        .and_then(|mut stmt| stmt.execute([]))
        .map_err(sqlite)?;
    if copied == 0 {
        return Ok(RowTransfer::Exhausted);
    }

    conn.prepare_cached(info.statement_for_deleting_migrated_one_row())
        .and_then(|mut stmt| stmt.execute([]))
        .map_err(sqlite)?;
    Ok(RowTransfer::Copied)
}
