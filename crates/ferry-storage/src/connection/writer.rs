//! Write transactions: BEGIN IMMEDIATE, commit on success, rollback otherwise.

use ferry_core::errors::StorageError;
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Run `f` inside a BEGIN IMMEDIATE transaction.
///
/// The write lock is taken at transaction start, so `f` never hits
/// SQLITE_BUSY halfway through. If `f` returns `Err` (or panics) the
/// transaction is rolled back when it is dropped; nothing `f` did lands.
pub fn with_immediate_transaction<T, E, F>(
    conn: &Connection,
    action: &'static str,
    f: F,
) -> Result<T, E>
where
    F: FnOnce(&Connection) -> Result<T, E>,
    E: From<StorageError>,
{
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .map_err(|e| StorageError::from_sqlite(action, &e))?;

    let value = f(&*tx)?;

    tx.commit()
        .map_err(|e| StorageError::from_sqlite(action, &e))?;
    Ok(value)
}
