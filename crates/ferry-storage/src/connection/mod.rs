//! Connection handle: one SQLite connection plus the primitives the
//! migration engine consumes (execute, atomic transaction, metadata).

pub mod pragmas;
pub mod writer;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use ferry_core::config::ConnectionConfig;
use ferry_core::constants::ACTION_HANDLE;
use ferry_core::errors::StorageError;
use ferry_core::events::{FileOpenedEvent, PagerLock};
use rusqlite::Connection;

use self::pragmas::apply_pragmas;
use self::writer::with_immediate_transaction;
use crate::global::Global;
use crate::queries::metadata::{self, ColumnMeta};
use crate::schema::Schema;

const IN_MEMORY_LABEL: &str = ":memory:";

/// A single SQLite connection.
///
/// Not shareable across threads; each caller owns its own handle and the
/// storage engine's locking arbitrates between handles.
pub struct Handle {
    conn: Connection,
    path: Option<PathBuf>,
    action: &'static str,
}

impl Handle {
    /// Open (or create) a database file and apply pragmas.
    pub fn open(path: &Path, config: &ConnectionConfig) -> Result<Self, StorageError> {
        let conn =
            Connection::open(path).map_err(|e| StorageError::from_sqlite(ACTION_HANDLE, &e))?;
        apply_pragmas(&conn, config, ACTION_HANDLE)?;

        if let Some(global) = Global::shared() {
            global.registry().post_file_opened(&FileOpenedEvent {
                path: path.display().to_string(),
                read_only: false,
            });
        }
        tracing::debug!(path = %path.display(), "opened handle");

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
            action: ACTION_HANDLE,
        })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory(config: &ConnectionConfig) -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::from_sqlite(ACTION_HANDLE, &e))?;
        apply_pragmas(&conn, config, ACTION_HANDLE)?;
        Ok(Self {
            conn,
            path: None,
            action: ACTION_HANDLE,
        })
    }

    /// The underlying connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Database file path (None for in-memory).
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Action tag attached to errors raised through this handle.
    pub fn action(&self) -> &'static str {
        self.action
    }

    pub fn set_action(&mut self, action: &'static str) {
        self.action = action;
    }

    /// Wrap a rusqlite error with this handle's action tag.
    pub fn error(&self, err: &rusqlite::Error) -> StorageError {
        StorageError::from_sqlite(self.action, err)
    }

    /// Whether a transaction is currently open on this connection.
    pub fn is_in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    /// Execute one statement and return the number of changed rows.
    pub fn execute(&self, sql: &str) -> Result<usize, StorageError> {
        self.conn.execute(sql, []).map_err(|e| self.error(&e))
    }

    /// Run `f` atomically. All-or-nothing: an `Err` from `f` rolls back
    /// every statement it executed.
    pub fn run_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: From<StorageError>,
    {
        let global = Global::shared();
        let label = self.label();
        if let Some(global) = global {
            global.registry().post_will_lock(&label, PagerLock::Reserved);
        }

        let result = with_immediate_transaction(&self.conn, self.action, |conn| {
            if let Some(global) = global {
                global
                    .registry()
                    .post_lock_did_change(&label, PagerLock::Reserved);
            }
            f(conn)
        });

        if let Some(global) = global {
            global.registry().post_lock_did_change(&label, PagerLock::None);
        }
        result
    }

    // ---- Metadata ----

    pub fn table_exists(&self, schema: &Schema, table: &str) -> Result<bool, StorageError> {
        metadata::table_exists(&self.conn, schema, table).map_err(|e| self.error(&e))
    }

    pub fn table_columns(
        &self,
        schema: &Schema,
        table: &str,
    ) -> Result<Vec<ColumnMeta>, StorageError> {
        metadata::table_columns(&self.conn, schema, table).map_err(|e| self.error(&e))
    }

    pub fn all_user_tables(&self) -> Result<BTreeSet<String>, StorageError> {
        metadata::all_user_tables(&self.conn).map_err(|e| self.error(&e))
    }

    fn label(&self) -> String {
        self.path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| IN_MEMORY_LABEL.to_string())
    }
}
