//! ATTACH/DETACH state for a handle: at most one non-main schema at a time.
//!
//! Schema changes are only legal outside a transaction and with no
//! statement still referencing the old schema; callers flush their
//! prepared statements first.

use ferry_core::errors::MigrationError;
use rusqlite::params;

use super::{quote_identifier, Schema};
use crate::connection::Handle;

/// Tracks which auxiliary database is attached to a handle.
#[derive(Debug, Clone)]
pub struct Attachment {
    current: Schema,
}

impl Default for Attachment {
    fn default() -> Self {
        Self::new()
    }
}

impl Attachment {
    pub fn new() -> Self {
        Self {
            current: Schema::main(),
        }
    }

    /// The schema currently attached (`main` when nothing is).
    pub fn current(&self) -> &Schema {
        &self.current
    }

    /// ATTACH `schema`. Attaching `main` is a no-op. Fails if another
    /// non-main schema is still attached; the existing attachment is kept.
    pub fn attach(&mut self, handle: &Handle, schema: &Schema) -> Result<(), MigrationError> {
        debug_assert!(
            !handle.is_in_transaction(),
            "cannot attach inside a transaction"
        );

        let Some(path) = schema.path() else {
            return Ok(());
        };
        if !self.current.is_main() {
            return Err(MigrationError::AlreadyAttached {
                current: self.current.name().to_string(),
                requested: schema.name().to_string(),
            });
        }

        let sql = format!("ATTACH DATABASE ?1 AS {}", quote_identifier(schema.name()));
        handle
            .conn()
            .execute(&sql, params![path.to_string_lossy()])
            .map_err(|e| handle.error(&e))?;

        tracing::debug!(schema = %schema, path = %path.display(), "attached source database");
        self.current = schema.clone();
        Ok(())
    }

    /// DETACH the current schema. No-op when only `main` is attached.
    pub fn detach(&mut self, handle: &Handle) -> Result<(), MigrationError> {
        debug_assert!(
            !handle.is_in_transaction(),
            "cannot detach inside a transaction"
        );

        if self.current.is_main() {
            return Ok(());
        }

        let sql = format!("DETACH DATABASE {}", quote_identifier(self.current.name()));
        handle.execute(&sql)?;

        tracing::debug!(schema = %self.current, "detached source database");
        self.current = Schema::main();
        Ok(())
    }

    /// Switch the attachment to `schema`. A request for the schema already
    /// attached returns immediately; otherwise detach then attach. A
    /// failure in either half is returned as-is, with the state left
    /// wherever that half stopped.
    pub fn reattach(&mut self, handle: &Handle, schema: &Schema) -> Result<(), MigrationError> {
        if self.current.targets_same(schema) {
            return Ok(());
        }
        self.detach(handle)?;
        self.attach(handle, schema)
    }
}
