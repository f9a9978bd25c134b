//! MigrateHandle: drives budgeted migration transactions on one connection.

use std::cell::Cell;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::{Duration, Instant};

use ferry_core::config::{FerryConfig, MigrationConfig};
use ferry_core::constants::ACTION_MIGRATE;
use ferry_core::errors::{MigrationError, StorageError};
use rusqlite::Connection;

use super::budget::TimeBudgeter;
use super::info::{MigrationInfo, MigrationUserInfo};
use super::stepper::{transfer_one_row, RowTransfer};
use crate::connection::Handle;
use crate::queries::metadata::integer_primary_index;
use crate::schema::{Attachment, Schema};

/// Progress handler granularity, in SQLite VM instructions.
const DEADLINE_CHECK_OPS: i32 = 1000;

/// Outcome of one successful [`MigrateHandle::migrate_rows`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MigrateOutcome {
    /// The source table has no rows left to migrate.
    pub done: bool,
    /// Rows moved by this call.
    pub rows_migrated: usize,
}

impl MigrateOutcome {
    fn exhausted() -> Self {
        Self {
            done: true,
            rows_migrated: 0,
        }
    }
}

/// A handle dedicated to migrating rows.
///
/// Single-threaded: one caller drives a `MigrateHandle` at a time. The
/// migration cursor is the source table itself, so no progress state lives
/// here beyond timing samples; a crash loses nothing that was committed.
pub struct MigrateHandle {
    handle: Handle,
    attachment: Attachment,
    /// Target table whose statements are prepared, `None` when no table is current.
    migrating: Option<String>,
    prepared: bool,
    budgeter: TimeBudgeter,
    transaction_ceiling: Duration,
    /// The last batch was rolled back by the ceiling.
    tripped_ceiling: bool,
}

impl MigrateHandle {
    /// Open the target database at `path`.
    pub fn open(path: &Path, config: &FerryConfig) -> Result<Self, StorageError> {
        let handle = Handle::open(path, &config.connection)?;
        Ok(Self::new(handle, &config.migration))
    }

    pub fn new(mut handle: Handle, config: &MigrationConfig) -> Self {
        handle.set_action(ACTION_MIGRATE);
        Self {
            handle,
            attachment: Attachment::new(),
            migrating: None,
            prepared: false,
            budgeter: TimeBudgeter::new(config),
            transaction_ceiling: config.effective_transaction_ceiling(),
            tripped_ceiling: false,
        }
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn database_path(&self) -> Option<&Path> {
        self.handle.path()
    }

    /// Schema currently attached to the handle.
    pub fn attached(&self) -> &Schema {
        self.attachment.current()
    }

    pub fn budgeter(&self) -> &TimeBudgeter {
        &self.budgeter
    }

    /// Target table the handle is positioned at, if any.
    pub fn migrating_table(&self) -> Option<&str> {
        self.migrating.as_deref()
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    // ---- Attachment ----

    /// Point the handle at `schema`. Always forgets the current table and
    /// its prepared statements, even when the attachment itself is kept.
    pub fn reattach(&mut self, schema: &Schema) -> Result<(), MigrationError> {
        debug_assert!(!self.handle.is_in_transaction());
        self.migrating = None;
        self.finalize_statements();
        self.attachment.reattach(&self.handle, schema)
    }

    /// Detach whatever source database is attached.
    pub fn detach(&mut self) -> Result<(), MigrationError> {
        debug_assert!(!self.handle.is_in_transaction());
        self.migrating = None;
        self.finalize_statements();
        self.attachment.detach(&self.handle)
    }

    // ---- Migration ----

    /// Move a budgeted batch of rows for `info` inside one transaction.
    ///
    /// Returns `done = true` when the target table no longer exists, when
    /// the source table is gone, or when the source ran out of rows. A
    /// failure rolls the whole batch back; the caller may simply retry.
    /// Every successful call moves at least one row while rows remain.
    pub fn migrate_rows(&mut self, info: &MigrationInfo) -> Result<MigrateOutcome, MigrationError> {
        if !self.handle.table_exists(&Schema::main(), info.table())? {
            return Ok(MigrateOutcome::exhausted());
        }

        if self.migrating.as_deref() != Some(info.table()) {
            self.reattach(info.schema_for_source_database())?;
            self.migrating = Some(info.table().to_string());
        }

        if !self
            .handle
            .table_exists(info.schema_for_source_database(), info.source_table())?
        {
            return Ok(MigrateOutcome::exhausted());
        }

        self.prepare_statements(info)?;

        let budget = self.budgeter.next_budget();
        let ceiling = self.transaction_ceiling;
        let single_row = self.tripped_ceiling;
        let action = self.handle.action();
        let armed_until: Cell<Option<Instant>> = Cell::new(None);
        let started = Instant::now();

        // The first row of a batch always runs to completion; the ceiling is
        // only armed for the rows after it, measured from BEGIN.
        let result: Result<(usize, bool, Duration), StorageError> =
            self.handle.run_transaction(|conn| {
                let began = Instant::now();
                let mut rows = 0usize;
                loop {
                    let step = transfer_one_row(conn, info, action)?;
                    let work = began.elapsed();
                    match step {
                        RowTransfer::Exhausted => {
                            disarm_deadline(conn);
                            return Ok((rows, true, work));
                        }
                        RowTransfer::Copied => rows += 1,
                    }
                    if single_row || work >= budget || work >= ceiling {
                        disarm_deadline(conn);
                        return Ok((rows, false, work));
                    }
                    if rows == 1 {
                        if let Some(deadline) = began.checked_add(ceiling) {
                            armed_until.set(Some(deadline));
                            arm_deadline(conn, deadline);
                        }
                    }
                }
            });
        disarm_deadline(self.handle.conn());

        let deadline_passed = armed_until
            .get()
            .is_some_and(|deadline| Instant::now() >= deadline);
        let (rows, exhausted, work) = match result {
            Ok(batch) => batch,
            Err(StorageError::Interrupted { .. }) if deadline_passed => {
                // Next call commits a single row so a stalling row cannot
                // roll every batch back.
                self.tripped_ceiling = true;
                tracing::warn!(
                    migrate_table = info.table(),
                    limit_ms = ceiling.as_millis() as u64,
                    "migration transaction hit its ceiling and was rolled back"
                );
                return Err(MigrationError::TransactionDeadlineExceeded {
                    table: info.table().to_string(),
                    limit_ms: ceiling.as_millis() as u64,
                });
            }
            Err(e) => {
                tracing::warn!(migrate_table = info.table(), error = %e, "migration transaction failed");
                return Err(e.into());
            }
        };
        self.tripped_ceiling = false;

        let total = started.elapsed();
        if !work.is_zero() && total > work {
            self.budgeter.record_sample(work, total);
        }
        tracing::debug!(
            migrate_table = info.table(),
            migrate_rows = rows,
            migrate_budget_ms = budget.as_secs_f64() * 1e3,
            migrate_work_ms = work.as_secs_f64() * 1e3,
            migrate_total_ms = total.as_secs_f64() * 1e3,
            "migrated batch"
        );
        if exhausted {
            tracing::info!(migrate_table = info.table(), "source table exhausted");
        }

        Ok(MigrateOutcome {
            done: exhausted,
            rows_migrated: rows,
        })
    }

    /// Drop the source table of a fully migrated `info`. Never called
    /// implicitly by [`migrate_rows`](Self::migrate_rows).
    pub fn drop_source_table(&mut self, info: &MigrationInfo) -> Result<(), MigrationError> {
        self.reattach(info.schema_for_source_database())?;
        self.migrating = Some(info.table().to_string());
        self.handle
            .execute(info.statement_for_dropping_source_table())?;
        tracing::info!(
            migrate_table = info.table(),
            source_table = info.source_table(),
            "dropped migrated source table"
        );
        Ok(())
    }

    fn prepare_statements(&mut self, info: &MigrationInfo) -> Result<(), StorageError> {
        if self.prepared {
            return Ok(());
        }
        let conn = self.handle.conn();
        for sql in [
            info.statement_for_migrating_one_row(),
            info.statement_for_deleting_migrated_one_row(),
        ] {
            conn.prepare_cached(sql).map_err(|e| self.handle.error(&e))?;
        }
        self.prepared = true;
        Ok(())
    }

    fn finalize_statements(&mut self) {
        self.handle.conn().flush_prepared_statement_cache();
        self.prepared = false;
    }

    // ---- Discovery ----

    /// All user tables of the target database.
    pub fn get_all_tables(&self) -> Result<BTreeSet<String>, MigrationError> {
        Ok(self.handle.all_user_tables()?)
    }

    /// Whether the source table of `user_info` exists. Attaches the
    /// source database as a side effect.
    pub fn source_table_exists(
        &mut self,
        user_info: &MigrationUserInfo,
    ) -> Result<bool, MigrationError> {
        let schema = user_info.schema_for_source_database(self.database_path());
        self.reattach(&schema)?;
        Ok(self.handle.table_exists(&schema, &user_info.source_table)?)
    }

    /// Columns of the target table and whether it has an integer primary
    /// key. Empty when the target table does not exist.
    pub fn columns_of_user_info(
        &self,
        user_info: &MigrationUserInfo,
    ) -> Result<(bool, Vec<String>), MigrationError> {
        let main = Schema::main();
        if !self.handle.table_exists(&main, &user_info.table)? {
            return Ok((false, Vec::new()));
        }
        let metas = self.handle.table_columns(&main, &user_info.table)?;
        let integer_primary = integer_primary_index(&metas).is_some();
        Ok((integer_primary, metas.into_iter().map(|m| m.name).collect()))
    }
}

/// Interrupt any statement on `conn` once `deadline` has passed.
fn arm_deadline(conn: &Connection, deadline: Instant) {
    conn.progress_handler(DEADLINE_CHECK_OPS, Some(move || Instant::now() >= deadline));
}

fn disarm_deadline(conn: &Connection) {
    conn.progress_handler(0, None::<fn() -> bool>);
}
