//! Multi-table driver: walks every declared table through copy and drop.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use ferry_core::errors::MigrationError;

use super::handle::MigrateHandle;
use super::info::{MigrationInfo, MigrationUserInfo};

/// Where one table is in its migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableState {
    /// No batch has run yet.
    Unmigrated,
    /// At least one batch committed, rows remain in the source.
    Migrating,
    /// Every row is in the target; the source table still exists.
    FullyCopied,
    /// The source table is gone. Terminal.
    SourceDropped,
}

impl fmt::Display for TableState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unmigrated => "unmigrated",
            Self::Migrating => "migrating",
            Self::FullyCopied => "fully_copied",
            Self::SourceDropped => "source_dropped",
        };
        f.write_str(name)
    }
}

/// What a single [`MigrationPlan::step`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanStep {
    Migrated {
        table: String,
        rows: usize,
        done: bool,
    },
    Dropped {
        table: String,
    },
    Finished,
}

/// Aggregate counters across the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlanProgress {
    pub tables: usize,
    pub finished_tables: usize,
    pub rows_migrated: u64,
}

#[derive(Debug, Clone)]
struct PlannedTable {
    info: MigrationInfo,
    state: TableState,
    rows_migrated: u64,
}

/// Ordered set of table migrations driven one step at a time.
///
/// Tables are processed in declaration order. The plan holds no state
/// that is not recoverable from the databases: after a crash, preparing
/// the same plan again resumes where the committed data left off.
#[derive(Debug, Clone, Default)]
pub struct MigrationPlan {
    tables: Vec<PlannedTable>,
}

impl MigrationPlan {
    /// Plan over already-built infos. Every table starts `Unmigrated`.
    pub fn new(infos: Vec<MigrationInfo>) -> Self {
        Self {
            tables: infos
                .into_iter()
                .map(|info| PlannedTable {
                    info,
                    state: TableState::Unmigrated,
                    rows_migrated: 0,
                })
                .collect(),
        }
    }

    /// Discover columns for every declaration and build the plan.
    ///
    /// Fails if a target table is missing or declared twice. A table whose
    /// source no longer exists starts in `SourceDropped`.
    pub fn prepare(
        handle: &mut MigrateHandle,
        user_infos: Vec<MigrationUserInfo>,
    ) -> Result<Self, MigrationError> {
        let target_path = handle.database_path().map(Path::to_path_buf);
        let target_path = target_path.as_deref();

        let mut seen = BTreeSet::new();
        let mut tables = Vec::with_capacity(user_infos.len());
        for user_info in user_infos {
            user_info.validate(target_path)?;
            if !seen.insert(user_info.table.clone()) {
                return Err(MigrationError::InvalidUserInfo {
                    table: user_info.table,
                    message: "target table declared more than once".to_string(),
                });
            }

            let (integer_primary, columns) = handle.columns_of_user_info(&user_info)?;
            if columns.is_empty() {
                return Err(MigrationError::TableNotFound {
                    schema: "main".to_string(),
                    table: user_info.table,
                });
            }

            let state = if handle.source_table_exists(&user_info)? {
                TableState::Unmigrated
            } else {
                TableState::SourceDropped
            };
            let info = MigrationInfo::new(user_info, target_path, columns, integer_primary)?;
            tracing::debug!(migrate_table = info.table(), %state, "planned table");
            tables.push(PlannedTable {
                info,
                state,
                rows_migrated: 0,
            });
        }

        Ok(Self { tables })
    }

    /// Make one unit of progress on the first unfinished table: one
    /// migration batch, or dropping a fully copied source.
    ///
    /// On error the table's state is unchanged and the step can be retried.
    pub fn step(&mut self, handle: &mut MigrateHandle) -> Result<PlanStep, MigrationError> {
        let Some(entry) = self
            .tables
            .iter_mut()
            .find(|t| t.state != TableState::SourceDropped)
        else {
            return Ok(PlanStep::Finished);
        };

        if entry.state == TableState::FullyCopied {
            handle.drop_source_table(&entry.info)?;
            entry.state = TableState::SourceDropped;
            return Ok(PlanStep::Dropped {
                table: entry.info.table().to_string(),
            });
        }

        let outcome = handle.migrate_rows(&entry.info)?;
        entry.rows_migrated += outcome.rows_migrated as u64;
        entry.state = if outcome.done {
            TableState::FullyCopied
        } else {
            TableState::Migrating
        };
        Ok(PlanStep::Migrated {
            table: entry.info.table().to_string(),
            rows: outcome.rows_migrated,
            done: outcome.done,
        })
    }

    /// Step until finished or `max_steps` steps have run. Returns whether
    /// the plan finished.
    pub fn run_to_completion(
        &mut self,
        handle: &mut MigrateHandle,
        max_steps: usize,
    ) -> Result<bool, MigrationError> {
        for _ in 0..max_steps {
            if self.step(handle)? == PlanStep::Finished {
                break;
            }
        }
        let finished = self.is_finished();
        if finished {
            let progress = self.progress();
            tracing::info!(
                tables = progress.tables,
                migrate_rows = progress.rows_migrated,
                "migration plan finished"
            );
        }
        Ok(finished)
    }

    pub fn is_finished(&self) -> bool {
        self.tables
            .iter()
            .all(|t| t.state == TableState::SourceDropped)
    }

    /// State of the plan entry for target `table`.
    pub fn state(&self, table: &str) -> Option<TableState> {
        self.tables
            .iter()
            .find(|t| t.info.table() == table)
            .map(|t| t.state)
    }

    pub fn tables(&self) -> impl Iterator<Item = (&MigrationInfo, TableState)> {
        self.tables.iter().map(|t| (&t.info, t.state))
    }

    pub fn progress(&self) -> PlanProgress {
        PlanProgress {
            tables: self.tables.len(),
            finished_tables: self
                .tables
                .iter()
                .filter(|t| t.state == TableState::SourceDropped)
                .count(),
            rows_migrated: self.tables.iter().map(|t| t.rows_migrated).sum(),
        }
    }
}
