//! Online row migration: move rows table by table from source tables into
//! a live target database without blocking concurrent callers.

pub mod budget;
pub mod handle;
pub mod info;
pub mod plan;
pub mod stepper;

pub use budget::{Sample, TimeBudgeter};
pub use handle::{MigrateHandle, MigrateOutcome};
pub use info::{MigrationInfo, MigrationUserInfo};
pub use plan::{MigrationPlan, PlanProgress, PlanStep, TableState};
pub use stepper::{transfer_one_row, RowTransfer};
