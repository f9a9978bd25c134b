//! # ferry-storage
//!
//! SQLite persistence layer for Ferry: connection handles, schema
//! attachment, metadata discovery, and the online row-migration engine
//! that moves rows from source tables into a live target database.

pub mod connection;
pub mod global;
pub mod migration;
pub mod queries;
pub mod schema;

pub use connection::Handle;
pub use global::Global;
pub use migration::{
    MigrateHandle, MigrateOutcome, MigrationInfo, MigrationPlan, MigrationUserInfo, PlanProgress,
    PlanStep, TableState, TimeBudgeter,
};
pub use schema::Schema;
