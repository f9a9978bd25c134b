//! Observability for Ferry.
//! `tracing` crate with `EnvFilter`, per-subsystem log levels.
//!
//! Migration batches are logged with the fields `migrate_table`,
//! `migrate_rows`, `migrate_budget_ms`, `migrate_work_ms`, and
//! `migrate_total_ms`.

pub mod setup;

pub use setup::init_tracing;
