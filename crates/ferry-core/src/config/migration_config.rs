//! Migration engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;

/// Tunables for the adaptive time budget of migration transactions.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct MigrationConfig {
    /// Target total duration of one migration transaction, in ms. Default: 10.
    pub max_expecting_ms: Option<u64>,
    /// Work budget before any sample exists, in ms. Default: 5.
    pub max_initialize_ms: Option<u64>,
    /// Ring buffer capacity for (work, total) samples. Default: 10.
    pub sample_count: Option<usize>,
    /// Hard wall-clock ceiling for one migration transaction, in ms. Default: 1000.
    pub transaction_ceiling_ms: Option<u64>,
}

impl MigrationConfig {
    pub fn effective_max_expecting(&self) -> Duration {
        self.max_expecting_ms
            .map(Duration::from_millis)
            .unwrap_or(constants::DEFAULT_MAX_EXPECTING_DURATION)
    }

    pub fn effective_max_initialize(&self) -> Duration {
        self.max_initialize_ms
            .map(Duration::from_millis)
            .unwrap_or(constants::DEFAULT_MAX_INITIALIZE_DURATION)
    }

    pub fn effective_sample_count(&self) -> usize {
        self.sample_count.unwrap_or(constants::DEFAULT_SAMPLE_COUNT)
    }

    pub fn effective_transaction_ceiling(&self) -> Duration {
        self.transaction_ceiling_ms
            .map(Duration::from_millis)
            .unwrap_or(constants::DEFAULT_TRANSACTION_CEILING)
    }
}
