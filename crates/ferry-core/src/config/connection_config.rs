//! Connection configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;

/// Configuration applied to every SQLite connection opened by Ferry.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Busy timeout in ms. Default: 5000.
    pub busy_timeout_ms: Option<u64>,
    /// Enable WAL journal mode. Default: true.
    pub wal: Option<bool>,
}

impl ConnectionConfig {
    pub fn effective_busy_timeout(&self) -> Duration {
        self.busy_timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(constants::DEFAULT_BUSY_TIMEOUT)
    }

    pub fn effective_wal(&self) -> bool {
        self.wal.unwrap_or(true)
    }
}
