//! Process-wide notification state.
//!
//! SQLite's error log is global to the process, so the hook that forwards
//! it can only be installed once. `Global::initialize` installs it and
//! owns the registry every handle posts to; tests and embedders call it
//! before opening their first handle.

use std::os::raw::c_int;
use std::sync::OnceLock;

use ferry_core::events::NotificationRegistry;

static GLOBAL: OnceLock<Global> = OnceLock::new();

/// Shared notification registry plus the SQLite log hook state.
pub struct Global {
    registry: NotificationRegistry,
    log_hook_installed: bool,
}

impl Global {
    /// Initialize process-wide state. Idempotent; later calls return the
    /// instance created by the first one.
    pub fn initialize() -> &'static Global {
        GLOBAL.get_or_init(|| {
            // SAFETY: `sqlite_log` is a plain fn that never unwinds into
            // SQLite (dispatch catches handler panics) and only touches
            // `GLOBAL`, which is `Sync`. sqlite3_config refuses the call
            // with SQLITE_MISUSE once the library is initialized; that case
            // is reported and the registry still works for other events.
            let installed = match unsafe { rusqlite::trace::config_log(Some(sqlite_log)) } {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "sqlite log hook not installed; library already initialized"
                    );
                    false
                }
            };
            tracing::debug!(log_hook = installed, "global notification state initialized");
            Global {
                registry: NotificationRegistry::new(),
                log_hook_installed: installed,
            }
        })
    }

    /// The initialized instance, `None` before [`initialize`](Self::initialize).
    pub fn shared() -> Option<&'static Global> {
        GLOBAL.get()
    }

    pub fn registry(&self) -> &NotificationRegistry {
        &self.registry
    }

    /// Whether SQLite's error log is forwarded to log subscribers.
    pub fn log_hook_installed(&self) -> bool {
        self.log_hook_installed
    }

    /// Remove every subscriber. The log hook stays installed and simply
    /// has nobody to deliver to.
    pub fn teardown(&self) {
        self.registry.clear();
        tracing::debug!("global notification subscribers cleared");
    }
}

fn sqlite_log(code: c_int, message: &str) {
    if let Some(global) = GLOBAL.get() {
        global.registry.post_log(code, message);
    }
}
