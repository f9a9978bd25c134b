//! Handler traits for storage-engine notifications.

use super::types::{FileOpenedEvent, PagerLock, ShmLock};

/// Receives SQLite's global error log (`SQLITE_CONFIG_LOG`).
pub trait LogHandler: Send + Sync {
    fn on_log(&self, code: i32, message: &str);
}

impl<F> LogHandler for F
where
    F: Fn(i32, &str) + Send + Sync,
{
    fn on_log(&self, code: i32, message: &str) {
        self(code, message)
    }
}

/// Receives file-open notifications.
pub trait FileOpenedHandler: Send + Sync {
    fn on_file_opened(&self, event: &FileOpenedEvent);
}

impl<F> FileOpenedHandler for F
where
    F: Fn(&FileOpenedEvent) + Send + Sync,
{
    fn on_file_opened(&self, event: &FileOpenedEvent) {
        self(event)
    }
}

/// Receives pager and shared-memory lock transitions.
///
/// All methods default to no-ops, so a handler only overrides the
/// transitions it cares about.
pub trait LockEventHandler: Send + Sync {
    fn will_lock(&self, _path: &str, _lock: PagerLock) {}
    fn lock_did_change(&self, _path: &str, _lock: PagerLock) {}
    fn will_shm_lock(&self, _path: &str, _lock: ShmLock, _mask: i32) {}
    fn shm_lock_did_change(&self, _path: &str, _shared_mask: i32, _exclusive_mask: i32) {}
}
