//! NotificationRegistry: named subscribers behind a reader/writer lock.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::handler::{FileOpenedHandler, LockEventHandler, LogHandler};
use super::types::{FileOpenedEvent, PagerLock, ShmLock};

#[derive(Default)]
struct Subscribers {
    log: BTreeMap<String, Arc<dyn LogHandler>>,
    file_opened: BTreeMap<String, Arc<dyn FileOpenedHandler>>,
    lock_events: BTreeMap<String, Arc<dyn LockEventHandler>>,
}

/// Registry of named subscribers for log, file-open, and lock events.
///
/// Handlers that panic are caught and do not prevent subsequent handlers
/// from receiving the event.
#[derive(Default)]
pub struct NotificationRegistry {
    subscribers: RwLock<Subscribers>,
}

impl NotificationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- Registration ----

    /// Register (`Some`) or remove (`None`) a log handler under `name`.
    pub fn set_log_handler(&self, name: &str, handler: Option<Arc<dyn LogHandler>>) {
        let mut subs = self.write();
        match handler {
            Some(h) => {
                subs.log.insert(name.to_string(), h);
            }
            None => {
                subs.log.remove(name);
            }
        }
    }

    /// Register (`Some`) or remove (`None`) a file-opened handler under `name`.
    pub fn set_file_opened_handler(
        &self,
        name: &str,
        handler: Option<Arc<dyn FileOpenedHandler>>,
    ) {
        let mut subs = self.write();
        match handler {
            Some(h) => {
                subs.file_opened.insert(name.to_string(), h);
            }
            None => {
                subs.file_opened.remove(name);
            }
        }
    }

    /// Register (`Some`) or remove (`None`) a lock event handler under `name`.
    pub fn set_lock_event_handler(
        &self,
        name: &str,
        handler: Option<Arc<dyn LockEventHandler>>,
    ) {
        let mut subs = self.write();
        match handler {
            Some(h) => {
                subs.lock_events.insert(name.to_string(), h);
            }
            None => {
                subs.lock_events.remove(name);
            }
        }
    }

    /// Remove every subscriber.
    pub fn clear(&self) {
        *self.write() = Subscribers::default();
    }

    /// Total number of registered subscribers across all event kinds.
    pub fn subscriber_count(&self) -> usize {
        let subs = self.read();
        subs.log.len() + subs.file_opened.len() + subs.lock_events.len()
    }

    // ---- Dispatch ----

    pub fn post_log(&self, code: i32, message: &str) {
        for (name, handler) in &self.read().log {
            guarded(name, || handler.on_log(code, message));
        }
    }

    pub fn post_file_opened(&self, event: &FileOpenedEvent) {
        for (name, handler) in &self.read().file_opened {
            guarded(name, || handler.on_file_opened(event));
        }
    }

    pub fn post_will_lock(&self, path: &str, lock: PagerLock) {
        debug_assert!(!path.is_empty());
        debug_assert!(lock.is_requestable(), "cannot request {lock} lock");
        for (name, handler) in &self.read().lock_events {
            guarded(name, || handler.will_lock(path, lock));
        }
    }

    pub fn post_lock_did_change(&self, path: &str, lock: PagerLock) {
        debug_assert!(!path.is_empty());
        for (name, handler) in &self.read().lock_events {
            guarded(name, || handler.lock_did_change(path, lock));
        }
    }

    pub fn post_will_shm_lock(&self, path: &str, lock: ShmLock, mask: i32) {
        debug_assert!(!path.is_empty());
        for (name, handler) in &self.read().lock_events {
            guarded(name, || handler.will_shm_lock(path, lock, mask));
        }
    }

    pub fn post_shm_lock_did_change(&self, path: &str, shared_mask: i32, exclusive_mask: i32) {
        debug_assert!(!path.is_empty());
        for (name, handler) in &self.read().lock_events {
            guarded(name, || {
                handler.shm_lock_did_change(path, shared_mask, exclusive_mask)
            });
        }
    }

    // A panicking handler must not wedge the registry, so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, Subscribers> {
        self.subscribers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Subscribers> {
        self.subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn guarded<F: FnOnce()>(name: &str, f: F) {
    if catch_unwind(AssertUnwindSafe(f)).is_err() {
        tracing::error!(subscriber = name, "notification handler panicked");
    }
}
