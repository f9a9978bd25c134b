//! Teardown runs in its own test binary: it clears subscribers that
//! other global tests would still be using.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ferry_core::config::ConnectionConfig;
use ferry_core::events::FileOpenedEvent;
use ferry_storage::{Global, Handle};
use tempfile::TempDir;

#[test]
fn test_teardown_unregisters_subscribers() {
    let global = Global::initialize();
    let opened = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&opened);
    global.registry().set_file_opened_handler(
        "counter",
        Some(Arc::new(move |_: &FileOpenedEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        })),
    );
    global
        .registry()
        .set_log_handler("quiet", Some(Arc::new(|_: i32, _: &str| {})));
    assert_eq!(global.registry().subscriber_count(), 2);

    let dir = TempDir::new().unwrap();
    Handle::open(&dir.path().join("a.db"), &ConnectionConfig::default()).unwrap();
    assert_eq!(opened.load(Ordering::SeqCst), 1);

    global.teardown();
    assert_eq!(global.registry().subscriber_count(), 0);

    Handle::open(&dir.path().join("b.db"), &ConnectionConfig::default()).unwrap();
    assert_eq!(opened.load(Ordering::SeqCst), 1);

    // The instance survives teardown and accepts new subscribers.
    assert!(Global::shared().is_some());
    global
        .registry()
        .set_log_handler("again", Some(Arc::new(|_: i32, _: &str| {})));
    assert_eq!(global.registry().subscriber_count(), 1);
}
