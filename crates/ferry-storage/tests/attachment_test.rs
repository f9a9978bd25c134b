//! Schema attachment tests: exclusivity, idempotent reattach, detach.

use std::path::Path;

use ferry_core::config::{ConnectionConfig, FerryConfig};
use ferry_core::errors::MigrationError;
use ferry_storage::schema::Attachment;
use ferry_storage::{Handle, MigrateHandle, MigrationUserInfo, Schema};
use rusqlite::Connection;
use tempfile::TempDir;

fn attached_names(handle: &Handle) -> Vec<String> {
    let mut stmt = handle.conn().prepare("PRAGMA database_list").unwrap();
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    names
}

fn make_db(path: &Path, table: &str) {
    Connection::open(path)
        .unwrap()
        .execute_batch(&format!("CREATE TABLE {table} (id INTEGER PRIMARY KEY);"))
        .unwrap();
}

#[test]
fn test_attach_main_is_noop() {
    let handle = Handle::open_in_memory(&ConnectionConfig::default()).unwrap();
    let mut attachment = Attachment::new();
    attachment.attach(&handle, &Schema::main()).unwrap();
    attachment.detach(&handle).unwrap();
    assert!(attachment.current().is_main());
    assert_eq!(attached_names(&handle), vec!["main"]);
}

#[test]
fn test_at_most_one_attachment() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.db");
    let b = dir.path().join("b.db");
    make_db(&a, "a");
    make_db(&b, "b");

    let handle = Handle::open(&dir.path().join("main.db"), &ConnectionConfig::default()).unwrap();
    let schema_a = Schema::for_source_database(&a);
    let schema_b = Schema::for_source_database(&b);
    let mut attachment = Attachment::new();

    attachment.attach(&handle, &schema_a).unwrap();
    let err = attachment.attach(&handle, &schema_b).unwrap_err();
    assert!(matches!(err, MigrationError::AlreadyAttached { .. }), "{err:?}");
    assert!(attachment.current().targets_same(&schema_a));
    assert_eq!(attached_names(&handle).len(), 2);

    attachment.reattach(&handle, &schema_b).unwrap();
    assert!(attachment.current().targets_same(&schema_b));
    let names = attached_names(&handle);
    assert_eq!(names.len(), 2);
    assert!(names.contains(&schema_b.name().to_string()));
    assert!(handle.table_exists(&schema_b, "b").unwrap());

    attachment.detach(&handle).unwrap();
    assert!(attachment.current().is_main());
    assert_eq!(attached_names(&handle), vec!["main"]);
}

#[test]
fn test_reattach_same_schema_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source.db");
    make_db(&source, "items");

    let handle = Handle::open(&dir.path().join("main.db"), &ConnectionConfig::default()).unwrap();
    let schema = Schema::for_source_database(&source);
    let mut attachment = Attachment::new();
    for _ in 0..3 {
        attachment.reattach(&handle, &schema).unwrap();
    }
    assert_eq!(attached_names(&handle).len(), 2);
    assert!(handle.table_exists(&schema, "items").unwrap());
}

#[test]
fn test_failed_attach_leaves_main() {
    let dir = TempDir::new().unwrap();
    let handle = Handle::open(&dir.path().join("main.db"), &ConnectionConfig::default()).unwrap();
    let bogus = Schema::for_source_database(&dir.path().join("no-such-dir").join("x.db"));
    let mut attachment = Attachment::new();

    assert!(attachment.attach(&handle, &bogus).is_err());
    assert!(attachment.current().is_main());
}

#[test]
fn test_source_table_exists_attaches_source() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("legacy.db");
    make_db(&source, "orders");
    let target = dir.path().join("current.db");
    make_db(&target, "orders");

    let mut handle = MigrateHandle::open(&target, &FerryConfig::default()).unwrap();
    let present = MigrationUserInfo::new("orders", "orders").with_source_database(&source);
    let absent = MigrationUserInfo::new("orders", "ghosts").with_source_database(&source);
    assert!(handle.source_table_exists(&present).unwrap());
    assert!(!handle.source_table_exists(&absent).unwrap());
    assert!(handle.attached().targets_same(&Schema::for_source_database(&source)));

    // Same-file source resolves to main and needs no attachment.
    let local = MigrationUserInfo::new("orders", "orders_old").with_source_database(&target);
    assert!(!handle.source_table_exists(&local).unwrap());
    assert!(handle.attached().is_main());
}
