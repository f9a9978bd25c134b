//! Property tests: a migration interrupted at any row never loses or
//! duplicates a row, and resuming finishes the job.

use std::path::Path;

use ferry_core::config::FerryConfig;
use ferry_storage::{MigrateHandle, MigrationInfo, MigrationUserInfo};
use proptest::prelude::*;
use rusqlite::Connection;
use tempfile::TempDir;

fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}

fn prepare(path: &Path, rows: i64, fail_at: i64) -> (MigrateHandle, MigrationInfo) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(&format!(
        "CREATE TABLE items (id INTEGER PRIMARY KEY, payload BLOB);
         CREATE TABLE items_old (id INTEGER PRIMARY KEY, payload BLOB);
         CREATE TRIGGER fail_once BEFORE INSERT ON items WHEN NEW.id = {fail_at}
         BEGIN SELECT RAISE(ABORT, 'injected failure'); END;"
    ))
    .unwrap();
    conn.execute(
        "WITH RECURSIVE n(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM n WHERE x < ?1)
         INSERT INTO items_old SELECT x, randomblob(16) FROM n",
        [rows],
    )
    .unwrap();
    drop(conn);

    let mut handle = MigrateHandle::open(path, &FerryConfig::default()).unwrap();
    let user = MigrationUserInfo::new("items", "items_old");
    let (integer_primary, columns) = handle.columns_of_user_info(&user).unwrap();
    let info = MigrationInfo::new(user, Some(path), columns, integer_primary).unwrap();
    (handle, info)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_interrupted_migration_conserves_rows(
        (rows, fail_at) in (1i64..300).prop_flat_map(|rows| (Just(rows), 1..=rows)),
    ) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("items.db");
        let (mut handle, info) = prepare(&path, rows, fail_at);

        let mut failed = false;
        for _ in 0..10_000 {
            match handle.migrate_rows(&info) {
                Ok(outcome) if outcome.done => break,
                Ok(_) => {}
                Err(_) => {
                    failed = true;
                    break;
                }
            }
        }
        prop_assert!(failed);

        let conn = handle.handle().conn();
        let target = count(conn, "SELECT count(*) FROM items");
        let source = count(conn, "SELECT count(*) FROM items_old");
        let overlap = count(
            conn,
            "SELECT count(*) FROM items i JOIN items_old o ON i.id = o.id",
        );
        prop_assert_eq!(target + source, rows);
        prop_assert_eq!(overlap, 0);
        prop_assert_eq!(target, rows - fail_at);

        conn.execute_batch("DROP TRIGGER fail_once").unwrap();
        loop {
            if handle.migrate_rows(&info).unwrap().done {
                break;
            }
        }
        let conn = handle.handle().conn();
        prop_assert_eq!(count(conn, "SELECT count(*) FROM items"), rows);
        prop_assert_eq!(count(conn, "SELECT count(*) FROM items_old"), 0);
    }
}
