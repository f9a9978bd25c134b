//! Schema metadata discovery: table existence, column listing, user tables.

use std::collections::BTreeSet;

use ferry_core::constants::{FERRY_BUILTIN_TABLE_PREFIX, SQLITE_BUILTIN_TABLE_PREFIX};
use rusqlite::{params, Connection, OptionalExtension};

use crate::schema::{quote_identifier, Schema};

/// One row of `PRAGMA table_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    pub cid: i64,
    pub name: String,
    pub column_type: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    /// 1-based position within the primary key, 0 if not part of it.
    pub primary_key: i64,
}

/// Whether `schema.table` exists as an ordinary table.
pub fn table_exists(conn: &Connection, schema: &Schema, table: &str) -> rusqlite::Result<bool> {
    let sql = format!(
        "SELECT 1 FROM {}.sqlite_master WHERE type = 'table' AND name = ?1",
        quote_identifier(schema.name())
    );
    let found: Option<i64> = conn
        .query_row(&sql, params![table], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

/// Column definitions of `schema.table`, in declaration order.
/// Empty when the table does not exist.
pub fn table_columns(
    conn: &Connection,
    schema: &Schema,
    table: &str,
) -> rusqlite::Result<Vec<ColumnMeta>> {
    let mut stmt = conn.prepare(
        "SELECT cid, name, type, \"notnull\", dflt_value, pk
         FROM pragma_table_info(?1, ?2)
         ORDER BY cid",
    )?;
    let rows = stmt.query_map(params![table, schema.name()], |row| {
        Ok(ColumnMeta {
            cid: row.get(0)?,
            name: row.get(1)?,
            column_type: row.get(2)?,
            not_null: row.get::<_, i64>(3)? != 0,
            default_value: row.get(4)?,
            primary_key: row.get(5)?,
        })
    })?;
    let columns = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

/// Index of the column that aliases the rowid, if any.
///
/// Only a single-column primary key declared exactly as `INTEGER` is a
/// rowid alias; composite keys and `INT PRIMARY KEY` are not.
pub fn integer_primary_index(columns: &[ColumnMeta]) -> Option<usize> {
    let mut primary = columns.iter().enumerate().filter(|(_, c)| c.primary_key > 0);
    let (index, column) = primary.next()?;
    if primary.next().is_some() {
        return None;
    }
    column
        .column_type
        .eq_ignore_ascii_case("INTEGER")
        .then_some(index)
}

/// Names of all user tables in the main schema, excluding SQLite and
/// Ferry internal tables.
pub fn all_user_tables(conn: &Connection) -> rusqlite::Result<BTreeSet<String>> {
    let mut stmt = conn.prepare("SELECT name FROM main.sqlite_master WHERE type = 'table'")?;
    let names = stmt.query_map([], |row| row.get::<_, String>(0))?;
    let mut tables = BTreeSet::new();
    for name in names {
        let name = name?;
        if !name.starts_with(SQLITE_BUILTIN_TABLE_PREFIX)
            && !name.starts_with(FERRY_BUILTIN_TABLE_PREFIX)
        {
            tables.insert(name);
        }
    }
    Ok(tables)
}
