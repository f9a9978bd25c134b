//! Per-table migration descriptions and their generated statements.

use std::path::{Path, PathBuf};

use ferry_core::errors::MigrationError;

use crate::schema::{quote_identifier, Schema};

/// What a caller declares: move `source_table` (optionally in another
/// database file) into `table` of the handle's main database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationUserInfo {
    pub table: String,
    pub source_table: String,
    pub source_database: Option<PathBuf>,
}

impl MigrationUserInfo {
    /// Migrate from another table of the same database.
    pub fn new(table: impl Into<String>, source_table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            source_table: source_table.into(),
            source_database: None,
        }
    }

    /// Migrate from a table in another database file.
    pub fn with_source_database(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_database = Some(path.into());
        self
    }

    /// Whether the source lives in a different file than `target_path`.
    pub fn is_cross_database(&self, target_path: Option<&Path>) -> bool {
        match (&self.source_database, target_path) {
            (None, _) => false,
            (Some(source), Some(target)) => source != target,
            (Some(_), None) => true,
        }
    }

    /// Schema the source table is addressed through.
    pub fn schema_for_source_database(&self, target_path: Option<&Path>) -> Schema {
        match &self.source_database {
            Some(source) if self.is_cross_database(target_path) => {
                Schema::for_source_database(source)
            }
            _ => Schema::main(),
        }
    }

    pub fn validate(&self, target_path: Option<&Path>) -> Result<(), MigrationError> {
        let invalid = |message: &str| MigrationError::InvalidUserInfo {
            table: self.table.clone(),
            message: message.to_string(),
        };
        if self.table.is_empty() {
            return Err(invalid("target table name is empty"));
        }
        if self.source_table.is_empty() {
            return Err(invalid("source table name is empty"));
        }
        if !self.is_cross_database(target_path) && self.table == self.source_table {
            return Err(invalid("source and target are the same table"));
        }
        Ok(())
    }
}

/// Immutable description of one source-table-to-target-table mapping,
/// with the three statements the engine runs against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationInfo {
    user_info: MigrationUserInfo,
    source_schema: Schema,
    columns: Vec<String>,
    integer_primary: bool,
    statement_migrate_one_row: String,
    statement_delete_migrated_one_row: String,
    statement_drop_source_table: String,
}

impl MigrationInfo {
    /// Build the description for `user_info`, migrating `columns` of the
    /// target table. Without an integer primary key the rowid is copied
    /// explicitly so row identities survive the move.
    pub fn new(
        user_info: MigrationUserInfo,
        target_path: Option<&Path>,
        columns: Vec<String>,
        integer_primary: bool,
    ) -> Result<Self, MigrationError> {
        user_info.validate(target_path)?;
        if columns.is_empty() {
            return Err(MigrationError::NoColumns {
                table: user_info.table.clone(),
            });
        }

        let source_schema = user_info.schema_for_source_database(target_path);
        let target = Schema::main().qualify(&user_info.table);
        let source = source_schema.qualify(&user_info.source_table);

        let mut column_list: Vec<String> = Vec::with_capacity(columns.len() + 1);
        if !integer_primary {
            column_list.push("rowid".to_string());
        }
        column_list.extend(columns.iter().map(|c| quote_identifier(c)));
        let column_list = column_list.join(", ");

        let statement_migrate_one_row = format!(
            "INSERT OR REPLACE INTO {target}({column_list}) \
             SELECT {column_list} FROM {source} ORDER BY rowid DESC LIMIT 1"
        );
        let statement_delete_migrated_one_row =
            format!("DELETE FROM {source} WHERE rowid = (SELECT max(rowid) FROM {source})");
        let statement_drop_source_table = format!("DROP TABLE IF EXISTS {source}");

        Ok(Self {
            user_info,
            source_schema,
            columns,
            integer_primary,
            statement_migrate_one_row,
            statement_delete_migrated_one_row,
            statement_drop_source_table,
        })
    }

    /// Target table in the main schema.
    pub fn table(&self) -> &str {
        &self.user_info.table
    }

    pub fn source_table(&self) -> &str {
        &self.user_info.source_table
    }

    /// Source database path, `None` when the source lives in the main database.
    pub fn source_database(&self) -> Option<&Path> {
        self.source_schema.path()
    }

    pub fn schema_for_source_database(&self) -> &Schema {
        &self.source_schema
    }

    pub fn user_info(&self) -> &MigrationUserInfo {
        &self.user_info
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_integer_primary(&self) -> bool {
        self.integer_primary
    }

    pub fn statement_for_migrating_one_row(&self) -> &str {
        &self.statement_migrate_one_row
    }

    pub fn statement_for_deleting_migrated_one_row(&self) -> &str {
        &self.statement_delete_migrated_one_row
    }

    pub fn statement_for_dropping_source_table(&self) -> &str {
        &self.statement_drop_source_table
    }
}
