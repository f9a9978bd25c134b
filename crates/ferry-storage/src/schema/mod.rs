//! Schema identities and identifier quoting.

pub mod attachment;

use std::fmt;
use std::path::{Path, PathBuf};

use ferry_core::constants::MIGRATION_SCHEMA_PREFIX;
use xxhash_rust::xxh3::xxh3_64;

pub use attachment::Attachment;

const MAIN_SCHEMA: &str = "main";

/// Either the main database or a named attachment backed by a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Schema {
    name: String,
    path: Option<PathBuf>,
}

impl Schema {
    pub fn main() -> Self {
        Self {
            name: MAIN_SCHEMA.to_string(),
            path: None,
        }
    }

    /// A named attachment of the database at `path`.
    pub fn attached(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: Some(path.into()),
        }
    }

    /// The attachment used for a migration source database. The alias is
    /// derived from the path so the same file always maps to the same alias.
    pub fn for_source_database(path: &Path) -> Self {
        let digest = xxh3_64(path.to_string_lossy().as_bytes());
        Self::attached(format!("{MIGRATION_SCHEMA_PREFIX}{digest:016x}"), path)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_main(&self) -> bool {
        self.path.is_none() && self.name == MAIN_SCHEMA
    }

    /// Same alias backed by the same file.
    pub fn targets_same(&self, other: &Schema) -> bool {
        self.name == other.name && self.path == other.path
    }

    /// `"schema"."table"`
    pub fn qualify(&self, table: &str) -> String {
        format!("{}.{}", quote_identifier(&self.name), quote_identifier(table))
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Quote an SQL identifier, doubling embedded quotes.
pub fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}
