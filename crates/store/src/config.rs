//! Database identity and location.

use crate::error::{ErrorKind, Result};
use std::path::PathBuf;

pub const DEFAULT_DATABASE_NAME: &str = "MediaDatabase";
pub const DEFAULT_DATABASE_VERSION: u32 = 1;
pub const DEFAULT_COLLECTION: &str = "media";
const DATABASE_EXTENSION: &str = "sqlite3";

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// One SQLite file per database name inside this directory.
    Directory(PathBuf),
    /// A private in-memory database, destroyed when the pool closes. Every
    /// [`Database`](crate::Database) opened this way is isolated from every other.
    InMemory,
}

/// Identity of the database and record collection to open.
///
/// Passed explicitly to [`Database::open`](crate::Database::open) instead of
/// living in process-wide constants, so that multiple isolated instances can
/// coexist (one per test, for example).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub name: String,
    pub version: u32,
    pub collection: String,
    pub location: Location,
}
impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}
impl DatabaseConfig {
    pub fn new(location: Location) -> Self {
        Self {
            name: DEFAULT_DATABASE_NAME.to_string(),
            version: DEFAULT_DATABASE_VERSION,
            collection: DEFAULT_COLLECTION.to_string(),
            location,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Location::InMemory)
    }

    pub fn in_directory(directory: impl Into<PathBuf>) -> Self {
        Self::new(Location::Directory(directory.into()))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Path of the SQLite file backing this database, if it is file-backed.
    pub fn file_path(&self) -> Option<PathBuf> {
        match &self.location {
            Location::Directory(dir) => Some(dir.join(format!("{}.{DATABASE_EXTENSION}", self.name))),
            Location::InMemory => None,
        }
    }

    /// Reject configurations that can't be opened safely.
    ///
    /// The collection name ends up in SQL statements as a table name, so it is
    /// restricted to a plain identifier. The database name ends up as a file
    /// name, so it can't contain path separators.
    pub fn validate(&self) -> Result<()> {
        if self.version == 0 {
            exn::bail!(ErrorKind::InvalidConfig("version must be at least 1".to_string()));
        }
        // SQLite stores the schema version as a signed 32-bit integer.
        if i32::try_from(self.version).is_err() {
            exn::bail!(ErrorKind::InvalidConfig(format!("version {} is too large", self.version)));
        }
        if !is_identifier(&self.collection) {
            exn::bail!(ErrorKind::InvalidConfig(format!("collection `{}` is not a plain identifier", self.collection)));
        }
        if self.collection.starts_with("sqlite_") {
            exn::bail!(ErrorKind::InvalidConfig(format!("collection `{}` uses a reserved prefix", self.collection)));
        }
        let bad_name = self.name.is_empty()
            || self.name == "."
            || self.name == ".."
            || self.name.chars().any(|c| matches!(c, '/' | '\\' | '\0'));
        if bad_name {
            exn::bail!(ErrorKind::InvalidConfig(format!("database name `{}` is not a valid file name", self.name)));
        }
        Ok(())
    }
}

fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => chars.all(|c| c.is_ascii_alphanumeric() || c == '_'),
        _ => false,
    }
}
