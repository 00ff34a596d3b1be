//! Embedded media record store.
//!
//! Media files are persisted as records in a single collection (a table)
//! inside a named SQLite database. Records are keyed by the file's original
//! name; saving a file whose name is already stored replaces the record.
//!
//! # Architecture
//! - [`Database`] opens (creating and upgrading if needed) the database
//!   described by an explicit [`DatabaseConfig`].
//! - [`Repository`] saves, lists, fetches and deletes [`MediaRecord`]s. Each
//!   call runs its own transaction.
//! - [`quota`] reports how much of the storage area is in use.
//!
//! # Examples
//!
//! ```
//! use mediastore_store::{Database, DatabaseConfig, MediaFile, Repository};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::open(DatabaseConfig::in_memory()).await?;
//! let repo = Repository::from(&db);
//!
//! let id = repo.save_media(&MediaFile::new("a.mp4", "video/mp4", [1, 2, 3])).await?;
//! let record = repo.get_media_by_id(&id).await?.expect("just saved");
//! assert_eq!(record.into_file().mime_type, "video/mp4");
//!
//! db.close().await;
//! # Ok(())
//! # }
//! ```

mod config;
mod db;
pub mod error;
mod file;
mod models;
pub mod quota;
mod queries;
mod repo;

pub use crate::config::{DEFAULT_COLLECTION, DEFAULT_DATABASE_NAME, DEFAULT_DATABASE_VERSION, DatabaseConfig, Location};
pub use crate::db::Database;
pub use crate::file::{FileHandle, MediaFile};
pub use crate::models::{MediaRecord, MediaSummary};
pub use crate::repo::Repository;
