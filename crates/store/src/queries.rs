//! SQL statements for one record collection.
//!
//! The collection name is a table name, which can't be a bound parameter, so
//! statements are rendered once per opened database. Names reaching this
//! module have already passed [`DatabaseConfig::validate`](crate::DatabaseConfig::validate).

#[derive(Debug)]
pub(crate) struct Statements {
    pub(crate) create_collection: String,
    pub(crate) upsert: String,
    pub(crate) select_all: String,
    pub(crate) select_summaries: String,
    pub(crate) select_by_id: String,
    pub(crate) delete_by_id: String,
}
impl Statements {
    pub(crate) fn for_collection(collection: &str) -> Self {
        let table = format!("\"{collection}\"");
        Self {
            create_collection: format!(
                r#"
                    CREATE TABLE IF NOT EXISTS {table} (
                        id        TEXT    NOT NULL PRIMARY KEY,
                        mime_type TEXT    NOT NULL,
                        name      TEXT    NOT NULL,
                        bytes     BLOB    NOT NULL,
                        saved_at  INTEGER NOT NULL
                    ) WITHOUT ROWID
                "#
            ),
            upsert: format!(
                r#"
                    INSERT INTO {table} (id, mime_type, name, bytes, saved_at)
                    VALUES (?, ?, ?, ?, ?)
                    ON CONFLICT (id) DO UPDATE SET
                        mime_type = excluded.mime_type,
                        name      = excluded.name,
                        bytes     = excluded.bytes,
                        saved_at  = excluded.saved_at
                "#
            ),
            select_all: format!("SELECT id, mime_type, name, bytes, saved_at FROM {table}"),
            select_summaries: format!(
                "SELECT id, name, mime_type, length(bytes) AS size, saved_at FROM {table}"
            ),
            select_by_id: format!("SELECT id, mime_type, name, bytes, saved_at FROM {table} WHERE id = ?"),
            delete_by_id: format!("DELETE FROM {table} WHERE id = ?"),
        }
    }
}

/// Whether a table exists; bound parameter is the collection name.
/// Opens a write transaction holding the write lock from its first
/// statement. A deferred transaction that reads first can't wait for the lock
/// when it later writes; SQLite fails it with `SQLITE_BUSY` straight away.
pub(crate) const BEGIN_IMMEDIATE: &str = "BEGIN IMMEDIATE";

pub(crate) const COLLECTION_EXISTS: &str = "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?";
