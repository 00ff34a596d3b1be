//! Media record operations.
//!
//! Every operation is a straight line of suspension points: acquire a
//! connection, (read the file,) run one transaction, settle. Nothing is
//! shared between calls, nothing is retried, and a failed operation leaves
//! the collection exactly as it was.
//!
//! # Concurrency
//! No locking or deduplication happens above SQLite. Two concurrent saves of
//! the same name are last-writer-wins. A save racing a delete of the same id
//! ends in whichever state committed last; no ordering between them is
//! guaranteed.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::file::FileHandle;
use crate::models::{MediaRecord, MediaRow, MediaSummary, SummaryRow};
use crate::queries::{BEGIN_IMMEDIATE, COLLECTION_EXISTS, Statements};
use exn::ResultExt;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::instrument;

/// Create, read and delete operations over one record collection.
///
/// Cheap to clone; all clones share the database's connection pool.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
    collection: Arc<str>,
    statements: Arc<Statements>,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
            collection: Arc::from(db.config().collection.as_str()),
            statements: db.statements(),
        }
    }
}
impl Repository {
    pub fn collection(&self) -> &str {
        &self.collection
    }

    // =========================================================================
    // Insert
    // =========================================================================

    /// Save a file as a media record and return its id.
    ///
    /// The record id is the file's name: saving a file whose name is already
    /// stored replaces the existing record in full (upsert-by-name).
    ///
    /// The file's content is read completely before the write transaction is
    /// opened. Fails with [`Read`](ErrorKind::Read) if the content can't be
    /// materialised and with [`Write`](ErrorKind::Write) if the upsert is
    /// rejected.
    #[instrument(skip_all, fields(collection = %self.collection, id = file.name()))]
    pub async fn save_media<F: FileHandle + ?Sized>(&self, file: &F) -> Result<String> {
        let bytes = file.read_bytes().await.or_raise(|| ErrorKind::Read)?;
        let record = MediaRecord::new(file.name(), file.mime_type(), bytes);
        self.put(&record).await?;
        tracing::debug!(bytes = record.bytes.len(), mime_type = %record.mime_type, "Media saved");
        Ok(record.id)
    }

    /// Upsert a complete record, keyed by its id.
    pub async fn put(&self, record: &MediaRecord) -> Result<()> {
        let row = MediaRow::from(record);
        let mut tx = self.pool.begin_with(BEGIN_IMMEDIATE).await.or_raise(|| ErrorKind::Write)?;
        sqlx::query(&self.statements.upsert)
            .bind(row.id)
            .bind(row.mime_type)
            .bind(row.name)
            .bind(row.bytes)
            .bind(row.saved_at)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Write)?;
        tx.commit().await.or_raise(|| ErrorKind::Write)?;
        Ok(())
    }

    // =========================================================================
    // Get/Fetch
    // =========================================================================

    /// Every record in the collection, payloads included, in no particular
    /// order. An empty collection gives an empty list.
    pub async fn get_all_media(&self) -> Result<Vec<MediaRecord>> {
        let rows: Vec<MediaRow> =
            sqlx::query_as(&self.statements.select_all).fetch_all(&self.pool).await.or_raise(|| ErrorKind::Read)?;
        rows.into_iter().map(MediaRecord::try_from).collect()
    }

    /// Metadata for every record in the collection, without loading payloads.
    pub async fn list_media(&self) -> Result<Vec<MediaSummary>> {
        let rows: Vec<SummaryRow> = sqlx::query_as(&self.statements.select_summaries)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Read)?;
        rows.into_iter().map(MediaSummary::try_from).collect()
    }

    /// The record stored under `id`, if any.
    ///
    /// Use [`MediaRecord::into_file`] to turn it back into a file.
    pub async fn get_media_by_id(&self, id: impl AsRef<str>) -> Result<Option<MediaRecord>> {
        let row: Option<MediaRow> = sqlx::query_as(&self.statements.select_by_id)
            .bind(id.as_ref())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Read)?;
        row.map(MediaRecord::try_from).transpose()
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Delete a record.
    pub async fn delete_media(&self, record: &MediaRecord) -> Result<()> {
        self.delete_media_by_id(&record.id).await
    }

    /// Delete the record stored under `id`.
    ///
    /// Deleting an id that isn't stored is a no-op. Fails with
    /// [`NotFound`](ErrorKind::NotFound) only when the collection itself is
    /// missing, and with [`Delete`](ErrorKind::Delete) if the transaction is
    /// rejected.
    #[instrument(skip_all, fields(collection = %self.collection, id = id.as_ref()))]
    pub async fn delete_media_by_id(&self, id: impl AsRef<str>) -> Result<()> {
        let mut tx = self.pool.begin_with(BEGIN_IMMEDIATE).await.or_raise(|| ErrorKind::Delete)?;
        let (tables,): (i64,) = sqlx::query_as(COLLECTION_EXISTS)
            .bind(&*self.collection)
            .fetch_one(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Delete)?;
        if tables == 0 {
            exn::bail!(ErrorKind::NotFound(self.collection.to_string()));
        }
        let result = sqlx::query(&self.statements.delete_by_id)
            .bind(id.as_ref())
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Delete)?;
        tx.commit().await.or_raise(|| ErrorKind::Delete)?;
        match result.rows_affected() {
            0 => tracing::debug!("No media stored under id; nothing deleted"),
            _ => tracing::debug!("Media deleted"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DatabaseConfig, MediaFile};
    use async_trait::async_trait;

    async fn repository() -> (Database, Repository) {
        let db = Database::open(DatabaseConfig::in_memory()).await.unwrap();
        let repo = Repository::from(&db);
        (db, repo)
    }

    struct UnreadableFile;

    #[async_trait]
    impl FileHandle for UnreadableFile {
        fn name(&self) -> &str {
            "broken.mp4"
        }

        fn mime_type(&self) -> &str {
            "video/mp4"
        }

        async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
            Err(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated"))
        }
    }

    #[tokio::test]
    async fn test_save_then_list_and_delete() {
        let (db, repo) = repository().await;

        let id = repo.save_media(&MediaFile::new("a.mp4", "video/mp4", [1, 2, 3])).await.unwrap();
        assert_eq!(id, "a.mp4");
        let all = repo.get_all_media().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "a.mp4");

        repo.save_media(&MediaFile::new("a.mp4", "video/mp4", [9, 9])).await.unwrap();
        let all = repo.get_all_media().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].bytes, vec![9, 9]);

        repo.delete_media(&all[0]).await.unwrap();
        assert!(repo.get_all_media().await.unwrap().is_empty());
        db.close().await;
    }

    #[tokio::test]
    async fn test_get_by_id_preserves_name_and_type() {
        let (db, repo) = repository().await;
        repo.save_media(&MediaFile::new("holiday.webm", "video/webm", vec![7; 32])).await.unwrap();

        let record = repo.get_media_by_id("holiday.webm").await.unwrap().unwrap();
        assert_eq!(record.name, "holiday.webm");
        assert_eq!(record.mime_type, "video/webm");
        let file = record.into_file();
        assert_eq!(file, MediaFile::new("holiday.webm", "video/webm", vec![7; 32]));
        db.close().await;
    }

    #[tokio::test]
    async fn test_get_by_id_missing() {
        let (db, repo) = repository().await;
        assert!(repo.get_media_by_id("nope.mp4").await.unwrap().is_none());
        db.close().await;
    }

    #[tokio::test]
    async fn test_rehydrated_file_can_be_saved_again() {
        let (db, repo) = repository().await;
        repo.save_media(&MediaFile::new("a.mp4", "video/mp4", [1, 2, 3])).await.unwrap();
        let file = repo.get_media_by_id("a.mp4").await.unwrap().unwrap().into_file();
        repo.save_media(&file).await.unwrap();
        assert_eq!(repo.get_all_media().await.unwrap().len(), 1);
        db.close().await;
    }

    #[tokio::test]
    async fn test_delete_missing_id_is_noop() {
        let (db, repo) = repository().await;
        repo.save_media(&MediaFile::new("keep.mp4", "video/mp4", [1])).await.unwrap();
        repo.delete_media_by_id("never-saved.mp4").await.unwrap();
        assert_eq!(repo.get_all_media().await.unwrap().len(), 1);
        db.close().await;
    }

    #[tokio::test]
    async fn test_delete_without_collection_is_not_found() {
        let (db, repo) = repository().await;
        sqlx::query("DROP TABLE \"media\"").execute(db.pool()).await.unwrap();
        let err = repo.delete_media_by_id("a.mp4").await.unwrap_err();
        assert_eq!(*err, ErrorKind::NotFound("media".to_string()));
        db.close().await;
    }

    #[tokio::test]
    async fn test_unreadable_file_leaves_store_untouched() {
        let (db, repo) = repository().await;
        let err = repo.save_media(&UnreadableFile).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Read);
        assert!(repo.get_all_media().await.unwrap().is_empty());
        db.close().await;
    }

    #[tokio::test]
    async fn test_write_failure_is_reported() {
        let (db, repo) = repository().await;
        sqlx::query("DROP TABLE \"media\"").execute(db.pool()).await.unwrap();
        let err = repo.save_media(&MediaFile::new("a.mp4", "video/mp4", [1])).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Write);
        let err = repo.get_all_media().await.unwrap_err();
        assert_eq!(*err, ErrorKind::Read);
        db.close().await;
    }

    #[tokio::test]
    async fn test_list_media_reports_sizes() {
        let (db, repo) = repository().await;
        repo.save_media(&MediaFile::new("a.mp4", "video/mp4", vec![0; 10])).await.unwrap();
        repo.save_media(&MediaFile::new("b.ogg", "audio/ogg", vec![0; 3])).await.unwrap();
        let mut summaries = repo.list_media().await.unwrap();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(summaries.len(), 2);
        assert_eq!((summaries[0].id.as_str(), summaries[0].size), ("a.mp4", 10));
        assert_eq!((summaries[1].mime_type.as_str(), summaries[1].size), ("audio/ogg", 3));
        db.close().await;
    }

    #[tokio::test]
    async fn test_empty_payload() {
        let (db, repo) = repository().await;
        repo.save_media(&MediaFile::new("empty.mp4", "video/mp4", Vec::new())).await.unwrap();
        let record = repo.get_media_by_id("empty.mp4").await.unwrap().unwrap();
        assert!(record.bytes.is_empty());
        assert_eq!(repo.list_media().await.unwrap()[0].size, 0);
        db.close().await;
    }

    #[tokio::test]
    async fn test_collections_are_independent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let videos = Database::open(DatabaseConfig::in_directory(temp_dir.path())).await.unwrap();
        let audio =
            Database::open(DatabaseConfig::in_directory(temp_dir.path()).with_collection("audio")).await.unwrap();
        let video_repo = Repository::from(&videos);
        let audio_repo = Repository::from(&audio);
        video_repo.save_media(&MediaFile::new("a.mp4", "video/mp4", [1])).await.unwrap();
        assert!(audio_repo.get_all_media().await.unwrap().is_empty());
        assert_eq!(video_repo.get_all_media().await.unwrap().len(), 1);
        videos.close().await;
        audio.close().await;
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig::in_directory(temp_dir.path());
        let db = Database::open(config.clone()).await.unwrap();
        Repository::from(&db).save_media(&MediaFile::new("a.mp4", "video/mp4", [4, 5])).await.unwrap();
        db.close().await;

        let db = Database::open(config).await.unwrap();
        let record = Repository::from(&db).get_media_by_id("a.mp4").await.unwrap().unwrap();
        assert_eq!(record.bytes, vec![4, 5]);
        db.close().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_saves_and_deletes() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db = Database::open(DatabaseConfig::in_directory(temp_dir.path())).await.unwrap();
        let mut tasks = tokio::task::JoinSet::new();
        for round in 0..20 {
            for task in 0..4 {
                let repo = Repository::from(&db);
                tasks.spawn(async move {
                    let file = MediaFile::new(format!("{round}-{task}.mp4"), "video/mp4", [1, 2, 3]);
                    repo.save_media(&file).await.map(drop)
                });
                // Ids that were never stored: deleting them must still succeed.
                let repo = Repository::from(&db);
                tasks.spawn(async move { repo.delete_media_by_id(format!("missing-{round}-{task}")).await });
            }
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap().unwrap();
        }
        assert_eq!(Repository::from(&db).list_media().await.unwrap().len(), 80);
        db.close().await;
    }
}
