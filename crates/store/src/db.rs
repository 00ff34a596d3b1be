//! Database connection, pool management and schema upgrades.

use crate::config::DatabaseConfig;
use crate::error::{ErrorKind, Result};
use crate::queries::{BEGIN_IMMEDIATE, Statements};
use exn::ResultExt;
use sqlx::SqliteConnection;
use sqlx::pool::PoolConnectionMetadata;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::sync::Arc;
use tracing::instrument;

// SQLite only ever has one writer; a handful of readers is plenty.
const MAX_CONNECTIONS: u32 = 5;

/// An open media database.
///
/// Opening runs [`ensure_ready`](Self::ensure_ready), so a `Database` always
/// has its record collection in place. Each operation on a
/// [`Repository`](crate::Repository) borrows a pooled connection for the
/// duration of one transaction and returns it on completion; the pool itself
/// is released with [`close`](Self::close).
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    config: Arc<DatabaseConfig>,
    statements: Arc<Statements>,
}

impl Database {
    /// Open (creating if absent) the database described by `config`, and make
    /// sure its record collection exists.
    ///
    /// Fails with [`InvalidConfig`](ErrorKind::InvalidConfig) before touching
    /// anything if the configuration is unusable, and with
    /// [`Open`](ErrorKind::Open) if the database can't be opened or upgraded.
    #[instrument(skip_all, fields(name = %config.name, version = config.version, collection = %config.collection))]
    pub async fn open(config: DatabaseConfig) -> Result<Self> {
        config.validate()?;
        let pool_options = SqlitePoolOptions::new()
            // Apply the query-based PRAGMAs to every connection the pool
            // opens, not only the first one.
            .after_connect(|conn, meta| Box::pin(async move { Self::apply_pragmas(conn, meta).await }));
        let pool = match config.file_path() {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Open)?;
                }
                let options = Self::base_options().filename(&path).create_if_missing(true);
                pool_options.max_connections(MAX_CONNECTIONS).connect_with(options).await
            },
            None => {
                let options = Self::base_options().filename(":memory:");
                // Every connection to ":memory:" is a different database, so
                // in-memory pools get exactly one connection that is never
                // reaped for being idle or old.
                pool_options
                    .min_connections(1)
                    .max_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .connect_with(options)
                    .await
            },
        }
        .or_raise(|| ErrorKind::Open)?;

        let statements = Arc::new(Statements::for_collection(&config.collection));
        let db = Self { pool, config: Arc::new(config), statements };
        db.ensure_ready().await?;
        Ok(db)
    }

    /// Base connection options shared between file and in-memory databases.
    fn base_options() -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // Concurrent saves queue up behind SQLite's single writer.
            .busy_timeout(std::time::Duration::from_millis(1500))
    }

    /// Apply additional PRAGMA settings that aren't exposed via SqliteConnectOptions.
    async fn apply_pragmas(conn: &mut SqliteConnection, _meta: PoolConnectionMetadata) -> sqlx::Result<()> {
        sqlx::query(
            r#"
                PRAGMA temp_store = MEMORY;
                PRAGMA cache_size = -8192;
            "#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Converge the schema on the configured version.
    ///
    /// Idempotent, and safe to run from several openers of the same database
    /// at once. Runs in a single write transaction:
    /// 1. a stored schema version newer than the requested one is a version
    ///    conflict and fails with [`Open`](ErrorKind::Open);
    /// 2. the record collection is created, keyed by `id`, if it is missing;
    /// 3. the requested version is recorded if it is newer than the stored one.
    #[instrument(skip(self), fields(collection = %self.config.collection))]
    pub async fn ensure_ready(&self) -> Result<()> {
        let requested = self.config.version;
        let mut tx = self.pool.begin_with(BEGIN_IMMEDIATE).await.or_raise(|| ErrorKind::Open)?;
        let (stored,): (i64,) =
            sqlx::query_as("PRAGMA user_version").fetch_one(&mut *tx).await.or_raise(|| ErrorKind::Open)?;
        let stored = u32::try_from(stored).or_raise(|| ErrorKind::Open)?;
        if stored > requested {
            let conflict = exn::Exn::from(ErrorKind::VersionConflict { stored, requested });
            return Err(conflict.raise(ErrorKind::Open));
        }
        sqlx::query(&self.statements.create_collection)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Open)?;
        if stored < requested {
            // PRAGMA arguments can't be bound; the version is a validated integer.
            sqlx::query(&format!("PRAGMA user_version = {requested}"))
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Open)?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Open)?;
        if stored < requested {
            tracing::info!(from = stored, to = requested, "Upgraded media database schema");
        }
        Ok(())
    }

    /// The schema version currently recorded in the database.
    pub async fn stored_version(&self) -> Result<u32> {
        let (stored,): (i64,) =
            sqlx::query_as("PRAGMA user_version").fetch_one(&self.pool).await.or_raise(|| ErrorKind::Read)?;
        u32::try_from(stored).or_raise(|| ErrorKind::InvalidData("schema version"))
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub(crate) fn statements(&self) -> Arc<Statements> {
        Arc::clone(&self.statements)
    }

    /// Close the database connection pool.
    ///
    /// Waits for all connections to be returned to the pool and then closes
    /// them. In-memory databases are destroyed. After calling this, the
    /// Database instance (and every repository created from it) should not
    /// be used.
    pub async fn close(&self) {
        // Let SQLite update query planner statistics
        _ = sqlx::query("PRAGMA optimize").execute(&self.pool).await;
        self.pool.close().await;
    }
}
