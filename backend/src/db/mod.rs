//! Database connection and operations

pub mod episodes;
pub mod libraries;
pub mod metadata;
pub mod schema_sync;
pub mod seasons;
pub mod sqlite_helpers;
pub mod tv_shows;

use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{info, warn};

pub use episodes::{CreateEpisode, EpisodeRecord, EpisodeRepository};
pub use libraries::{
    CreateLibrary, LIBRARY_TYPE_SERIES, LibraryRecord, LibraryRepository, LibraryStats,
};
pub use metadata::{
    EpisodeMetadataRecord, MetadataCounts, MetadataRepository, SeasonMetadataRecord,
    ShowMetadataRecord,
};
pub use schema_sync::SchemaSyncResult;
pub use seasons::{CreateSeason, SeasonRecord, SeasonRepository};
pub use tv_shows::{CreateTvShow, TvShowRecord, TvShowRepository};

/// Database wrapper providing connection pool access
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database wrapper from an existing pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn connect_options(url: &str) -> Result<SqliteConnectOptions, sqlx::Error> {
        Ok(SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true))
    }

    /// Open a connection pool, creating the database file if needed
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(Self::connect_options(url)?)
            .await?;

        Ok(Self { pool })
    }

    /// Create a new database connection pool with retry logic
    /// Retries every `retry_interval` until successful
    pub async fn connect_with_retry(
        url: &str,
        max_connections: u32,
        retry_interval: Duration,
    ) -> Self {
        loop {
            match Self::connect(url, max_connections).await {
                Ok(db) => {
                    info!(url = %url, max_connections, "Connected to database");
                    return db;
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        "Database connection failed. Retrying in {} seconds...",
                        retry_interval.as_secs()
                    );
                    tokio::time::sleep(retry_interval).await;
                }
            }
        }
    }

    /// Private in-memory database with the schema applied.
    ///
    /// Holds exactly one connection for its whole life; a second connection
    /// would see a different, empty database.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.sync_schema().await?;
        Ok(db)
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.pool.begin().await
    }

    /// Create any missing tables and indexes
    pub async fn sync_schema(&self) -> Result<SchemaSyncResult, sqlx::Error> {
        schema_sync::sync_schema(&self.pool).await
    }

    /// Get a library repository
    pub fn libraries(&self) -> LibraryRepository {
        LibraryRepository::new(self.pool.clone())
    }

    /// Get a TV show repository
    pub fn tv_shows(&self) -> TvShowRepository {
        TvShowRepository::new(self.pool.clone())
    }

    pub fn seasons(&self) -> SeasonRepository {
        SeasonRepository::new(self.pool.clone())
    }

    /// Get an episode repository
    pub fn episodes(&self) -> EpisodeRepository {
        EpisodeRepository::new(self.pool.clone())
    }

    pub fn metadata(&self) -> MetadataRepository {
        MetadataRepository::new(self.pool.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database_has_schema() {
        let db = Database::connect_in_memory().await.unwrap();

        // Second sync finds everything in place
        let result = db.sync_schema().await.unwrap();
        assert!(result.tables_created.is_empty());

        let libraries = db.libraries().list().await.unwrap();
        assert!(libraries.is_empty());
    }

    #[tokio::test]
    async fn test_library_crud_and_stats() {
        let db = Database::connect_in_memory().await.unwrap();
        let library = db
            .libraries()
            .create(CreateLibrary::series("TV", "/media/tv"))
            .await
            .unwrap();

        assert!(library.is_series());
        let by_path = db.libraries().get_by_path("/media/tv").await.unwrap().unwrap();
        assert_eq!(by_path.id, library.id);

        let stats = db.libraries().stats(library.id).await.unwrap();
        assert_eq!(stats, LibraryStats::default());
    }

    #[tokio::test]
    async fn test_duplicate_show_insert_returns_none() {
        let db = Database::connect_in_memory().await.unwrap();
        let library = db
            .libraries()
            .create(CreateLibrary::series("TV", "/media/tv"))
            .await
            .unwrap();

        let input = CreateTvShow {
            library_id: library.id,
            path: "/media/tv/Breaking Bad",
            name: "Breaking Bad",
        };

        let mut conn = db.pool().acquire().await.unwrap();
        let first = TvShowRepository::insert(&mut conn, &input).await.unwrap();
        let second = TvShowRepository::insert(&mut conn, &input).await.unwrap();
        assert!(first.is_some());
        assert!(second.is_none());
        drop(conn);

        let shows = db.tv_shows().list_by_library(library.id).await.unwrap();
        assert_eq!(shows.len(), 1);
    }
}
