//! Library database repository

use sqlx::SqlitePool;
use uuid::Uuid;

use super::sqlite_helpers::now_iso8601;

/// The only library type this engine ingests
pub const LIBRARY_TYPE_SERIES: &str = "SERIES";

/// Library record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LibraryRecord {
    pub id: Uuid,
    pub name: String,
    pub path: String,
    pub library_type: String,
    pub created_at: String,
}

impl LibraryRecord {
    pub fn is_series(&self) -> bool {
        self.library_type == LIBRARY_TYPE_SERIES
    }
}

/// Input for creating a library
#[derive(Debug)]
pub struct CreateLibrary {
    pub name: String,
    pub path: String,
    pub library_type: String,
}

impl CreateLibrary {
    pub fn series(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            library_type: LIBRARY_TYPE_SERIES.to_string(),
        }
    }
}

/// Row counts for a library
#[derive(Debug, Clone, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct LibraryStats {
    pub show_count: i64,
    pub season_count: i64,
    pub episode_count: i64,
}

pub struct LibraryRepository {
    pool: SqlitePool,
}

impl LibraryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new library
    pub async fn create(&self, input: CreateLibrary) -> Result<LibraryRecord, sqlx::Error> {
        let id = Uuid::new_v4();

        sqlx::query_as::<_, LibraryRecord>(
            r#"
            INSERT INTO libraries (id, name, path, library_type, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, name, path, library_type, created_at
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.path)
        .bind(&input.library_type)
        .bind(now_iso8601())
        .fetch_one(&self.pool)
        .await
    }

    /// Get a library by ID
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<LibraryRecord>, sqlx::Error> {
        sqlx::query_as::<_, LibraryRecord>(
            "SELECT id, name, path, library_type, created_at FROM libraries WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Get a library by its root path
    pub async fn get_by_path(&self, path: &str) -> Result<Option<LibraryRecord>, sqlx::Error> {
        sqlx::query_as::<_, LibraryRecord>(
            "SELECT id, name, path, library_type, created_at FROM libraries WHERE path = ?",
        )
        .bind(path)
        .fetch_optional(&self.pool)
        .await
    }

    /// Get all libraries
    pub async fn list(&self) -> Result<Vec<LibraryRecord>, sqlx::Error> {
        sqlx::query_as::<_, LibraryRecord>(
            "SELECT id, name, path, library_type, created_at FROM libraries ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Count shows, seasons and episodes held by a library
    pub async fn stats(&self, id: Uuid) -> Result<LibraryStats, sqlx::Error> {
        sqlx::query_as::<_, LibraryStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM tv_shows WHERE library_id = ?1) AS show_count,
                (SELECT COUNT(*) FROM seasons se
                    JOIN tv_shows s ON s.id = se.show_id
                    WHERE s.library_id = ?1) AS season_count,
                (SELECT COUNT(*) FROM episodes e
                    JOIN tv_shows s ON s.id = e.show_id
                    WHERE s.library_id = ?1) AS episode_count
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
    }
}
