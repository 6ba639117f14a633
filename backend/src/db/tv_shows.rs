//! TV Show database repository
//!
//! Lookups and writes used by the pipelines take a `&mut SqliteConnection` so
//! they can run inside a caller-owned transaction; pass `&mut *tx`.

use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::sqlite_helpers::now_iso8601;

/// TV Show record from database
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct TvShowRecord {
    pub id: i64,
    pub library_id: Uuid,
    pub path: String,
    pub name: String,
    pub created_at: String,
}

/// Input for creating a TV show
#[derive(Debug)]
pub struct CreateTvShow<'a> {
    pub library_id: Uuid,
    pub path: &'a str,
    pub name: &'a str,
}

pub struct TvShowRepository {
    pool: SqlitePool,
}

impl TvShowRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get all TV shows for a library
    pub async fn list_by_library(&self, library_id: Uuid) -> Result<Vec<TvShowRecord>, sqlx::Error> {
        sqlx::query_as::<_, TvShowRecord>(
            r#"
            SELECT id, library_id, path, name, created_at
            FROM tv_shows
            WHERE library_id = ?
            ORDER BY name
            "#,
        )
        .bind(library_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Find a show by its directory within a library
    pub async fn find_by_path(
        conn: &mut SqliteConnection,
        library_id: Uuid,
        path: &str,
    ) -> Result<Option<TvShowRecord>, sqlx::Error> {
        sqlx::query_as::<_, TvShowRecord>(
            r#"
            SELECT id, library_id, path, name, created_at
            FROM tv_shows
            WHERE path = ? AND library_id = ?
            "#,
        )
        .bind(path)
        .bind(library_id)
        .fetch_optional(conn)
        .await
    }

    /// Insert unless the row already exists, in which case `None` is returned
    pub async fn insert(
        conn: &mut SqliteConnection,
        input: &CreateTvShow<'_>,
    ) -> Result<Option<TvShowRecord>, sqlx::Error> {
        sqlx::query_as::<_, TvShowRecord>(
            r#"
            INSERT INTO tv_shows (library_id, path, name, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT DO NOTHING
            RETURNING id, library_id, path, name, created_at
            "#,
        )
        .bind(input.library_id)
        .bind(input.path)
        .bind(input.name)
        .bind(now_iso8601())
        .fetch_optional(conn)
        .await
    }

    /// Delete a show. Returns true if a row was removed.
    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tv_shows WHERE id = ?")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
