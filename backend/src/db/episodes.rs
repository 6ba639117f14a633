//! Episode database repository

use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::sqlite_helpers::now_iso8601;

/// Episode record from database
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct EpisodeRecord {
    pub id: i64,
    pub show_id: i64,
    pub season_number: i64,
    pub episode_number: i64,
    pub path: String,
    pub created_at: String,
}

/// Input for creating an episode
#[derive(Debug)]
pub struct CreateEpisode<'a> {
    pub show_id: i64,
    pub season_number: i64,
    pub episode_number: i64,
    pub path: &'a str,
}

pub struct EpisodeRepository {
    pool: SqlitePool,
}

impl EpisodeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get all episodes for a TV show
    pub async fn list_by_show(&self, show_id: i64) -> Result<Vec<EpisodeRecord>, sqlx::Error> {
        sqlx::query_as::<_, EpisodeRecord>(
            r#"
            SELECT id, show_id, season_number, episode_number, path, created_at
            FROM episodes
            WHERE show_id = ?
            ORDER BY season_number, episode_number
            "#,
        )
        .bind(show_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find(
        conn: &mut SqliteConnection,
        show_id: i64,
        season_number: i64,
        episode_number: i64,
    ) -> Result<Option<EpisodeRecord>, sqlx::Error> {
        sqlx::query_as::<_, EpisodeRecord>(
            r#"
            SELECT id, show_id, season_number, episode_number, path, created_at
            FROM episodes
            WHERE show_id = ? AND season_number = ? AND episode_number = ?
            "#,
        )
        .bind(show_id)
        .bind(season_number)
        .bind(episode_number)
        .fetch_optional(conn)
        .await
    }

    /// Find the episode backed by a file, scoped to one library
    pub async fn find_by_path(
        conn: &mut SqliteConnection,
        library_id: Uuid,
        path: &str,
    ) -> Result<Option<EpisodeRecord>, sqlx::Error> {
        sqlx::query_as::<_, EpisodeRecord>(
            r#"
            SELECT e.id, e.show_id, e.season_number, e.episode_number, e.path, e.created_at
            FROM episodes e
            JOIN tv_shows s ON s.id = e.show_id
            WHERE e.path = ? AND s.library_id = ?
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
        input: &CreateEpisode<'_>,
    ) -> Result<Option<EpisodeRecord>, sqlx::Error> {
        sqlx::query_as::<_, EpisodeRecord>(
            r#"
            INSERT INTO episodes (show_id, season_number, episode_number, path, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT DO NOTHING
            RETURNING id, show_id, season_number, episode_number, path, created_at
            "#,
        )
        .bind(input.show_id)
        .bind(input.season_number)
        .bind(input.episode_number)
        .bind(input.path)
        .bind(now_iso8601())
        .fetch_optional(conn)
        .await
    }

    /// Number of episodes still attached to a season
    pub async fn count_in_season(
        conn: &mut SqliteConnection,
        show_id: i64,
        season_number: i64,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM episodes WHERE show_id = ? AND season_number = ?",
        )
        .bind(show_id)
        .bind(season_number)
        .fetch_one(conn)
        .await
    }

    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM episodes WHERE id = ?")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
