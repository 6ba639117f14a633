//! Season database repository

use sqlx::{SqliteConnection, SqlitePool};

use super::sqlite_helpers::now_iso8601;

/// Season record from database
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct SeasonRecord {
    pub id: i64,
    pub show_id: i64,
    pub season_number: i64,
    pub path: String,
    pub created_at: String,
}

/// Input for creating a season
#[derive(Debug)]
pub struct CreateSeason<'a> {
    pub show_id: i64,
    pub season_number: i64,
    pub path: &'a str,
}

pub struct SeasonRepository {
    pool: SqlitePool,
}

impl SeasonRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get all seasons of a show
    pub async fn list_by_show(&self, show_id: i64) -> Result<Vec<SeasonRecord>, sqlx::Error> {
        sqlx::query_as::<_, SeasonRecord>(
            r#"
            SELECT id, show_id, season_number, path, created_at
            FROM seasons
            WHERE show_id = ?
            ORDER BY season_number
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
    ) -> Result<Option<SeasonRecord>, sqlx::Error> {
        sqlx::query_as::<_, SeasonRecord>(
            r#"
            SELECT id, show_id, season_number, path, created_at
            FROM seasons
            WHERE show_id = ? AND season_number = ?
            "#,
        )
        .bind(show_id)
        .bind(season_number)
        .fetch_optional(conn)
        .await
    }

    /// Insert unless the row already exists, in which case `None` is returned
    pub async fn insert(
        conn: &mut SqliteConnection,
        input: &CreateSeason<'_>,
    ) -> Result<Option<SeasonRecord>, sqlx::Error> {
        sqlx::query_as::<_, SeasonRecord>(
            r#"
            INSERT INTO seasons (show_id, season_number, path, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT DO NOTHING
            RETURNING id, show_id, season_number, path, created_at
            "#,
        )
        .bind(input.show_id)
        .bind(input.season_number)
        .bind(input.path)
        .bind(now_iso8601())
        .fetch_optional(conn)
        .await
    }

    /// Number of seasons still attached to a show
    pub async fn count_by_show(conn: &mut SqliteConnection, show_id: i64) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM seasons WHERE show_id = ?")
            .bind(show_id)
            .fetch_one(conn)
            .await
    }

    pub async fn delete(
        conn: &mut SqliteConnection,
        show_id: i64,
        season_number: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM seasons WHERE show_id = ? AND season_number = ?")
            .bind(show_id)
            .bind(season_number)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
