//! Metadata database repository
//!
//! One metadata row per show, season and episode, keyed by the same identity as
//! the entity it describes. Writes use `INSERT OR REPLACE` so a retried step
//! overwrites instead of failing.

use sqlx::{SqliteConnection, SqlitePool};

use super::sqlite_helpers::{json_to_vec, now_iso8601, vec_to_json};
use crate::services::metadata::{EpisodeMetadata, SeasonMetadata, ShowImages, ShowMetadata};

/// Show metadata record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShowMetadataRecord {
    pub show_id: i64,
    pub catalog_id: Option<i64>,
    pub title: String,
    pub overview: Option<String>,
    pub first_air_date: Option<String>,
    /// JSON array
    pub genres: String,
    pub rating: Option<f64>,
    /// JSON array
    pub posters: String,
    /// JSON array
    pub backdrops: String,
    pub trailer: Option<String>,
    pub is_placeholder: bool,
    pub created_at: String,
}

impl ShowMetadataRecord {
    pub fn genres(&self) -> Vec<String> {
        json_to_vec(&self.genres)
    }

    pub fn posters(&self) -> Vec<String> {
        json_to_vec(&self.posters)
    }

    pub fn backdrops(&self) -> Vec<String> {
        json_to_vec(&self.backdrops)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SeasonMetadataRecord {
    pub show_id: i64,
    pub season_number: i64,
    pub catalog_id: Option<i64>,
    pub name: String,
    pub overview: Option<String>,
    pub air_date: Option<String>,
    pub poster: Option<String>,
    pub is_placeholder: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EpisodeMetadataRecord {
    pub show_id: i64,
    pub season_number: i64,
    pub episode_number: i64,
    pub catalog_id: Option<i64>,
    pub title: String,
    pub overview: Option<String>,
    pub air_date: Option<String>,
    pub still: Option<String>,
    pub rating: Option<f64>,
    pub is_placeholder: bool,
    pub created_at: String,
}

/// Row counts across the metadata tables
#[derive(Debug, Clone, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct MetadataCounts {
    pub shows: i64,
    pub seasons: i64,
    pub episodes: i64,
}

pub struct MetadataRepository {
    pool: SqlitePool,
}

impl MetadataRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_show(&self, show_id: i64) -> Result<Option<ShowMetadataRecord>, sqlx::Error> {
        sqlx::query_as::<_, ShowMetadataRecord>(
            r#"
            SELECT show_id, catalog_id, title, overview, first_air_date, genres, rating,
                   posters, backdrops, trailer, is_placeholder, created_at
            FROM show_metadata
            WHERE show_id = ?
            "#,
        )
        .bind(show_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_season(
        &self,
        show_id: i64,
        season_number: i64,
    ) -> Result<Option<SeasonMetadataRecord>, sqlx::Error> {
        sqlx::query_as::<_, SeasonMetadataRecord>(
            r#"
            SELECT show_id, season_number, catalog_id, name, overview, air_date, poster,
                   is_placeholder, created_at
            FROM season_metadata
            WHERE show_id = ? AND season_number = ?
            "#,
        )
        .bind(show_id)
        .bind(season_number)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_episode(
        &self,
        show_id: i64,
        season_number: i64,
        episode_number: i64,
    ) -> Result<Option<EpisodeMetadataRecord>, sqlx::Error> {
        sqlx::query_as::<_, EpisodeMetadataRecord>(
            r#"
            SELECT show_id, season_number, episode_number, catalog_id, title, overview,
                   air_date, still, rating, is_placeholder, created_at
            FROM episode_metadata
            WHERE show_id = ? AND season_number = ? AND episode_number = ?
            "#,
        )
        .bind(show_id)
        .bind(season_number)
        .bind(episode_number)
        .fetch_optional(&self.pool)
        .await
    }

    /// Count rows in each metadata table
    pub async fn counts(&self) -> Result<MetadataCounts, sqlx::Error> {
        sqlx::query_as::<_, MetadataCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM show_metadata) AS shows,
                (SELECT COUNT(*) FROM season_metadata) AS seasons,
                (SELECT COUNT(*) FROM episode_metadata) AS episodes
            "#,
        )
        .fetch_one(&self.pool)
        .await
    }

    /// Provider key recorded for a show, if it matched a catalog entry
    pub async fn show_catalog_id(
        conn: &mut SqliteConnection,
        show_id: i64,
    ) -> Result<Option<i64>, sqlx::Error> {
        let catalog_id: Option<Option<i64>> =
            sqlx::query_scalar("SELECT catalog_id FROM show_metadata WHERE show_id = ?")
                .bind(show_id)
                .fetch_optional(conn)
                .await?;

        Ok(catalog_id.flatten())
    }

    pub async fn insert_show(
        conn: &mut SqliteConnection,
        show_id: i64,
        metadata: &ShowMetadata,
        images: &ShowImages,
        trailer: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO show_metadata (
                show_id, catalog_id, title, overview, first_air_date, genres, rating,
                posters, backdrops, trailer, is_placeholder, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(show_id)
        .bind(metadata.catalog_id)
        .bind(&metadata.title)
        .bind(&metadata.overview)
        .bind(&metadata.first_air_date)
        .bind(vec_to_json(&metadata.genres))
        .bind(metadata.rating)
        .bind(vec_to_json(&images.posters))
        .bind(vec_to_json(&images.backdrops))
        .bind(trailer)
        .bind(metadata.is_placeholder)
        .bind(now_iso8601())
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn insert_season(
        conn: &mut SqliteConnection,
        show_id: i64,
        season_number: i64,
        metadata: &SeasonMetadata,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO season_metadata (
                show_id, season_number, catalog_id, name, overview, air_date, poster,
                is_placeholder, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(show_id)
        .bind(season_number)
        .bind(metadata.catalog_id)
        .bind(&metadata.name)
        .bind(&metadata.overview)
        .bind(&metadata.air_date)
        .bind(&metadata.poster)
        .bind(metadata.is_placeholder)
        .bind(now_iso8601())
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn insert_episode(
        conn: &mut SqliteConnection,
        show_id: i64,
        season_number: i64,
        episode_number: i64,
        metadata: &EpisodeMetadata,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO episode_metadata (
                show_id, season_number, episode_number, catalog_id, title, overview,
                air_date, still, rating, is_placeholder, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(show_id)
        .bind(season_number)
        .bind(episode_number)
        .bind(metadata.catalog_id)
        .bind(&metadata.title)
        .bind(&metadata.overview)
        .bind(&metadata.air_date)
        .bind(&metadata.still)
        .bind(metadata.rating)
        .bind(metadata.is_placeholder)
        .bind(now_iso8601())
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn delete_show(conn: &mut SqliteConnection, show_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM show_metadata WHERE show_id = ?")
            .bind(show_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn delete_season(
        conn: &mut SqliteConnection,
        show_id: i64,
        season_number: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM season_metadata WHERE show_id = ? AND season_number = ?")
            .bind(show_id)
            .bind(season_number)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn delete_episode(
        conn: &mut SqliteConnection,
        show_id: i64,
        season_number: i64,
        episode_number: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "DELETE FROM episode_metadata WHERE show_id = ? AND season_number = ? AND episode_number = ?",
        )
        .bind(show_id)
        .bind(season_number)
        .bind(episode_number)
        .execute(conn)
        .await?;
        Ok(())
    }
}
