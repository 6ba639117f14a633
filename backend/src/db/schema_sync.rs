//! Schema synchronization for the ingestion tables
//!
//! Creates any missing table or index on startup. Existing tables are left
//! untouched; column renames or type changes need a database wipe.
//!
//! The unique constraints back the per-library lock. Inserts use
//! `ON CONFLICT DO NOTHING`, so one that races past the existence check
//! returns no row instead of producing a duplicate.

use sqlx::SqlitePool;
use tracing::{debug, info};

/// Result of a schema sync operation
#[derive(Debug, Default)]
pub struct SchemaSyncResult {
    pub tables_created: Vec<String>,
    pub indexes_ensured: usize,
}

const TABLES: &[(&str, &str)] = &[
    (
        "libraries",
        r#"
        CREATE TABLE libraries (
            id BLOB PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            path TEXT NOT NULL UNIQUE,
            library_type TEXT NOT NULL DEFAULT 'SERIES',
            created_at TEXT NOT NULL
        )
        "#,
    ),
    (
        "tv_shows",
        r#"
        CREATE TABLE tv_shows (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            library_id BLOB NOT NULL REFERENCES libraries(id),
            path TEXT NOT NULL,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE (path, library_id)
        )
        "#,
    ),
    (
        "seasons",
        r#"
        CREATE TABLE seasons (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            show_id INTEGER NOT NULL REFERENCES tv_shows(id),
            season_number INTEGER NOT NULL,
            path TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE (show_id, season_number)
        )
        "#,
    ),
    (
        "episodes",
        r#"
        CREATE TABLE episodes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            show_id INTEGER NOT NULL REFERENCES tv_shows(id),
            season_number INTEGER NOT NULL,
            episode_number INTEGER NOT NULL,
            path TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE (show_id, season_number, episode_number)
        )
        "#,
    ),
    (
        "show_metadata",
        r#"
        CREATE TABLE show_metadata (
            show_id INTEGER PRIMARY KEY NOT NULL,
            catalog_id INTEGER,
            title TEXT NOT NULL,
            overview TEXT,
            first_air_date TEXT,
            genres TEXT NOT NULL DEFAULT '[]',
            rating REAL,
            posters TEXT NOT NULL DEFAULT '[]',
            backdrops TEXT NOT NULL DEFAULT '[]',
            trailer TEXT,
            is_placeholder INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )
        "#,
    ),
    (
        "season_metadata",
        r#"
        CREATE TABLE season_metadata (
            show_id INTEGER NOT NULL,
            season_number INTEGER NOT NULL,
            catalog_id INTEGER,
            name TEXT NOT NULL,
            overview TEXT,
            air_date TEXT,
            poster TEXT,
            is_placeholder INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            PRIMARY KEY (show_id, season_number)
        )
        "#,
    ),
    (
        "episode_metadata",
        r#"
        CREATE TABLE episode_metadata (
            show_id INTEGER NOT NULL,
            season_number INTEGER NOT NULL,
            episode_number INTEGER NOT NULL,
            catalog_id INTEGER,
            title TEXT NOT NULL,
            overview TEXT,
            air_date TEXT,
            still TEXT,
            rating REAL,
            is_placeholder INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            PRIMARY KEY (show_id, season_number, episode_number)
        )
        "#,
    ),
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_tv_shows_library ON tv_shows(library_id)",
    "CREATE INDEX IF NOT EXISTS idx_episodes_path ON episodes(path)",
];

/// Check if a table exists in the database
async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool, sqlx::Error> {
    let result: Option<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name = ?")
            .bind(table_name)
            .fetch_optional(pool)
            .await?;

    Ok(result.is_some())
}

/// Create every missing table and index
pub async fn sync_schema(pool: &SqlitePool) -> Result<SchemaSyncResult, sqlx::Error> {
    let mut result = SchemaSyncResult::default();

    for (table_name, create_sql) in TABLES {
        if table_exists(pool, table_name).await? {
            continue;
        }

        debug!("Creating table {}", table_name);
        sqlx::query(create_sql).execute(pool).await?;
        info!("Created table: {}", table_name);
        result.tables_created.push(table_name.to_string());
    }

    for index_sql in INDEXES {
        sqlx::query(index_sql).execute(pool).await?;
        result.indexes_ensured += 1;
    }

    Ok(result)
}
