//! Librarian ingest
//!
//! Reads `add <path>` / `remove <path>` lines from stdin and applies each one
//! to a TV library as its own task.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use librarian_ingest::cli::{CliOptions, LibrarySelector, Notification};
use librarian_ingest::config::Config;
use librarian_ingest::db::Database;
use librarian_ingest::services::{
    AddOutcome, IngestionService, MetadataGateway, OfflineGateway, RemoveOutcome, TmdbClient,
    init_tracing,
};

enum Applied {
    Added(AddOutcome),
    Removed(RemoveOutcome),
}

#[derive(Debug, Default)]
struct Summary {
    ingested: usize,
    skipped: usize,
    removed: usize,
    not_found: usize,
    failed: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    let options = CliOptions::from_args()?;

    init_tracing(&config.log)?;
    info!("Starting Librarian ingest");

    if let Some(parent) = config
        .database_file()
        .and_then(|file| file.parent().map(|p| p.to_path_buf()))
        .filter(|p| !p.as_os_str().is_empty())
    {
        tokio::fs::create_dir_all(&parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let db = Database::connect_with_retry(
        &config.database_url,
        config.database_max_connections,
        Duration::from_secs(5),
    )
    .await;
    let sync = db.sync_schema().await.context("Schema sync failed")?;
    info!(
        tables_created = ?sync.tables_created,
        indexes = sync.indexes_ensured,
        "Database schema ready"
    );

    let gateway: Arc<dyn MetadataGateway> = match &config.tmdb_api_key {
        Some(api_key) => Arc::new(TmdbClient::new(
            api_key.clone(),
            config.tmdb_language.clone(),
            config.metadata_timeout,
        )?),
        None => {
            warn!("TMDB_API_KEY not set, new shows will get placeholder metadata");
            Arc::new(OfflineGateway)
        }
    };

    let service = IngestionService::new(db, gateway, config.ingest_config());
    let library = match options.selector()? {
        LibrarySelector::Id(id) => service.open_library(id).await?,
        LibrarySelector::Path { name, path } => service.ensure_library(&name, &path).await?,
    };

    info!(
        library_id = %library.id(),
        name = %library.name(),
        "Reading notifications from stdin"
    );

    let mut tasks = JoinSet::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let notification = match Notification::parse(&line) {
            Ok(Some(notification)) => notification,
            Ok(None) => continue,
            Err(e) => {
                warn!(error = %e, "Ignoring malformed line");
                continue;
            }
        };

        let library = library.clone();
        tasks.spawn(async move {
            let result = match &notification {
                Notification::Add(path) => library.add(path).await.map(Applied::Added),
                Notification::Remove(path) => library.remove(path).await.map(Applied::Removed),
            };
            (notification, result)
        });
    }

    let mut summary = Summary::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, Ok(Applied::Added(AddOutcome::Skipped(_))))) => summary.skipped += 1,
            Ok((_, Ok(Applied::Added(AddOutcome::Ingested { .. })))) => summary.ingested += 1,
            Ok((_, Ok(Applied::Removed(RemoveOutcome::NotFound)))) => summary.not_found += 1,
            Ok((_, Ok(Applied::Removed(RemoveOutcome::Removed { .. })))) => summary.removed += 1,
            Ok((notification, Err(e))) => {
                error!(
                    path = notification.path(),
                    store_failure = e.is_store_failure(),
                    error = %e,
                    "Notification failed"
                );
                summary.failed += 1;
            }
            Err(e) => {
                error!(error = %e, "Notification task panicked");
                summary.failed += 1;
            }
        }
    }

    let stats = library.stats().await?;
    info!(
        ingested = summary.ingested,
        skipped = summary.skipped,
        removed = summary.removed,
        not_found = summary.not_found,
        failed = summary.failed,
        shows = stats.show_count,
        seasons = stats.season_count,
        episodes = stats.episode_count,
        "All notifications processed"
    );

    Ok(())
}
