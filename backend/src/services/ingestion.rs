//! Ingestion pipeline for a single discovered episode file
//!
//! Runs three steps in order: show, season, episode. Each step is
//! idempotent-by-check and commits on its own, so a failure part way leaves
//! the earlier rows in place and the next `add` of a matching path finishes
//! the job.
//!
//! Step shape:
//! 1. Existence check on a pooled connection. Found: nothing to do.
//! 2. Metadata lookup, bounded by the configured timeout. Misses become
//!    placeholders; errors abort the step before anything is written.
//! 3. One transaction: conflict-tolerant insert of the row, then its
//!    metadata row.
//!
//! Callers must hold the library's lock.

use std::future::Future;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::events::{LibraryEvent, emit};
use super::metadata::{MetadataGateway, ShowImages};
use super::path_parser::{EpisodePath, PathRejection};
use crate::db::{
    CreateEpisode, CreateSeason, CreateTvShow, Database, EpisodeRecord, EpisodeRepository,
    MetadataRepository, SeasonRepository, TvShowRecord, TvShowRepository,
};
use crate::error::{IngestError, Result};

/// What an `add` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// The path is not an episode file; nothing was written
    Skipped(PathRejection),
    Ingested {
        show_id: i64,
        season_number: i64,
        episode_id: i64,
        show_created: bool,
        season_created: bool,
        episode_created: bool,
    },
}

impl AddOutcome {
    /// True if any row was inserted
    pub fn created_anything(&self) -> bool {
        matches!(
            self,
            AddOutcome::Ingested { show_created, season_created, episode_created, .. }
                if *show_created || *season_created || *episode_created
        )
    }
}

pub struct IngestionPipeline<'a> {
    db: &'a Database,
    gateway: &'a dyn MetadataGateway,
    events: &'a broadcast::Sender<LibraryEvent>,
    metadata_timeout: Duration,
    library_id: Uuid,
}

impl<'a> IngestionPipeline<'a> {
    pub fn new(
        db: &'a Database,
        gateway: &'a dyn MetadataGateway,
        events: &'a broadcast::Sender<LibraryEvent>,
        metadata_timeout: Duration,
        library_id: Uuid,
    ) -> Self {
        Self {
            db,
            gateway,
            events,
            metadata_timeout,
            library_id,
        }
    }

    pub async fn run(&self, episode: &EpisodePath) -> Result<AddOutcome> {
        let (show, show_created) = self.ensure_show(episode).await?;
        let season_created = self.ensure_season(&show, episode).await?;
        let (record, episode_created) = self.ensure_episode(&show, episode).await?;

        Ok(AddOutcome::Ingested {
            show_id: show.id,
            season_number: record.season_number,
            episode_id: record.id,
            show_created,
            season_created,
            episode_created,
        })
    }

    async fn lookup<T>(&self, request: impl Future<Output = anyhow::Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.metadata_timeout, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(IngestError::Metadata(e)),
            Err(_) => Err(IngestError::MetadataTimeout(self.metadata_timeout)),
        }
    }

    async fn ensure_show(&self, episode: &EpisodePath) -> Result<(TvShowRecord, bool)> {
        if let Some(show) = self.find_show(&episode.show_path).await? {
            debug!(show_id = show.id, path = %show.path, "Show already in library");
            return Ok((show, false));
        }

        let lookup = self
            .lookup(self.gateway.get_show_metadata(&episode.show_name))
            .await?;

        let (metadata, images, trailer) = match lookup.metadata {
            Some(metadata) => (metadata, lookup.images, lookup.trailer),
            None => {
                warn!(
                    show = %episode.show_name,
                    "No metadata found for show, using placeholder"
                );
                (
                    self.gateway.dummy_metadata(&episode.show_name),
                    ShowImages::default(),
                    None,
                )
            }
        };

        let mut tx = self.db.begin().await?;
        let input = CreateTvShow {
            library_id: self.library_id,
            path: &episode.show_path,
            name: &episode.show_name,
        };

        let Some(show) = TvShowRepository::insert(&mut *tx, &input).await? else {
            tx.rollback().await?;
            let show = self
                .find_show(&episode.show_path)
                .await?
                .ok_or(sqlx::Error::RowNotFound)?;
            return Ok((show, false));
        };

        MetadataRepository::insert_show(&mut *tx, show.id, &metadata, &images, trailer.as_deref())
            .await?;
        tx.commit().await?;

        info!(
            library_id = %self.library_id,
            show_id = show.id,
            name = %show.name,
            placeholder = metadata.is_placeholder,
            "Added show"
        );
        emit(
            self.events,
            LibraryEvent::ShowAdded {
                library_id: self.library_id,
                show_id: show.id,
                name: show.name.clone(),
                placeholder: metadata.is_placeholder,
            },
        );

        Ok((show, true))
    }

    async fn find_show(&self, show_path: &str) -> Result<Option<TvShowRecord>> {
        let mut conn = self.db.pool().acquire().await?;
        Ok(TvShowRepository::find_by_path(&mut conn, self.library_id, show_path).await?)
    }

    /// Returns whether the season row was created
    async fn ensure_season(&self, show: &TvShowRecord, episode: &EpisodePath) -> Result<bool> {
        let season_number = i64::from(episode.season_number);

        let catalog_id = {
            let mut conn = self.db.pool().acquire().await?;
            if SeasonRepository::find(&mut conn, show.id, season_number)
                .await?
                .is_some()
            {
                debug!(show_id = show.id, season = season_number, "Season already in library");
                return Ok(false);
            }
            MetadataRepository::show_catalog_id(&mut conn, show.id).await?
        };

        let found = match catalog_id {
            Some(catalog_id) => {
                self.lookup(
                    self.gateway
                        .get_season_metadata(catalog_id, episode.season_number),
                )
                .await?
            }
            None => None,
        };

        let metadata = found.unwrap_or_else(|| {
            warn!(
                show_id = show.id,
                season = season_number,
                "No metadata found for season, using placeholder"
            );
            self.gateway.dummy_season_metadata(episode.season_number)
        });

        let mut tx = self.db.begin().await?;
        let input = CreateSeason {
            show_id: show.id,
            season_number,
            path: &episode.season_path,
        };

        if SeasonRepository::insert(&mut *tx, &input).await?.is_none() {
            tx.rollback().await?;
            return Ok(false);
        }

        MetadataRepository::insert_season(&mut *tx, show.id, season_number, &metadata).await?;
        tx.commit().await?;

        info!(
            library_id = %self.library_id,
            show_id = show.id,
            season = season_number,
            placeholder = metadata.is_placeholder,
            "Added season"
        );
        emit(
            self.events,
            LibraryEvent::SeasonAdded {
                library_id: self.library_id,
                show_id: show.id,
                season_number,
            },
        );

        Ok(true)
    }

    async fn ensure_episode(
        &self,
        show: &TvShowRecord,
        episode: &EpisodePath,
    ) -> Result<(EpisodeRecord, bool)> {
        let season_number = i64::from(episode.season_number);
        let episode_number = i64::from(episode.episode_number);

        let catalog_id = {
            let mut conn = self.db.pool().acquire().await?;
            if let Some(existing) =
                EpisodeRepository::find(&mut conn, show.id, season_number, episode_number).await?
            {
                debug!(
                    show_id = show.id,
                    season = season_number,
                    episode = episode_number,
                    path = %existing.path,
                    "Episode already in library"
                );
                return Ok((existing, false));
            }
            MetadataRepository::show_catalog_id(&mut conn, show.id).await?
        };

        let found = match catalog_id {
            Some(catalog_id) => {
                self.lookup(self.gateway.get_episode_metadata(
                    catalog_id,
                    episode.season_number,
                    episode.episode_number,
                ))
                .await?
            }
            None => None,
        };

        let metadata = found.unwrap_or_else(|| {
            warn!(
                show_id = show.id,
                season = season_number,
                episode = episode_number,
                "No metadata found for episode, using placeholder"
            );
            self.gateway
                .dummy_episode_metadata(episode.season_number, episode.episode_number)
        });

        let mut tx = self.db.begin().await?;
        let input = CreateEpisode {
            show_id: show.id,
            season_number,
            episode_number,
            path: &episode.path,
        };

        let Some(record) = EpisodeRepository::insert(&mut *tx, &input).await? else {
            tx.rollback().await?;
            let mut conn = self.db.pool().acquire().await?;
            let existing =
                EpisodeRepository::find(&mut conn, show.id, season_number, episode_number)
                    .await?
                    .ok_or(sqlx::Error::RowNotFound)?;
            return Ok((existing, false));
        };

        MetadataRepository::insert_episode(
            &mut *tx,
            show.id,
            season_number,
            episode_number,
            &metadata,
        )
        .await?;
        tx.commit().await?;

        info!(
            library_id = %self.library_id,
            show_id = show.id,
            season = season_number,
            episode = episode_number,
            path = %record.path,
            "Added episode"
        );
        emit(
            self.events,
            LibraryEvent::EpisodeAdded {
                library_id: self.library_id,
                show_id: show.id,
                season_number,
                episode_number,
                episode_id: record.id,
            },
        );

        Ok((record, true))
    }
}
