//! Removal pipeline for a single vanished file
//!
//! Deletes the episode, then the season once it has no episodes left, then
//! the show once it has no seasons left, each together with its metadata row.
//! The whole cascade is one transaction. Callers must hold the library's lock.

use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

use super::events::{LibraryEvent, emit};
use crate::db::{Database, EpisodeRepository, MetadataRepository, SeasonRepository, TvShowRepository};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// No episode in this library is backed by the path
    NotFound,
    Removed {
        episode_id: i64,
        show_id: i64,
        season_number: i64,
        season_removed: bool,
        show_removed: bool,
    },
}

pub struct RemovalPipeline<'a> {
    db: &'a Database,
    events: &'a broadcast::Sender<LibraryEvent>,
    library_id: Uuid,
}

impl<'a> RemovalPipeline<'a> {
    pub fn new(
        db: &'a Database,
        events: &'a broadcast::Sender<LibraryEvent>,
        library_id: Uuid,
    ) -> Self {
        Self {
            db,
            events,
            library_id,
        }
    }

    pub async fn run(&self, path: &str) -> Result<RemoveOutcome> {
        let episode = {
            let mut conn = self.db.pool().acquire().await?;
            EpisodeRepository::find_by_path(&mut conn, self.library_id, path).await?
        };

        let Some(episode) = episode else {
            debug!(library_id = %self.library_id, path = path, "No episode for removed path");
            return Ok(RemoveOutcome::NotFound);
        };

        let show_id = episode.show_id;
        let season_number = episode.season_number;

        // First statement writes, so the transaction holds the write lock from the start
        let mut tx = self.db.begin().await?;
        if !EpisodeRepository::delete(&mut *tx, episode.id).await? {
            tx.rollback().await?;
            return Ok(RemoveOutcome::NotFound);
        }
        MetadataRepository::delete_episode(&mut *tx, show_id, season_number, episode.episode_number)
            .await?;

        let mut season_removed = false;
        let mut show_removed = false;

        if EpisodeRepository::count_in_season(&mut *tx, show_id, season_number).await? == 0 {
            SeasonRepository::delete(&mut *tx, show_id, season_number).await?;
            MetadataRepository::delete_season(&mut *tx, show_id, season_number).await?;
            season_removed = true;

            if SeasonRepository::count_by_show(&mut *tx, show_id).await? == 0 {
                TvShowRepository::delete(&mut *tx, show_id).await?;
                MetadataRepository::delete_show(&mut *tx, show_id).await?;
                show_removed = true;
            }
        }

        tx.commit().await?;

        info!(
            library_id = %self.library_id,
            show_id,
            season = season_number,
            episode = episode.episode_number,
            path = path,
            "Removed episode"
        );
        emit(
            self.events,
            LibraryEvent::EpisodeRemoved {
                library_id: self.library_id,
                show_id,
                episode_id: episode.id,
            },
        );

        if season_removed {
            info!(show_id, season = season_number, "Removed empty season");
            emit(
                self.events,
                LibraryEvent::SeasonRemoved {
                    library_id: self.library_id,
                    show_id,
                    season_number,
                },
            );
        }

        if show_removed {
            info!(show_id, "Removed empty show");
            emit(
                self.events,
                LibraryEvent::ShowRemoved {
                    library_id: self.library_id,
                    show_id,
                },
            );
        }

        Ok(RemoveOutcome::Removed {
            episode_id: episode.id,
            show_id,
            season_number,
            season_removed,
            show_removed,
        })
    }
}
