//! TV library service
//!
//! [`IngestionService`] owns the store handle, the metadata gateway, the
//! per-library locks and the event channel. [`TvLibrary`] is a cheap handle
//! bound to one library record; its `add` and `remove` may be called
//! concurrently from any number of tasks.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

use super::events::{EVENT_CHANNEL_CAPACITY, LibraryEvent};
use super::ingestion::{AddOutcome, IngestionPipeline};
use super::library_locks::LibraryLocks;
use super::metadata::MetadataGateway;
use super::path_parser::{PathRejection, parse_episode_path};
use super::removal::{RemovalPipeline, RemoveOutcome};
use crate::db::{CreateLibrary, Database, LibraryRecord, LibraryStats};
use crate::error::{IngestError, Result};

/// Pipeline settings
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Upper bound on each metadata provider call
    pub metadata_timeout: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            metadata_timeout: Duration::from_secs(30),
        }
    }
}

struct ServiceInner {
    db: Database,
    gateway: Arc<dyn MetadataGateway>,
    locks: LibraryLocks,
    config: IngestConfig,
    events: broadcast::Sender<LibraryEvent>,
}

#[derive(Clone)]
pub struct IngestionService {
    inner: Arc<ServiceInner>,
}

impl IngestionService {
    pub fn new(db: Database, gateway: Arc<dyn MetadataGateway>, config: IngestConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(ServiceInner {
                db,
                gateway,
                locks: LibraryLocks::new(),
                config,
                events,
            }),
        }
    }

    /// Subscribe to library change events
    pub fn subscribe(&self) -> broadcast::Receiver<LibraryEvent> {
        self.inner.events.subscribe()
    }

    pub fn database(&self) -> &Database {
        &self.inner.db
    }

    /// Bind a handle to a library record. Only series libraries are accepted.
    pub fn library(&self, record: LibraryRecord) -> Result<TvLibrary> {
        if !record.is_series() {
            return Err(IngestError::InvalidLibrary {
                id: record.id,
                library_type: record.library_type,
            });
        }

        Ok(TvLibrary {
            service: self.clone(),
            record,
        })
    }

    pub async fn open_library(&self, id: Uuid) -> Result<TvLibrary> {
        let record = self
            .inner
            .db
            .libraries()
            .get_by_id(id)
            .await?
            .ok_or(IngestError::LibraryNotFound(id))?;

        self.library(record)
    }

    /// Open the series library rooted at `path`, creating it if needed
    pub async fn ensure_library(&self, name: &str, path: &str) -> Result<TvLibrary> {
        let libraries = self.inner.db.libraries();

        let record = match libraries.get_by_path(path).await? {
            Some(record) => record,
            None => {
                let record = libraries.create(CreateLibrary::series(name, path)).await?;
                info!(library_id = %record.id, name = %record.name, path = %record.path, "Created library");
                record
            }
        };

        self.library(record)
    }
}

/// Handle to one TV library
#[derive(Clone)]
pub struct TvLibrary {
    service: IngestionService,
    record: LibraryRecord,
}

impl std::fmt::Debug for TvLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TvLibrary")
            .field("id", &self.record.id)
            .field("name", &self.record.name)
            .field("path", &self.record.path)
            .finish()
    }
}

impl TvLibrary {
    pub fn id(&self) -> Uuid {
        self.record.id
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    /// Ingest a newly discovered file.
    ///
    /// Paths that are not episode files succeed as [`AddOutcome::Skipped`]
    /// without taking the library lock.
    pub async fn add(&self, path: &str) -> Result<AddOutcome> {
        let episode = match parse_episode_path(path) {
            Ok(episode) => episode,
            Err(PathRejection::UnsupportedExtension) => {
                debug!(path = path, "Ignoring non-media file");
                return Ok(AddOutcome::Skipped(PathRejection::UnsupportedExtension));
            }
            Err(reason) => {
                info!(path = path, reason = %reason, "Skipping file that is not an episode");
                return Ok(AddOutcome::Skipped(reason));
            }
        };

        let inner = &self.service.inner;
        let _guard = inner.locks.acquire(self.record.id).await;

        IngestionPipeline::new(
            &inner.db,
            inner.gateway.as_ref(),
            &inner.events,
            inner.config.metadata_timeout,
            self.record.id,
        )
        .run(&episode)
        .await
    }

    /// Reverse the ingestion of a file that disappeared
    pub async fn remove(&self, path: &str) -> Result<RemoveOutcome> {
        let inner = &self.service.inner;
        let _guard = inner.locks.acquire(self.record.id).await;

        RemovalPipeline::new(&inner.db, &inner.events, self.record.id)
            .run(path)
            .await
    }

    pub async fn stats(&self) -> Result<LibraryStats> {
        Ok(self.service.inner.db.libraries().stats(self.record.id).await?)
    }
}
