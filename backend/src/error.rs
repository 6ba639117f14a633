//! Error types for the ingestion engine
//!
//! Unparsable paths and metadata misses are not errors; they surface as
//! [`AddOutcome`](crate::services::AddOutcome) variants. Everything here aborts
//! the current pipeline step only.

use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("metadata provider error: {0:#}")]
    Metadata(anyhow::Error),

    #[error("metadata request timed out after {0:?}")]
    MetadataTimeout(Duration),

    #[error("library {0} not found")]
    LibraryNotFound(Uuid),

    #[error("library {id} has unsupported type '{library_type}'")]
    InvalidLibrary { id: Uuid, library_type: String },
}

pub type Result<T> = std::result::Result<T, IngestError>;

impl IngestError {
    /// True when the failure came from the store rather than the metadata provider
    pub fn is_store_failure(&self) -> bool {
        matches!(self, IngestError::Database(_))
    }
}
