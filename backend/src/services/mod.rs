//! Ingestion services

pub mod events;
pub mod ingestion;
pub mod library_locks;
pub mod logging;
pub mod metadata;
pub mod path_parser;
pub mod rate_limiter;
pub mod removal;
pub mod tmdb;
pub mod tv_library;

pub use events::LibraryEvent;
pub use ingestion::{AddOutcome, IngestionPipeline};
pub use library_locks::{LibraryGuard, LibraryLocks};
pub use logging::{LogConfig, LogFormat, init_tracing};
pub use metadata::{
    EpisodeMetadata, MetadataGateway, OfflineGateway, SeasonMetadata, ShowImages, ShowLookup,
    ShowMetadata,
};
pub use path_parser::{EpisodePath, MediaFileKind, PathRejection, parse_episode_path};
pub use removal::{RemovalPipeline, RemoveOutcome};
pub use tmdb::TmdbClient;
pub use tv_library::{IngestConfig, IngestionService, TvLibrary};
