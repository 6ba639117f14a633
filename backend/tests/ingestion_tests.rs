//! Integration tests for the ingestion and removal pipelines
//!
//! Tests run against a private SQLite database (in memory, or a temporary
//! file where several connections are needed) and a scripted metadata
//! gateway, so nothing here touches the network.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;

use librarian_ingest::IngestError;
use librarian_ingest::db::{CreateLibrary, Database, LibraryStats, MetadataCounts};
use librarian_ingest::services::{
    AddOutcome, EpisodeMetadata, IngestConfig, IngestionService, LibraryEvent, MetadataGateway,
    PathRejection, RemoveOutcome, SeasonMetadata, ShowImages, ShowLookup, ShowMetadata, TvLibrary,
};

// ============================================================================
// Scripted gateway
// ============================================================================

/// Knows a fixed set of shows by name; every known show has seasons 1 and 2
#[derive(Default)]
struct ScriptedGateway {
    catalog: HashMap<String, i64>,
    delay: Option<Duration>,
    fail_shows: AtomicBool,
    fail_seasons: AtomicBool,
    show_calls: AtomicUsize,
    season_calls: AtomicUsize,
}

impl ScriptedGateway {
    fn knowing(shows: &[(&str, i64)]) -> Self {
        Self {
            catalog: shows.iter().map(|(n, id)| (n.to_string(), *id)).collect(),
            ..Default::default()
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl MetadataGateway for ScriptedGateway {
    async fn get_show_metadata(&self, name: &str) -> anyhow::Result<ShowLookup> {
        self.show_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        if self.fail_shows.load(Ordering::SeqCst) {
            anyhow::bail!("provider unavailable");
        }

        let Some(&catalog_id) = self.catalog.get(name) else {
            return Ok(ShowLookup::not_found());
        };

        Ok(ShowLookup::found(
            ShowMetadata {
                catalog_id: Some(catalog_id),
                title: name.to_string(),
                overview: Some(format!("All about {}", name)),
                first_air_date: Some("2008-01-20".to_string()),
                genres: vec!["Drama".to_string(), "Crime".to_string()],
                rating: Some(8.9),
                is_placeholder: false,
            },
            ShowImages {
                posters: vec!["https://img.example/poster.jpg".to_string()],
                backdrops: vec!["https://img.example/backdrop.jpg".to_string()],
            },
            Some("https://www.youtube.com/watch?v=trailer".to_string()),
        ))
    }

    async fn get_season_metadata(
        &self,
        catalog_id: i64,
        season_number: u32,
    ) -> anyhow::Result<Option<SeasonMetadata>> {
        self.season_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        if self.fail_seasons.load(Ordering::SeqCst) {
            anyhow::bail!("provider unavailable");
        }

        if !(1..=2).contains(&season_number) {
            return Ok(None);
        }

        Ok(Some(SeasonMetadata {
            catalog_id: Some(catalog_id * 100 + i64::from(season_number)),
            name: format!("Season {} (catalog)", season_number),
            overview: None,
            air_date: None,
            poster: None,
            is_placeholder: false,
        }))
    }

    async fn get_episode_metadata(
        &self,
        catalog_id: i64,
        season_number: u32,
        episode_number: u32,
    ) -> anyhow::Result<Option<EpisodeMetadata>> {
        self.pause().await;

        if !(1..=2).contains(&season_number) {
            return Ok(None);
        }

        Ok(Some(EpisodeMetadata {
            catalog_id: Some(catalog_id * 10_000 + i64::from(episode_number)),
            title: format!("Catalog episode {}", episode_number),
            overview: None,
            air_date: None,
            still: None,
            rating: Some(7.5),
            is_placeholder: false,
        }))
    }
}

// ============================================================================
// Helpers
// ============================================================================

const EPISODE: &str = "/Library/Breaking Bad/Season 2/Breaking.Bad.S02E05.mkv";

fn episode_path(season: u32, episode: u32) -> String {
    format!(
        "/Library/Breaking Bad/Season {}/Breaking.Bad.S{:02}E{:02}.mkv",
        season, season, episode
    )
}

async fn setup_with(
    gateway: Arc<ScriptedGateway>,
    metadata_timeout: Duration,
) -> (IngestionService, TvLibrary) {
    let db = Database::connect_in_memory().await.unwrap();
    let service = IngestionService::new(db, gateway, IngestConfig { metadata_timeout });
    let library = service.ensure_library("TV", "/Library").await.unwrap();
    (service, library)
}

async fn setup(gateway: Arc<ScriptedGateway>) -> (IngestionService, TvLibrary) {
    setup_with(gateway, Duration::from_secs(5)).await
}

fn known_gateway() -> Arc<ScriptedGateway> {
    Arc::new(ScriptedGateway::knowing(&[("Breaking Bad", 1396)]))
}

async fn stats(library: &TvLibrary) -> (i64, i64, i64) {
    let LibraryStats {
        show_count,
        season_count,
        episode_count,
    } = library.stats().await.unwrap();
    (show_count, season_count, episode_count)
}

async fn metadata_counts(service: &IngestionService) -> (i64, i64, i64) {
    let MetadataCounts {
        shows,
        seasons,
        episodes,
    } = service.database().metadata().counts().await.unwrap();
    (shows, seasons, episodes)
}

// ============================================================================
// Ingestion
// ============================================================================

mod ingestion {
    use super::*;

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let (service, library) = setup(known_gateway()).await;

        let first = library.add(EPISODE).await.unwrap();
        assert_matches!(
            first,
            AddOutcome::Ingested {
                show_created: true,
                season_created: true,
                episode_created: true,
                ..
            }
        );
        assert!(first.created_anything());

        let second = library.add(EPISODE).await.unwrap();
        assert_matches!(
            second,
            AddOutcome::Ingested {
                show_created: false,
                season_created: false,
                episode_created: false,
                ..
            }
        );
        assert!(!second.created_anything());

        assert_eq!(stats(&library).await, (1, 1, 1));
        assert_eq!(metadata_counts(&service).await, (1, 1, 1));
    }

    #[tokio::test]
    async fn test_matched_show_gets_catalog_metadata() {
        let gateway = known_gateway();
        let (service, library) = setup(gateway.clone()).await;

        let outcome = library.add(EPISODE).await.unwrap();
        let AddOutcome::Ingested { show_id, .. } = outcome else {
            panic!("expected ingestion, got {:?}", outcome);
        };

        let metadata = service.database().metadata();
        let show = metadata.get_show(show_id).await.unwrap().unwrap();
        assert_eq!(show.catalog_id, Some(1396));
        assert!(!show.is_placeholder);
        assert_eq!(show.genres(), vec!["Drama", "Crime"]);
        assert_eq!(show.posters(), vec!["https://img.example/poster.jpg"]);
        assert_eq!(
            show.trailer.as_deref(),
            Some("https://www.youtube.com/watch?v=trailer")
        );

        let season = metadata.get_season(show_id, 2).await.unwrap().unwrap();
        assert_eq!(season.catalog_id, Some(139_602));
        assert!(!season.is_placeholder);

        let episode = metadata.get_episode(show_id, 2, 5).await.unwrap().unwrap();
        assert_eq!(episode.title, "Catalog episode 5");
        assert_eq!(gateway.season_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_show_gets_placeholders() {
        let gateway = Arc::new(ScriptedGateway::default());
        let (service, library) = setup(gateway.clone()).await;

        let outcome = library.add(EPISODE).await.unwrap();
        let AddOutcome::Ingested { show_id, .. } = outcome else {
            panic!("expected ingestion, got {:?}", outcome);
        };

        let metadata = service.database().metadata();
        let show = metadata.get_show(show_id).await.unwrap().unwrap();
        assert!(show.is_placeholder);
        assert_eq!(show.title, "Breaking Bad");
        assert_eq!(show.catalog_id, None);
        assert!(show.posters().is_empty());
        assert!(show.backdrops().is_empty());
        assert_eq!(show.trailer, None);

        // Without a catalog id the season and episode lookups are skipped
        assert_eq!(gateway.season_calls.load(Ordering::SeqCst), 0);

        let season = metadata.get_season(show_id, 2).await.unwrap().unwrap();
        assert!(season.is_placeholder);
        assert_eq!(season.name, "Season 2");

        let episode = metadata.get_episode(show_id, 2, 5).await.unwrap().unwrap();
        assert!(episode.is_placeholder);
        assert_eq!(episode.title, "Episode 5");
    }

    #[tokio::test]
    async fn test_unknown_season_of_known_show_gets_placeholder() {
        let (service, library) = setup(known_gateway()).await;

        let outcome = library.add(&episode_path(7, 1)).await.unwrap();
        let AddOutcome::Ingested { show_id, .. } = outcome else {
            panic!("expected ingestion, got {:?}", outcome);
        };

        let metadata = service.database().metadata();
        let show = metadata.get_show(show_id).await.unwrap().unwrap();
        assert!(!show.is_placeholder);

        let season = metadata.get_season(show_id, 7).await.unwrap().unwrap();
        assert!(season.is_placeholder);
        let episode = metadata.get_episode(show_id, 7, 1).await.unwrap().unwrap();
        assert!(episode.is_placeholder);
    }

    #[tokio::test]
    async fn test_unsupported_extension_writes_nothing() {
        let gateway = known_gateway();
        let (service, library) = setup(gateway.clone()).await;

        let outcome = library.add("/Library/Show/Season 1/notes.txt").await.unwrap();
        assert_eq!(outcome, AddOutcome::Skipped(PathRejection::UnsupportedExtension));

        assert_eq!(stats(&library).await, (0, 0, 0));
        assert_eq!(metadata_counts(&service).await, (0, 0, 0));
        assert_eq!(gateway.show_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unparsable_paths_are_skipped() {
        let (_service, library) = setup(known_gateway()).await;

        assert_eq!(
            library.add("/Library/Breaking Bad/Extras/Making.Of.S01E01.mkv").await.unwrap(),
            AddOutcome::Skipped(PathRejection::MissingSeason)
        );
        assert_eq!(
            library.add("/Library/Breaking Bad/Season 1/Pilot.mkv").await.unwrap(),
            AddOutcome::Skipped(PathRejection::MissingEpisode)
        );
        assert_eq!(stats(&library).await, (0, 0, 0));
    }

    #[tokio::test]
    async fn test_gateway_failure_writes_nothing_and_retry_resumes() {
        let gateway = known_gateway();
        gateway.fail_shows.store(true, Ordering::SeqCst);
        let (service, library) = setup(gateway.clone()).await;

        let err = library.add(EPISODE).await.unwrap_err();
        assert_matches!(err, IngestError::Metadata(_));
        assert!(!err.is_store_failure());
        assert_eq!(stats(&library).await, (0, 0, 0));
        assert_eq!(metadata_counts(&service).await, (0, 0, 0));

        gateway.fail_shows.store(false, Ordering::SeqCst);
        library.add(EPISODE).await.unwrap();
        assert_eq!(stats(&library).await, (1, 1, 1));
        assert_eq!(metadata_counts(&service).await, (1, 1, 1));
    }

    #[tokio::test]
    async fn test_failed_season_step_keeps_show() {
        let gateway = known_gateway();
        gateway.fail_seasons.store(true, Ordering::SeqCst);
        let (service, library) = setup(gateway.clone()).await;

        assert_matches!(library.add(EPISODE).await, Err(IngestError::Metadata(_)));
        assert_eq!(stats(&library).await, (1, 0, 0));
        assert_eq!(metadata_counts(&service).await, (1, 0, 0));

        gateway.fail_seasons.store(false, Ordering::SeqCst);
        let outcome = library.add(EPISODE).await.unwrap();
        assert_matches!(
            outcome,
            AddOutcome::Ingested {
                show_created: false,
                season_created: true,
                episode_created: true,
                ..
            }
        );
        assert_eq!(stats(&library).await, (1, 1, 1));
        assert_eq!(metadata_counts(&service).await, (1, 1, 1));
    }

    #[tokio::test]
    async fn test_slow_gateway_times_out() {
        let gateway = Arc::new(
            ScriptedGateway::knowing(&[("Breaking Bad", 1396)])
                .with_delay(Duration::from_millis(500)),
        );
        let (service, library) = setup_with(gateway, Duration::from_millis(50)).await;

        let err = library.add(EPISODE).await.unwrap_err();
        assert_matches!(err, IngestError::MetadataTimeout(d) if d == Duration::from_millis(50));
        assert_eq!(stats(&library).await, (0, 0, 0));
        assert_eq!(metadata_counts(&service).await, (0, 0, 0));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_create_one_show() {
        let gateway = Arc::new(
            ScriptedGateway::knowing(&[("Breaking Bad", 1396)])
                .with_delay(Duration::from_millis(5)),
        );
        let (service, library) = setup(gateway.clone()).await;

        let mut handles = Vec::new();
        for season in 1..=2 {
            for episode in 1..=6 {
                let library = library.clone();
                let path = episode_path(season, episode);
                handles.push(tokio::spawn(async move { library.add(&path).await }));
            }
        }

        for result in futures::future::join_all(handles).await {
            result.unwrap().unwrap();
        }

        assert_eq!(stats(&library).await, (1, 2, 12));
        assert_eq!(metadata_counts(&service).await, (1, 2, 12));
        assert_eq!(gateway.show_calls.load(Ordering::SeqCst), 1);
        assert_eq!(gateway.season_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_subtitle_for_same_episode_is_not_a_second_episode() {
        let (_service, library) = setup(known_gateway()).await;

        library.add(EPISODE).await.unwrap();
        let outcome = library
            .add("/Library/Breaking Bad/Season 2/Breaking.Bad.S02E05.srt")
            .await
            .unwrap();

        assert_matches!(outcome, AddOutcome::Ingested { episode_created: false, .. });
        assert_eq!(stats(&library).await, (1, 1, 1));
    }
}

// ============================================================================
// Removal
// ============================================================================

mod removal {
    use super::*;

    #[tokio::test]
    async fn test_remove_last_episode_cascades() {
        let (service, library) = setup(known_gateway()).await;
        library.add(EPISODE).await.unwrap();

        let outcome = library.remove(EPISODE).await.unwrap();
        assert_matches!(
            outcome,
            RemoveOutcome::Removed {
                season_number: 2,
                season_removed: true,
                show_removed: true,
                ..
            }
        );

        assert_eq!(stats(&library).await, (0, 0, 0));
        assert_eq!(metadata_counts(&service).await, (0, 0, 0));
    }

    #[tokio::test]
    async fn test_remove_keeps_season_with_remaining_episodes() {
        let (service, library) = setup(known_gateway()).await;
        library.add(&episode_path(2, 5)).await.unwrap();
        library.add(&episode_path(2, 6)).await.unwrap();

        let outcome = library.remove(&episode_path(2, 5)).await.unwrap();
        let show_id = assert_matches!(
            outcome,
            RemoveOutcome::Removed {
                show_id,
                season_removed: false,
                show_removed: false,
                ..
            } => show_id
        );

        assert_eq!(stats(&library).await, (1, 1, 1));
        assert_eq!(metadata_counts(&service).await, (1, 1, 1));

        let episodes = service.database().episodes().list_by_show(show_id).await.unwrap();
        let paths: Vec<_> = episodes.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec![episode_path(2, 6).as_str()]);
    }

    #[tokio::test]
    async fn test_remove_keeps_show_with_remaining_seasons() {
        let (service, library) = setup(known_gateway()).await;
        library.add(&episode_path(1, 1)).await.unwrap();
        library.add(&episode_path(2, 1)).await.unwrap();

        let outcome = library.remove(&episode_path(1, 1)).await.unwrap();
        let show_id = assert_matches!(
            outcome,
            RemoveOutcome::Removed {
                show_id,
                season_number: 1,
                season_removed: true,
                show_removed: false,
                ..
            } => show_id
        );

        assert_eq!(stats(&library).await, (1, 1, 1));
        assert_eq!(metadata_counts(&service).await, (1, 1, 1));

        let seasons = service.database().seasons().list_by_show(show_id).await.unwrap();
        assert_eq!(seasons.len(), 1);
        assert_eq!(seasons[0].season_number, 2);
        assert_eq!(seasons[0].path, "/Library/Breaking Bad/Season 2");
    }

    #[tokio::test]
    async fn test_remove_unknown_path_is_noop() {
        let (_service, library) = setup(known_gateway()).await;
        library.add(EPISODE).await.unwrap();

        let outcome = library
            .remove("/Library/Breaking Bad/Season 2/Breaking.Bad.S02E06.mkv")
            .await
            .unwrap();
        assert_eq!(outcome, RemoveOutcome::NotFound);
        assert_eq!(stats(&library).await, (1, 1, 1));
    }

    #[tokio::test]
    async fn test_remove_is_scoped_to_library() {
        let (service, library) = setup(known_gateway()).await;
        library.add(EPISODE).await.unwrap();

        let other = service.ensure_library("Other", "/Other").await.unwrap();
        assert_eq!(other.remove(EPISODE).await.unwrap(), RemoveOutcome::NotFound);
        assert_eq!(stats(&library).await, (1, 1, 1));
    }

    #[tokio::test]
    async fn test_readd_after_removal() {
        let (_service, library) = setup(known_gateway()).await;
        library.add(EPISODE).await.unwrap();
        library.remove(EPISODE).await.unwrap();

        let outcome = library.add(EPISODE).await.unwrap();
        assert_matches!(outcome, AddOutcome::Ingested { show_created: true, .. });
        assert_eq!(stats(&library).await, (1, 1, 1));
    }
}

// ============================================================================
// Service
// ============================================================================

mod service {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    #[tokio::test]
    async fn test_events_follow_commits() {
        let (service, library) = setup(known_gateway()).await;
        let mut events = service.subscribe();

        library.add(EPISODE).await.unwrap();
        assert_matches!(events.try_recv(), Ok(LibraryEvent::ShowAdded { placeholder: false, .. }));
        assert_matches!(events.try_recv(), Ok(LibraryEvent::SeasonAdded { season_number: 2, .. }));
        assert_matches!(
            events.try_recv(),
            Ok(LibraryEvent::EpisodeAdded { season_number: 2, episode_number: 5, .. })
        );
        assert_matches!(events.try_recv(), Err(TryRecvError::Empty));

        library.remove(EPISODE).await.unwrap();
        assert_matches!(events.try_recv(), Ok(LibraryEvent::EpisodeRemoved { .. }));
        assert_matches!(events.try_recv(), Ok(LibraryEvent::SeasonRemoved { .. }));
        let last = events.try_recv().unwrap();
        assert_matches!(last, LibraryEvent::ShowRemoved { .. });
        assert_eq!(last.library_id(), library.id());
    }

    #[tokio::test]
    async fn test_failed_step_emits_nothing() {
        let gateway = known_gateway();
        gateway.fail_shows.store(true, Ordering::SeqCst);
        let (service, library) = setup(gateway).await;
        let mut events = service.subscribe();

        assert!(library.add(EPISODE).await.is_err());
        assert_matches!(events.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn test_open_library() {
        let (service, library) = setup(known_gateway()).await;

        let reopened = service.open_library(library.id()).await.unwrap();
        assert_eq!(reopened.name(), "TV");

        let missing = uuid::Uuid::new_v4();
        assert_matches!(
            service.open_library(missing).await,
            Err(IngestError::LibraryNotFound(id)) if id == missing
        );

        let movies = service
            .database()
            .libraries()
            .create(CreateLibrary {
                name: "Movies".to_string(),
                path: "/Movies".to_string(),
                library_type: "MOVIES".to_string(),
            })
            .await
            .unwrap();
        assert_matches!(
            service.open_library(movies.id).await,
            Err(IngestError::InvalidLibrary { library_type, .. }) if library_type == "MOVIES"
        );
    }

    #[tokio::test]
    async fn test_ensure_library_reuses_existing() {
        let (service, library) = setup(known_gateway()).await;

        let again = service.ensure_library("Renamed", "/Library").await.unwrap();
        assert_eq!(again.id(), library.id());
        assert_eq!(again.name(), "TV");
        assert_eq!(service.database().libraries().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_file_database_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let url = dir.path().join("librarian.db").to_string_lossy().into_owned();

        let db = Database::connect(&url, 4).await.unwrap();
        let first = db.sync_schema().await.unwrap();
        assert_eq!(first.tables_created.len(), 7);

        let service = IngestionService::new(db, known_gateway(), IngestConfig::default());
        let library = service.ensure_library("TV", "/Library").await.unwrap();
        library.add(EPISODE).await.unwrap();
        let library_id = library.id();
        drop(library);
        service.database().pool().close().await;
        drop(service);

        let db = Database::connect(&url, 4).await.unwrap();
        let second = db.sync_schema().await.unwrap();
        assert!(second.tables_created.is_empty());

        let service = IngestionService::new(db, known_gateway(), IngestConfig::default());
        let library = service.open_library(library_id).await.unwrap();
        assert_eq!(stats(&library).await, (1, 1, 1));
    }
}

// ============================================================================
// Concurrency on a shared file database
// ============================================================================

mod concurrency {
    use super::*;

    fn show_episode(root: &str, show: &str, season: u32, episode: u32) -> String {
        format!("{root}/{show}/Season {season}/{show} S{season:02}E{episode:02}.mkv")
    }

    async fn file_service(dir: &tempfile::TempDir) -> IngestionService {
        let url = dir.path().join("librarian.db").to_string_lossy().into_owned();
        let db = Database::connect(&url, 8).await.unwrap();
        db.sync_schema().await.unwrap();
        IngestionService::new(db, known_gateway(), IngestConfig::default())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_two_libraries_then_concurrent_removes() {
        let dir = tempfile::tempdir().unwrap();
        let service = file_service(&dir).await;
        let first = service.ensure_library("Drama", "/LibraryA").await.unwrap();
        let second = service.ensure_library("Crime", "/LibraryB").await.unwrap();

        let first_paths: Vec<String> = (1..=2)
            .flat_map(|s| (1..=4).map(move |e| show_episode("/LibraryA", "Breaking Bad", s, e)))
            .collect();
        let second_paths: Vec<String> = (1..=3)
            .flat_map(|s| (1..=5).map(move |e| show_episode("/LibraryB", "The Wire", s, e)))
            .collect();

        let mut adds = Vec::new();
        for (a, b) in first_paths.iter().cycle().zip(second_paths.iter()) {
            for (library, path) in [(&first, a), (&second, b)] {
                let library = library.clone();
                let path = path.clone();
                adds.push(tokio::spawn(async move { library.add(&path).await }));
            }
        }
        for result in futures::future::join_all(adds).await {
            result.unwrap().unwrap();
        }

        assert_eq!(stats(&first).await, (1, 2, 8));
        assert_eq!(stats(&second).await, (1, 3, 15));
        assert_eq!(metadata_counts(&service).await, (2, 5, 23));

        let mut events = service.subscribe();
        let removes: Vec<_> = first_paths
            .iter()
            .cloned()
            .map(|path| {
                let library = first.clone();
                tokio::spawn(async move { library.remove(&path).await })
            })
            .collect();

        let mut seasons_removed = 0;
        let mut shows_removed = 0;
        for result in futures::future::join_all(removes).await {
            let outcome = result.unwrap().unwrap();
            assert_matches!(
                outcome,
                RemoveOutcome::Removed { season_removed, show_removed, .. } => {
                    seasons_removed += usize::from(season_removed);
                    shows_removed += usize::from(show_removed);
                }
            );
        }

        assert_eq!(seasons_removed, 2);
        assert_eq!(shows_removed, 1);
        assert_eq!(stats(&first).await, (0, 0, 0));
        assert_eq!(stats(&second).await, (1, 3, 15));
        assert_eq!(metadata_counts(&service).await, (1, 3, 15));

        let mut show_removed_events = 0;
        while let Ok(event) = events.try_recv() {
            assert_eq!(event.library_id(), first.id());
            if matches!(event, LibraryEvent::ShowRemoved { .. }) {
                show_removed_events += 1;
            }
        }
        assert_eq!(show_removed_events, 1);
    }
}
