//! Metadata gateway
//!
//! The ingestion pipeline resolves show, season and episode identities through a
//! [`MetadataGateway`]. A lookup that matches nothing is not an error: shows come
//! back as [`ShowLookup::not_found`], seasons and episodes as `None`, and the
//! pipeline falls back to placeholder metadata. `Err` is reserved for transport
//! failures.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Descriptive metadata for a show
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowMetadata {
    /// Provider key used to look up seasons and episodes
    pub catalog_id: Option<i64>,
    pub title: String,
    pub overview: Option<String>,
    pub first_air_date: Option<String>,
    pub genres: Vec<String>,
    pub rating: Option<f64>,
    pub is_placeholder: bool,
}

impl ShowMetadata {
    /// Name-only metadata for a show the provider does not know
    pub fn placeholder(name: &str) -> Self {
        Self {
            catalog_id: None,
            title: name.to_string(),
            overview: None,
            first_air_date: None,
            genres: Vec::new(),
            rating: None,
            is_placeholder: true,
        }
    }
}

/// Artwork links for a show
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShowImages {
    pub posters: Vec<String>,
    pub backdrops: Vec<String>,
}

/// Result of a show lookup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShowLookup {
    pub metadata: Option<ShowMetadata>,
    pub images: ShowImages,
    pub trailer: Option<String>,
}

impl ShowLookup {
    pub fn not_found() -> Self {
        Self::default()
    }

    pub fn found(metadata: ShowMetadata, images: ShowImages, trailer: Option<String>) -> Self {
        Self {
            metadata: Some(metadata),
            images,
            trailer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonMetadata {
    pub catalog_id: Option<i64>,
    pub name: String,
    pub overview: Option<String>,
    pub air_date: Option<String>,
    pub poster: Option<String>,
    pub is_placeholder: bool,
}

impl SeasonMetadata {
    pub fn placeholder(season_number: u32) -> Self {
        let name = if season_number == 0 {
            "Specials".to_string()
        } else {
            format!("Season {}", season_number)
        };

        Self {
            catalog_id: None,
            name,
            overview: None,
            air_date: None,
            poster: None,
            is_placeholder: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeMetadata {
    pub catalog_id: Option<i64>,
    pub title: String,
    pub overview: Option<String>,
    pub air_date: Option<String>,
    pub still: Option<String>,
    pub rating: Option<f64>,
    pub is_placeholder: bool,
}

impl EpisodeMetadata {
    pub fn placeholder(episode_number: u32) -> Self {
        Self {
            catalog_id: None,
            title: format!("Episode {}", episode_number),
            overview: None,
            air_date: None,
            still: None,
            rating: None,
            is_placeholder: true,
        }
    }
}

/// Source of show, season and episode metadata.
///
/// The `dummy_*` methods synthesize placeholders and never fail; override them
/// only to change how placeholders look.
#[async_trait]
pub trait MetadataGateway: Send + Sync {
    async fn get_show_metadata(&self, name: &str) -> Result<ShowLookup>;

    async fn get_season_metadata(
        &self,
        catalog_id: i64,
        season_number: u32,
    ) -> Result<Option<SeasonMetadata>>;

    async fn get_episode_metadata(
        &self,
        catalog_id: i64,
        season_number: u32,
        episode_number: u32,
    ) -> Result<Option<EpisodeMetadata>>;

    fn dummy_metadata(&self, name: &str) -> ShowMetadata {
        ShowMetadata::placeholder(name)
    }

    fn dummy_season_metadata(&self, season_number: u32) -> SeasonMetadata {
        SeasonMetadata::placeholder(season_number)
    }

    fn dummy_episode_metadata(&self, _season_number: u32, episode_number: u32) -> EpisodeMetadata {
        EpisodeMetadata::placeholder(episode_number)
    }
}

/// Gateway used when no provider is configured; every lookup misses
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGateway;

#[async_trait]
impl MetadataGateway for OfflineGateway {
    async fn get_show_metadata(&self, _name: &str) -> Result<ShowLookup> {
        Ok(ShowLookup::not_found())
    }

    async fn get_season_metadata(
        &self,
        _catalog_id: i64,
        _season_number: u32,
    ) -> Result<Option<SeasonMetadata>> {
        Ok(None)
    }

    async fn get_episode_metadata(
        &self,
        _catalog_id: i64,
        _season_number: u32,
        _episode_number: u32,
    ) -> Result<Option<EpisodeMetadata>> {
        Ok(None)
    }
}
