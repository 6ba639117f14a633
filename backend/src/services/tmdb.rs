//! TMDB (The Movie Database) API client for TV metadata
//!
//! Base URL: https://api.themoviedb.org/3
//!
//! A show lookup searches `/search/tv` by name and takes the first hit, then
//! reads its details, artwork and videos. Season and episode lookups go
//! straight to `/tv/{id}/season/{n}` and `/tv/{id}/season/{n}/episode/{e}`.
//! A 404 anywhere means "not found" and is returned as `None`.
//!
//! Rate limiting: TMDB allows ~40 requests per 10 seconds.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::metadata::{
    EpisodeMetadata, MetadataGateway, SeasonMetadata, ShowImages, ShowLookup, ShowMetadata,
};
use super::rate_limiter::{RateLimitedClient, ResponseExt, RetryConfig, retry_async};

pub const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
const TMDB_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";
const YOUTUBE_WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// TMDB API client with rate limiting and retry logic
pub struct TmdbClient {
    client: Arc<RateLimitedClient>,
    api_key: String,
    language: String,
    retry_config: RetryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbTvSearchResult {
    pub results: Vec<TmdbTvSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbTvSummary {
    pub id: i64,
    pub name: String,
    pub first_air_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenre {
    pub id: i64,
    pub name: String,
}

/// Show details from `/tv/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbTvDetails {
    pub id: i64,
    pub name: String,
    pub overview: Option<String>,
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
    pub vote_average: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbImage {
    pub file_path: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbImages {
    #[serde(default)]
    pub posters: Vec<TmdbImage>,
    #[serde(default)]
    pub backdrops: Vec<TmdbImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbVideo {
    pub key: String,
    pub site: String,
    #[serde(rename = "type")]
    pub video_type: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbVideos {
    #[serde(default)]
    pub results: Vec<TmdbVideo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbSeason {
    pub id: i64,
    pub name: String,
    pub overview: Option<String>,
    pub air_date: Option<String>,
    pub poster_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbEpisode {
    pub id: i64,
    pub name: String,
    pub overview: Option<String>,
    pub air_date: Option<String>,
    pub still_path: Option<String>,
    pub vote_average: Option<f64>,
}

impl TmdbClient {
    pub fn new(api_key: String, language: String, request_timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Arc::new(RateLimitedClient::for_tmdb(request_timeout)?),
            api_key,
            language,
            retry_config: RetryConfig::default(),
        })
    }

    /// Get the image base URL for poster/backdrop images
    pub fn image_url(&self, path: &str, size: &str) -> String {
        format!("{}/{}{}", TMDB_IMAGE_BASE_URL, size, path)
    }

    /// Get original size image URL
    pub fn original_url(&self, path: Option<&str>) -> Option<String> {
        path.map(|p| self.image_url(p, "original"))
    }

    /// GET a TMDB resource. `Ok(None)` on 404.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Option<T>> {
        let url = format!("{}{}", TMDB_BASE_URL, path);
        let mut query: Vec<(&str, String)> = vec![
            ("api_key", self.api_key.clone()),
            ("language", self.language.clone()),
        ];
        query.extend(params.iter().cloned());

        let client = &self.client;
        let url = &url;
        let query = &query;

        retry_async(
            || async move {
                let response = client.get_with_query(url, query).await?;
                let status = response.status();

                if status == StatusCode::NOT_FOUND {
                    return Ok(None);
                }

                if status == StatusCode::UNAUTHORIZED {
                    anyhow::bail!("TMDB API key is invalid");
                }

                if response.is_transient_error() {
                    warn!(status = %status, "TMDB transient error, will retry");
                    anyhow::bail!("TMDB request failed with status: {}", status);
                }

                if !status.is_success() {
                    anyhow::bail!("TMDB request failed with status: {}", status);
                }

                let body = response
                    .json::<T>()
                    .await
                    .context("Failed to parse TMDB response")?;
                Ok(Some(body))
            },
            &self.retry_config,
            path,
        )
        .await
    }

    /// Search for shows by name
    pub async fn search_tv(&self, name: &str) -> Result<Vec<TmdbTvSummary>> {
        info!("Searching TMDB for show '{}'", name);

        let result: Option<TmdbTvSearchResult> = self
            .get_json(
                "/search/tv",
                &[
                    ("query", name.to_string()),
                    ("include_adult", "false".to_string()),
                ],
            )
            .await?;

        Ok(result.map(|r| r.results).unwrap_or_default())
    }

    pub async fn get_tv_details(&self, tmdb_id: i64) -> Result<Option<TmdbTvDetails>> {
        self.get_json(&format!("/tv/{}", tmdb_id), &[]).await
    }

    pub async fn get_tv_images(&self, tmdb_id: i64) -> Result<TmdbImages> {
        // Localized plus untagged artwork
        let images: Option<TmdbImages> = self
            .get_json(
                &format!("/tv/{}/images", tmdb_id),
                &[("include_image_language", format!("{},null", self.language_code()))],
            )
            .await?;

        Ok(images.unwrap_or_default())
    }

    pub async fn get_tv_videos(&self, tmdb_id: i64) -> Result<TmdbVideos> {
        let videos: Option<TmdbVideos> =
            self.get_json(&format!("/tv/{}/videos", tmdb_id), &[]).await?;
        Ok(videos.unwrap_or_default())
    }

    pub async fn get_season(&self, tmdb_id: i64, season_number: u32) -> Result<Option<TmdbSeason>> {
        self.get_json(&format!("/tv/{}/season/{}", tmdb_id, season_number), &[])
            .await
    }

    pub async fn get_episode(
        &self,
        tmdb_id: i64,
        season_number: u32,
        episode_number: u32,
    ) -> Result<Option<TmdbEpisode>> {
        self.get_json(
            &format!(
                "/tv/{}/season/{}/episode/{}",
                tmdb_id, season_number, episode_number
            ),
            &[],
        )
        .await
    }

    /// "en-US" -> "en"
    fn language_code(&self) -> &str {
        self.language.split('-').next().unwrap_or(&self.language)
    }

    fn to_show_images(&self, images: &TmdbImages) -> ShowImages {
        let urls = |list: &[TmdbImage]| -> Vec<String> {
            list.iter()
                .filter_map(|image| self.original_url(Some(&image.file_path)))
                .collect()
        };

        ShowImages {
            posters: urls(&images.posters),
            backdrops: urls(&images.backdrops),
        }
    }

    fn to_season_metadata(&self, season: TmdbSeason) -> SeasonMetadata {
        SeasonMetadata {
            catalog_id: Some(season.id),
            name: season.name,
            overview: season.overview.filter(|o| !o.is_empty()),
            air_date: season.air_date,
            poster: self.original_url(season.poster_path.as_deref()),
            is_placeholder: false,
        }
    }

    fn to_episode_metadata(&self, episode: TmdbEpisode) -> EpisodeMetadata {
        EpisodeMetadata {
            catalog_id: Some(episode.id),
            title: episode.name,
            overview: episode.overview.filter(|o| !o.is_empty()),
            air_date: episode.air_date,
            still: self.original_url(episode.still_path.as_deref()),
            rating: episode.vote_average,
            is_placeholder: false,
        }
    }
}

impl TmdbTvDetails {
    pub fn genre_names(&self) -> Vec<String> {
        self.genres.iter().map(|g| g.name.clone()).collect()
    }

    pub fn to_show_metadata(&self) -> ShowMetadata {
        ShowMetadata {
            catalog_id: Some(self.id),
            title: self.name.clone(),
            overview: self.overview.clone().filter(|o| !o.is_empty()),
            first_air_date: self.first_air_date.clone().filter(|d| !d.is_empty()),
            genres: self.genre_names(),
            rating: self.vote_average,
            is_placeholder: false,
        }
    }
}

impl TmdbVideos {
    /// First YouTube trailer, as a watch link
    pub fn trailer_url(&self) -> Option<String> {
        self.results
            .iter()
            .find(|v| v.site.eq_ignore_ascii_case("youtube") && v.video_type == "Trailer")
            .map(|v| format!("{}{}", YOUTUBE_WATCH_URL, v.key))
    }
}

#[async_trait]
impl MetadataGateway for TmdbClient {
    async fn get_show_metadata(&self, name: &str) -> Result<ShowLookup> {
        let Some(first) = self.search_tv(name).await?.into_iter().next() else {
            debug!(show = name, "No TMDB match");
            return Ok(ShowLookup::not_found());
        };

        let Some(details) = self.get_tv_details(first.id).await? else {
            return Ok(ShowLookup::not_found());
        };

        let images = self.get_tv_images(details.id).await?;
        let videos = self.get_tv_videos(details.id).await?;

        info!(
            show = name,
            tmdb_id = details.id,
            title = %details.name,
            "Matched show on TMDB"
        );

        Ok(ShowLookup::found(
            details.to_show_metadata(),
            self.to_show_images(&images),
            videos.trailer_url(),
        ))
    }

    async fn get_season_metadata(
        &self,
        catalog_id: i64,
        season_number: u32,
    ) -> Result<Option<SeasonMetadata>> {
        let season = self.get_season(catalog_id, season_number).await?;
        Ok(season.map(|s| self.to_season_metadata(s)))
    }

    async fn get_episode_metadata(
        &self,
        catalog_id: i64,
        season_number: u32,
        episode_number: u32,
    ) -> Result<Option<EpisodeMetadata>> {
        let episode = self
            .get_episode(catalog_id, season_number, episode_number)
            .await?;
        Ok(episode.map(|e| self.to_episode_metadata(e)))
    }
}
