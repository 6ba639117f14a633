//! Application configuration management

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::services::{IngestConfig, LogConfig, LogFormat};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database path or `sqlite:` URL
    pub database_url: String,

    /// Connection pool size
    pub database_max_connections: u32,

    /// TMDB API key; without one every lookup produces placeholders
    pub tmdb_api_key: Option<String>,

    /// Language requested from TMDB
    pub tmdb_language: String,

    /// Bound on each metadata provider call
    pub metadata_timeout: Duration,

    pub log: LogConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // Prefer DATABASE_PATH, fall back to DATABASE_URL
        let database_url = var("DATABASE_PATH")
            .or_else(|| var("DATABASE_URL"))
            .unwrap_or_else(|| "./data/librarian.db".to_string());

        let database_max_connections = var("DATABASE_MAX_CONNECTIONS")
            .map(|v| v.parse::<u32>())
            .transpose()
            .context("Invalid DATABASE_MAX_CONNECTIONS")?
            .unwrap_or(10)
            .max(1);

        let metadata_timeout_secs = var("METADATA_TIMEOUT_SECS")
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("Invalid METADATA_TIMEOUT_SECS")?
            .unwrap_or(30);

        let log_format = var("LOG_FORMAT")
            .map(|v| v.parse::<LogFormat>())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            database_url,
            database_max_connections,
            tmdb_api_key: var("TMDB_API_KEY"),
            tmdb_language: var("TMDB_LANGUAGE").unwrap_or_else(|| "en-US".to_string()),
            metadata_timeout: Duration::from_secs(metadata_timeout_secs),
            log: LogConfig {
                format: log_format,
                default_filter: var("LOG_FILTER")
                    .unwrap_or_else(|| LogConfig::default().default_filter),
            },
        })
    }

    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            metadata_timeout: self.metadata_timeout,
        }
    }

    /// The database file on disk, if the URL names one
    pub fn database_file(&self) -> Option<PathBuf> {
        let path = self
            .database_url
            .trim_start_matches("sqlite://")
            .trim_start_matches("sqlite:");
        let path = path.split('?').next().unwrap_or(path);

        if path.is_empty() || path == ":memory:" {
            None
        } else {
            Some(PathBuf::from(path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.database_url, "./data/librarian.db");
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.tmdb_api_key, None);
        assert_eq!(config.tmdb_language, "en-US");
        assert_eq!(config.ingest_config().metadata_timeout, Duration::from_secs(30));
        assert_eq!(config.log.format, LogFormat::Pretty);
        assert_eq!(config.log.default_filter, "librarian_ingest=info");
    }

    #[test]
    fn test_database_path_wins_over_url() {
        let config = config_from(&[
            ("DATABASE_PATH", "/var/lib/librarian/tv.db"),
            ("DATABASE_URL", "sqlite://other.db"),
        ])
        .unwrap();
        assert_eq!(config.database_url, "/var/lib/librarian/tv.db");
    }

    #[test]
    fn test_blank_api_key_is_unset() {
        let config = config_from(&[("TMDB_API_KEY", "  ")]).unwrap();
        assert!(config.tmdb_api_key.is_none());
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        assert!(config_from(&[("METADATA_TIMEOUT_SECS", "soon")]).is_err());
        assert!(config_from(&[("DATABASE_MAX_CONNECTIONS", "-1")]).is_err());
        assert!(config_from(&[("LOG_FORMAT", "xml")]).is_err());
    }

    #[test]
    fn test_database_file() {
        let config = config_from(&[("DATABASE_URL", "sqlite://./data/tv.db?mode=rwc")]).unwrap();
        assert_eq!(config.database_file(), Some(PathBuf::from("./data/tv.db")));

        let config = config_from(&[("DATABASE_URL", "sqlite::memory:")]).unwrap();
        assert_eq!(config.database_file(), None);
    }
}
