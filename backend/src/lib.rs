//! TV library ingestion engine
//!
//! Turns "file added" / "file removed" notifications for a TV library into
//! show, season and episode rows with attached metadata, keeping the store
//! free of duplicates and orphans while many notifications arrive at once.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod services;

pub use error::{IngestError, Result};
