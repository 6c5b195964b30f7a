//! # tdlr-scraper
//!
//! Pulls project filings from the TDLR TABS search API into a local SQLite
//! file and answers substring searches over it.
//!
//! - Paginated fetcher with politeness delay and per-page retry
//! - Idempotent upsert keyed by project identifier
//! - Typed LIKE search over a fixed set of text columns

pub mod project;
pub mod storage;
pub mod fetch;
pub mod config;
pub mod ui;

use std::path::PathBuf;

// Re-exports for convenient access
pub use project::{ApiProject, ProjectId, StoredProject};
pub use storage::{ProjectStore, SearchField, SearchQuery, SearchResults};
pub use fetch::{ClientConfig, FetchOptions, FetchSummary, Fetcher, HttpSearchApi, SearchApi};

/// Result type alias for scraper operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for scraper operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("API error: {0}")]
    Api(#[from] fetch::ApiError),

    #[error("Database {} not found", .0.display())]
    StoreNotFound(PathBuf),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Unknown search field: {0}")]
    UnknownField(String),
}
