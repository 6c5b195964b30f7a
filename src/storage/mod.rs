//! Storage Layer - SQLite-backed persistence
//!
//! A single table holds every scraped project:
//! - projects(id, project_id UNIQUE, project fields..., date_scraped)
//!
//! The store keeps only the database path; each logical operation opens its
//! own connection and closes it when done.

pub mod schema;
pub mod query;
pub mod sqlite;

pub use query::{SearchField, SearchQuery, DEFAULT_SEARCH_LIMIT};
pub use sqlite::{DbStats, ProjectStore, SearchResults};
