//! Fetcher - paginated scrape of the search API into the store

pub mod client;
pub mod fetcher;

pub use client::{ApiError, ClientConfig, HttpSearchApi, PageRequest, PageResponse, SearchApi};
pub use fetcher::{FetchOptions, FetchSummary, Fetcher, RetryPolicy, MAX_PAGE_LENGTH};
