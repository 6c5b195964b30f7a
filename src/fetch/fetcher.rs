//! Paginated fetch loop
//!
//! One count request learns `recordsTotal`, then pages are requested in order
//! until the API runs dry, a configured maximum is reached, or the run is
//! interrupted. Each page is written to the store before the next request.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use crossbeam::channel::Sender;
use crate::Result;
use crate::storage::ProjectStore;
use crate::ui::ProgressMessage;
use super::client::{ApiError, PageRequest, PageResponse, SearchApi};

/// The API never returns more than this many records per page
pub const MAX_PAGE_LENGTH: usize = 15;

/// Sleep granularity while watching the shutdown flag
const PAUSE_SLICE: Duration = Duration::from_millis(100);

/// How a failed page request is retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts per page, including the first
    pub max_attempts: u32,
    /// Wait before the second attempt; doubles on each further attempt
    pub base_delay: Duration,
    /// Consecutive skipped pages after which the run gives up
    pub max_skipped_windows: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_skipped_windows: 10,
        }
    }
}

impl RetryPolicy {
    /// Wait after failed attempt number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

/// Knobs for one fetch run
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Requested page length; capped at `MAX_PAGE_LENGTH`
    pub page_size: usize,
    /// Pause between pages
    pub delay: Duration,
    /// Stop once this many records are persisted; `Some(0)` means no limit
    pub max_records: Option<usize>,
    pub retry: RetryPolicy,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_LENGTH,
            delay: Duration::from_secs(1),
            max_records: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl FetchOptions {
    fn page_length(&self) -> usize {
        self.page_size.clamp(1, MAX_PAGE_LENGTH)
    }

    fn record_limit(&self) -> Option<usize> {
        self.max_records.filter(|&max| max > 0)
    }
}

/// What a fetch run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchSummary {
    /// `recordsTotal` reported by the count request
    pub total_available: u64,
    /// Records written to the store
    pub persisted: usize,
    /// Records dropped because they did not decode
    pub rejected: usize,
    /// Page requests that returned a response
    pub pages: usize,
    pub retries: usize,
    pub skipped_windows: usize,
    pub interrupted: bool,
    pub count_failed: bool,
}

impl std::fmt::Display for FetchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Fetch Summary:")?;
        writeln!(f, "  Records available: {}", self.total_available)?;
        writeln!(f, "  Records saved: {}", self.persisted)?;
        writeln!(f, "  Records rejected: {}", self.rejected)?;
        writeln!(f, "  Pages: {}", self.pages)?;
        writeln!(f, "  Retries: {}", self.retries)?;
        write!(f, "  Skipped windows: {}", self.skipped_windows)
    }
}

enum PageOutcome {
    Page(PageResponse),
    /// The server answered with an error status
    Ended,
    /// Every attempt failed
    Exhausted,
    Interrupted,
}

/// Drives a `SearchApi` page by page into a `ProjectStore`.
pub struct Fetcher<A: SearchApi> {
    api: A,
    store: ProjectStore,
    shutdown: Arc<AtomicBool>,
    progress: Option<Sender<ProgressMessage>>,
}

impl<A: SearchApi> Fetcher<A> {
    /// Create a fetcher, making sure the store's schema exists
    pub fn new(api: A, store: ProjectStore) -> Result<Self> {
        store.ensure_schema()?;
        Ok(Self {
            api,
            store,
            shutdown: Arc::new(AtomicBool::new(false)),
            progress: None,
        })
    }

    /// Report progress events on `tx`
    pub fn with_progress(mut self, tx: Sender<ProgressMessage>) -> Self {
        self.progress = Some(tx);
        self
    }

    /// Share an existing shutdown flag, e.g. one owned by a signal handler
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown = flag;
        self
    }

    /// Setting this flag stops the run after the current page
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn store(&self) -> &ProjectStore {
        &self.store
    }

    /// Fetch every page and persist it.
    ///
    /// Never fails: a failed count request ends the run with nothing saved, and page
    /// errors are retried or skipped according to `options.retry`.
    pub fn run(&self, options: &FetchOptions) -> FetchSummary {
        let mut summary = FetchSummary::default();
        tracing::info!("Starting to scrape TDLR projects...");

        match self.api.fetch_page(&PageRequest::new(0, 1)) {
            Ok(page) => {
                summary.total_available = page.records_total;
                tracing::info!("Total records available: {}", page.records_total);
                if let Some(max) = options.record_limit() {
                    tracing::info!("Will fetch up to {} records as requested", max);
                }
            }
            Err(e) => {
                tracing::error!("Error getting record count: {}", e);
                summary.count_failed = true;
                return summary;
            }
        }

        let expected = match options.record_limit() {
            Some(max) => summary.total_available.min(max as u64),
            None => summary.total_available,
        };
        self.emit(ProgressMessage::Started { total: expected });

        let page_length = options.page_length();
        let mut start = 0;
        let mut skipped_in_row = 0;

        loop {
            if self.is_shutdown() {
                summary.interrupted = true;
                break;
            }
            if reached_limit(&summary, options) {
                tracing::info!("Reached the requested limit of {} records.", summary.persisted);
                break;
            }

            let mut length = page_length;
            if let Some(max) = options.record_limit() {
                length = length.min(max - summary.persisted);
            }

            tracing::info!("Fetching records {} to {}...", start, start + length);
            let request = PageRequest::new(start, length);

            let mut page = match self.fetch_with_retry(&request, &options.retry, &mut summary) {
                PageOutcome::Page(page) => page,
                PageOutcome::Ended => break,
                PageOutcome::Interrupted => {
                    summary.interrupted = true;
                    break;
                }
                PageOutcome::Exhausted => {
                    summary.skipped_windows += 1;
                    skipped_in_row += 1;
                    tracing::warn!("Skipping records {} to {}", start, start + length);
                    self.emit(ProgressMessage::Skipped { start, length });

                    if skipped_in_row > options.retry.max_skipped_windows {
                        tracing::error!("Giving up after {} consecutive skipped pages", skipped_in_row);
                        break;
                    }
                    start += length;
                    if !self.pause(options.delay) {
                        summary.interrupted = true;
                        break;
                    }
                    continue;
                }
            };
            skipped_in_row = 0;
            summary.pages += 1;

            if page.data.is_empty() {
                tracing::info!("No more projects to fetch.");
                break;
            }
            if page.data.len() > length {
                tracing::debug!("Server returned {} records for a page of {}", page.data.len(), length);
                page.data.truncate(length);
            }

            let received = page.data.len();
            let (projects, rejected) = page.decode_projects();
            summary.rejected += rejected;
            let saved = match self.store.upsert(&projects) {
                Ok(saved) => saved,
                Err(e) => {
                    tracing::error!("Failed to save batch starting at {}: {}", start, e);
                    0
                }
            };
            summary.persisted += saved;
            tracing::info!("Saved {} projects. Total saved: {}", saved, summary.persisted);
            self.emit(ProgressMessage::Page {
                start,
                saved,
                total_saved: summary.persisted,
            });

            if received < length {
                tracing::info!("Reached the end of available data.");
                break;
            }

            // The server's cursor moves by what it actually sent
            start += received;

            if reached_limit(&summary, options) {
                tracing::info!("Reached the requested limit of {} records.", summary.persisted);
                break;
            }
            if !self.pause(options.delay) {
                summary.interrupted = true;
                break;
            }
        }

        if summary.interrupted {
            tracing::warn!("Scraping interrupted; {} projects already saved", summary.persisted);
        }
        tracing::info!("Finished scraping. Total projects saved: {}", summary.persisted);
        self.emit(ProgressMessage::Finished {
            total_saved: summary.persisted,
        });

        summary
    }

    fn fetch_with_retry(
        &self,
        request: &PageRequest,
        policy: &RetryPolicy,
        summary: &mut FetchSummary,
    ) -> PageOutcome {
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.api.fetch_page(request) {
                Ok(page) => return PageOutcome::Page(page),
                Err(ApiError::Status(code)) => {
                    tracing::error!("Failed to fetch records. Status code: {}", code);
                    return PageOutcome::Ended;
                }
                Err(e) => {
                    tracing::warn!(
                        "Error scraping batch starting at {} (attempt {}/{}): {}",
                        request.start,
                        attempt,
                        max_attempts,
                        e
                    );
                    self.emit(ProgressMessage::Retry {
                        start: request.start,
                        attempt,
                        error: e.to_string(),
                    });

                    if attempt >= max_attempts {
                        return PageOutcome::Exhausted;
                    }
                    summary.retries += 1;
                    if !self.pause(policy.backoff(attempt)) {
                        return PageOutcome::Interrupted;
                    }
                }
            }
        }
    }

    fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Sleep for `duration`, waking early on shutdown. Returns false if
    /// shutdown was requested.
    fn pause(&self, duration: Duration) -> bool {
        let mut remaining = duration;
        while !remaining.is_zero() {
            if self.is_shutdown() {
                return false;
            }
            let slice = remaining.min(PAUSE_SLICE);
            std::thread::sleep(slice);
            remaining -= slice;
        }
        !self.is_shutdown()
    }

    fn emit(&self, message: ProgressMessage) {
        if let Some(tx) = &self.progress {
            let _ = tx.send(message);
        }
    }
}

fn reached_limit(summary: &FetchSummary, options: &FetchOptions) -> bool {
    options
        .record_limit()
        .is_some_and(|max| summary.persisted >= max)
}
