//! Search API client
//!
//! The wire protocol is a DataTables-style POST: the request names an offset
//! and a page length, the response carries `recordsTotal` and a `data` array.

use std::time::Duration;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use crate::project::ApiProject;

pub const DEFAULT_ENDPOINT: &str = "https://www.tdlr.texas.gov/TABS/Search/SearchProjects";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport-level failures
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status code {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid header: {0}")]
    InvalidHeader(String),
}

/// Body of one search request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub draw: u32,
    pub start: usize,
    pub length: usize,
    #[serde(rename = "search-type")]
    pub search_type: String,
}

impl PageRequest {
    pub fn new(start: usize, length: usize) -> Self {
        Self {
            draw: 1,
            start,
            length,
            search_type: "default".to_string(),
        }
    }
}

/// Body of one search response.
///
/// Records stay as raw JSON until `decode_projects`, so one malformed record
/// cannot fail the whole page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageResponse {
    #[serde(rename = "recordsTotal", default)]
    pub records_total: u64,
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
}

impl PageResponse {
    /// Decode each record on its own. Records that do not fit `ApiProject`
    /// are logged and counted, the rest are returned in order.
    pub fn decode_projects(&self) -> (Vec<ApiProject>, usize) {
        let mut projects = Vec::with_capacity(self.data.len());
        let mut rejected = 0;
        for (index, value) in self.data.iter().enumerate() {
            match ApiProject::deserialize(value) {
                Ok(project) => projects.push(project),
                Err(e) => {
                    let number = value.get("ProjectNumber").and_then(|n| n.as_str()).unwrap_or("?");
                    tracing::error!("Skipping malformed project {} (record {}): {}", number, index, e);
                    rejected += 1;
                }
            }
        }
        (projects, rejected)
    }
}

/// Anything that can answer a page request
pub trait SearchApi {
    fn fetch_page(&self, request: &PageRequest) -> Result<PageResponse, ApiError>;
}

impl<T: SearchApi + ?Sized> SearchApi for &T {
    fn fetch_page(&self, request: &PageRequest) -> Result<PageResponse, ApiError> {
        (**self).fetch_page(request)
    }
}

/// Endpoint, timeout, and default headers for `HttpSearchApi`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    pub timeout: Duration,
    pub headers: Vec<(String, String)>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            headers: default_headers(DEFAULT_USER_AGENT),
        }
    }
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>, timeout: Duration, user_agent: &str) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
            headers: default_headers(user_agent),
        }
    }

    fn header_map(&self) -> Result<HeaderMap, ApiError> {
        let mut map = HeaderMap::new();
        for (name, value) in &self.headers {
            let header = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::InvalidHeader(format!("{}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ApiError::InvalidHeader(format!("{}: {}", name, e)))?;
            map.insert(header, value);
        }
        Ok(map)
    }
}

fn default_headers(user_agent: &str) -> Vec<(String, String)> {
    vec![
        ("User-Agent".to_string(), user_agent.to_string()),
        ("Content-Type".to_string(), "application/json".to_string()),
        ("Accept".to_string(), "application/json, text/plain, */*".to_string()),
    ]
}

/// Blocking HTTP implementation of `SearchApi`
pub struct HttpSearchApi {
    client: Client,
    endpoint: String,
}

impl HttpSearchApi {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .default_headers(config.header_map()?)
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

impl SearchApi for HttpSearchApi {
    fn fetch_page(&self, request: &PageRequest) -> Result<PageResponse, ApiError> {
        tracing::debug!("POST {} start={} length={}", self.endpoint, request.start, request.length);
        let response = self.client.post(&self.endpoint).json(request).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        let body = response.text()?;
        Ok(serde_json::from_str(&body)?)
    }
}
