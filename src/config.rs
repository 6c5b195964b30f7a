use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::fetch::client::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
use crate::fetch::{ClientConfig, FetchOptions, RetryPolicy, MAX_PAGE_LENGTH};
use crate::{Error, Result};

pub const DEFAULT_DATABASE: &str = "tdlr_projects.db";

/// Settings read from `tdlr.toml`. Every key is optional.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ScraperConfig {
    pub database: Option<PathBuf>,
    pub endpoint: Option<String>,
    pub batch_size: Option<usize>,
    /// Seconds between pages
    pub delay: Option<f64>,
    /// Records to fetch; 0 means all
    pub max_records: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    pub max_retries: Option<u32>,
}

impl ScraperConfig {
    pub fn database(&self) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE))
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(
            self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT),
            self.timeout_secs.map(Duration::from_secs).unwrap_or(DEFAULT_TIMEOUT),
            self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT),
        )
    }

    pub fn fetch_options(&self) -> Result<FetchOptions> {
        let defaults = FetchOptions::default();
        let delay = match self.delay {
            Some(secs) => Duration::try_from_secs_f64(secs)
                .map_err(|_| Error::Config(format!("invalid delay: {}", secs)))?,
            None => defaults.delay,
        };
        Ok(FetchOptions {
            page_size: self.batch_size.unwrap_or(MAX_PAGE_LENGTH),
            delay,
            max_records: self.max_records.filter(|&max| max > 0),
            retry: RetryPolicy {
                max_attempts: self.max_retries.unwrap_or(defaults.retry.max_attempts),
                ..defaults.retry
            },
        })
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("tdlr.toml")
}

/// Load the config file, if there is one. `path` defaults to `tdlr.toml`.
pub fn load_config(path: Option<&Path>) -> Result<Option<ScraperConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: ScraperConfig = toml::from_str(&contents)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    Ok(Some(config))
}

pub fn ensure_db_dir(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(dir.path().join("tdlr.toml").as_path())).unwrap().is_none());
    }

    #[test]
    fn test_load_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tdlr.toml");
        std::fs::write(
            &path,
            "database = \"data/projects.db\"\nbatch_size = 10\ndelay = 0.5\nmax_retries = 5\n",
        )
        .unwrap();

        let config = load_config(Some(path.as_path())).unwrap().unwrap();
        assert_eq!(config.database(), PathBuf::from("data/projects.db"));

        let options = config.fetch_options().unwrap();
        assert_eq!(options.page_size, 10);
        assert_eq!(options.delay, Duration::from_millis(500));
        assert_eq!(options.max_records, None);
        assert_eq!(options.retry.max_attempts, 5);
    }

    #[test]
    fn test_defaults() {
        let config = ScraperConfig::default();
        assert_eq!(config.database(), PathBuf::from(DEFAULT_DATABASE));

        let client = config.client_config();
        assert_eq!(client.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(client.timeout, Duration::from_secs(30));

        let options = config.fetch_options().unwrap();
        assert_eq!(options.page_size, 15);
        assert_eq!(options.delay, Duration::from_secs(1));
    }

    #[test]
    fn test_rejects_bad_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tdlr.toml");
        std::fs::write(&path, "batch_sise = 10\n").unwrap();
        assert!(matches!(load_config(Some(path.as_path())), Err(Error::Config(_))));

        let config = ScraperConfig {
            delay: Some(-1.0),
            ..ScraperConfig::default()
        };
        assert!(config.fetch_options().is_err());
    }

    #[test]
    fn test_zero_max_records_is_unlimited() {
        let config = ScraperConfig {
            max_records: Some(0),
            ..ScraperConfig::default()
        };
        assert_eq!(config.fetch_options().unwrap().max_records, None);

        let config = ScraperConfig {
            max_records: Some(300),
            ..ScraperConfig::default()
        };
        assert_eq!(config.fetch_options().unwrap().max_records, Some(300));
    }

    #[test]
    fn test_ensure_db_dir() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("projects.db");
        ensure_db_dir(&db).unwrap();
        assert!(dir.path().join("nested").is_dir());
    }
}
