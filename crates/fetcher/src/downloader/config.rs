//! Configuration types for the downloader system

use std::time::Duration;

use crate::downloader::core::{DownloadError, Result};

pub const ENV_USER_AGENT: &str = "FETCHER_USER_AGENT";
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "FETCHER_CONNECT_TIMEOUT_SECS";
pub const ENV_TIMEOUT_SECS: &str = "FETCHER_TIMEOUT_SECS";
pub const ENV_HTTP_CHUNK_SIZE: &str = "FETCHER_HTTP_CHUNK_SIZE";

/// Configuration shared by the HTTP and FTP downloaders
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Value of the `User-Agent` header sent with every HTTP request
    pub user_agent: String,
    pub connect_timeout: Duration,
    /// Overall request timeout; `None` lets large transfers run unbounded
    pub timeout: Option<Duration>,
    /// Upper bound on the size of each chunk written to disk for HTTP bodies
    pub http_chunk_size: usize,
}

impl DownloadConfig {
    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_http_chunk_size(mut self, chunk_size: usize) -> Self {
        self.http_chunk_size = chunk_size;
        self
    }

    /// Load configuration from the process environment
    ///
    /// A `.env` file in the working directory (or any parent) is read first,
    /// so values placed there behave like regular environment variables.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup, starting from defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(user_agent) = lookup(ENV_USER_AGENT) {
            let user_agent = user_agent.trim();
            if !user_agent.is_empty() {
                config.user_agent = user_agent.to_string();
            }
        }

        if let Some(secs) = parse_number::<u64>(&lookup, ENV_CONNECT_TIMEOUT_SECS)? {
            config.connect_timeout = Duration::from_secs(secs);
        }

        if let Some(secs) = parse_number::<u64>(&lookup, ENV_TIMEOUT_SECS)? {
            // zero means "no overall timeout"
            config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        if let Some(chunk_size) = parse_number::<usize>(&lookup, ENV_HTTP_CHUNK_SIZE)? {
            config.http_chunk_size = chunk_size;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the downloaders cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.http_chunk_size == 0 {
            return Err(DownloadError::Configuration {
                message: "HTTP chunk size must be greater than zero".to_string(),
                field: Some("http_chunk_size".to_string()),
            });
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| DownloadError::Configuration {
                message: format!("'{}' is not a valid number", raw),
                field: Some(key.to_string()),
            }),
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("fetcher/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout: Duration::from_secs(30),
            timeout: None,
            http_chunk_size: 1024,
        }
    }
}
