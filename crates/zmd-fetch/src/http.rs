//! Default fetcher: HTTP via `ureq`, local paths via `tokio::fs`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ureq::Agent;

use crate::Fetcher;
use crate::consts::{DEFAULT_TIMEOUT, SUCCESS_STATUS};
use crate::error::FetchError;

/// Fetcher for remote and local locators.
///
/// `http://` and `https://` locators are fetched with a shared [`Agent`]
/// (connection pooling, global timeout). The blocking request runs on the
/// runtime's blocking pool so the caller only ever awaits. Every other
/// locator, including `file://` ones, is read from disk relative to the
/// configured base directory.
#[derive(Clone)]
pub struct DefaultFetcher {
    agent: Agent,
    base_dir: PathBuf,
}

impl DefaultFetcher {
    /// Create a fetcher with the default timeout, resolving local paths
    /// against the current directory.
    #[must_use]
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a fetcher with the given HTTP timeout.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            agent: create_agent(timeout),
            base_dir: PathBuf::from("."),
        }
    }

    /// Set the directory local locators are resolved against.
    #[must_use]
    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    async fn fetch_remote(&self, url: &str) -> Result<String, FetchError> {
        let agent = self.agent.clone();
        let owned = url.to_owned();
        tokio::task::spawn_blocking(move || get_text(&agent, &owned))
            .await
            .map_err(|e| FetchError::Network {
                url: url.to_owned(),
                message: e.to_string(),
            })?
    }

    async fn fetch_local(&self, url: &str) -> Result<String, FetchError> {
        let path = self.resolve_local(url);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| FetchError::Io {
                url: url.to_owned(),
                message: e.to_string(),
            })
    }

    fn resolve_local(&self, url: &str) -> PathBuf {
        let relative = url.strip_prefix("file://").unwrap_or(url);
        self.base_dir.join(Path::new(relative))
    }
}

impl Default for DefaultFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for DefaultFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if url.is_empty() {
            return Err(FetchError::MissingUrl);
        }

        let result = if is_remote(url) {
            self.fetch_remote(url).await
        } else {
            self.fetch_local(url).await
        };

        if let Err(err) = &result {
            tracing::warn!(url, error = %err, "Error getting file");
        }
        result
    }
}

/// Create HTTP agent with the specified timeout.
///
/// Status codes are checked by the caller, not turned into transport errors.
fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// Whether `url` must be fetched over HTTP.
fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Perform a blocking GET and return the body if the status is a success.
fn get_text(agent: &Agent, url: &str) -> Result<String, FetchError> {
    let network = |e: ureq::Error| FetchError::Network {
        url: url.to_owned(),
        message: e.to_string(),
    };

    let mut response = agent.get(url).call().map_err(network)?;
    let status = response.status().as_u16();
    if !SUCCESS_STATUS.contains(&status) {
        return Err(FetchError::Status {
            url: url.to_owned(),
            status,
        });
    }

    response.body_mut().read_to_string().map_err(network)
}
