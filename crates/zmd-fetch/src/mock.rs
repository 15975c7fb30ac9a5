//! Mock fetcher implementation for testing.
//!
//! Provides [`MockFetcher`] for unit testing without network access.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::Fetcher;
use crate::error::FetchError;

#[derive(Clone, Debug)]
enum MockResponse {
    Body(String),
    Status(u16),
}

/// Mock fetcher for testing.
///
/// Serves configured bodies, fails configured locators with a status, and
/// answers 404 for anything else. Every request (except empty locators,
/// which never reach the "network") is recorded.
///
/// Each request yields to the scheduler `yields` times before answering, so
/// concurrent requesters interleave the way real network requests do.
/// [`MockFetcher::with_delay`] overrides the count for a single locator.
///
/// # Example
///
/// ```ignore
/// use zmd_fetch::{Fetcher, MockFetcher};
///
/// let fetcher = MockFetcher::new()
///     .with_response("doc.md", "# Hi")
///     .with_status("broken.css", 500);
///
/// assert_eq!(fetcher.fetch("doc.md").await?, "# Hi");
/// assert_eq!(fetcher.request_count("doc.md"), 1);
/// ```
#[derive(Debug)]
pub struct MockFetcher {
    responses: Mutex<HashMap<String, MockResponse>>,
    requests: Mutex<Vec<String>>,
    yields: usize,
    delays: HashMap<String, usize>,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            yields: 1,
            delays: HashMap::new(),
        }
    }
}

impl MockFetcher {
    /// Create a new mock fetcher with no responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_response(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(url.into(), MockResponse::Body(body.into()));
        self
    }

    /// Fail `url` with the given HTTP status.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_status(self, url: impl Into<String>, status: u16) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(url.into(), MockResponse::Status(status));
        self
    }

    /// Set how many times each request yields before answering.
    #[must_use]
    pub fn with_yields(mut self, yields: usize) -> Self {
        self.yields = yields;
        self
    }

    /// Make requests for `url` yield `yields` times, so it answers later
    /// (or sooner) than other locators.
    #[must_use]
    pub fn with_delay(mut self, url: impl Into<String>, yields: usize) -> Self {
        self.delays.insert(url.into(), yields);
        self
    }

    /// All requested locators, in request order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests made for `url`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn request_count(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|requested| *requested == url)
            .count()
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if url.is_empty() {
            return Err(FetchError::MissingUrl);
        }
        self.requests.lock().unwrap().push(url.to_owned());

        let yields = self.delays.get(url).copied().unwrap_or(self.yields);
        for _ in 0..yields {
            tokio::task::yield_now().await;
        }

        let response = self.responses.lock().unwrap().get(url).cloned();
        match response {
            Some(MockResponse::Body(body)) => Ok(body),
            Some(MockResponse::Status(status)) => Err(FetchError::Status {
                url: url.to_owned(),
                status,
            }),
            None => Err(FetchError::Status {
                url: url.to_owned(),
                status: 404,
            }),
        }
    }
}
