//! Resource fetching for zmd widgets.
//!
//! This crate provides a [`Fetcher`] trait with a single operation: GET a
//! locator and return its body as text. Implementations:
//!
//! - [`DefaultFetcher`]: `http(s)://` via a pooled `ureq` agent, anything
//!   else read from disk relative to a base directory
//! - [`MockFetcher`]: In-memory responses for tests (behind `mock` feature)
//!
//! # Example
//!
//! ```ignore
//! use zmd_fetch::{DefaultFetcher, Fetcher};
//!
//! let fetcher = DefaultFetcher::new().base_dir("docs");
//! let markdown = fetcher.fetch("guide.md").await?;
//! ```

mod consts;
mod error;
mod http;
#[cfg(feature = "mock")]
mod mock;

use std::future::Future;
use std::sync::Arc;

pub use consts::DEFAULT_TIMEOUT;
pub use error::FetchError;
pub use http::DefaultFetcher;
#[cfg(feature = "mock")]
pub use mock::MockFetcher;

/// GET-and-return-text operation.
///
/// Implementations must fail with [`FetchError::MissingUrl`] for an empty
/// locator without attempting a request. The returned future is a
/// non-blocking suspension point; it never blocks the calling thread.
pub trait Fetcher {
    /// Fetch `url` and return the response body.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>>;
}

impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> {
        (**self).fetch(url)
    }
}

impl<F: Fetcher + ?Sized> Fetcher for &F {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> {
        (**self).fetch(url)
    }
}
