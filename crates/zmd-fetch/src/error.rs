//! Fetch error type.

/// Failure to acquire a resource's text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// No locator was given; no request was attempted.
    #[error("no URL given")]
    MissingUrl,

    /// The server answered outside the success range.
    #[error("GET {url} failed with status {status}")]
    Status {
        /// Requested locator.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The request never produced a response (DNS, TLS, timeout, body read).
    #[error("GET {url} failed: {message}")]
    Network {
        /// Requested locator.
        url: String,
        /// Transport error description.
        message: String,
    },

    /// A local file could not be read.
    #[error("reading {url} failed: {message}")]
    Io {
        /// Requested locator.
        url: String,
        /// I/O error description.
        message: String,
    },

    /// Another requester started this load and gave up on it.
    #[error("load of {url} was abandoned")]
    Abandoned {
        /// Requested locator.
        url: String,
    },
}

impl FetchError {
    /// Locator of the failed request, if there was one.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::MissingUrl => None,
            Self::Status { url, .. }
            | Self::Network { url, .. }
            | Self::Io { url, .. }
            | Self::Abandoned { url } => Some(url),
        }
    }
}
