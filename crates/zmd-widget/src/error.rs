//! Error types for the render pipeline.

use zmd_fetch::FetchError;

/// External script failed to execute.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// The script host reported a failure.
    #[error("script {url} failed to load: {reason}")]
    Failed {
        /// Script location.
        url: String,
        /// Host-provided failure description.
        reason: String,
    },

    /// Another requester was loading the script and failed.
    #[error("script {url} was abandoned by a concurrent load")]
    Abandoned {
        /// Script location.
        url: String,
    },
}

/// Error returned when a content build fails.
///
/// Style failures never surface here; they degrade to the prelude.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// Markdown source could not be acquired.
    #[error("{0}")]
    Fetch(#[from] FetchError),
    /// Renderer or highlighter script could not be loaded.
    #[error("{0}")]
    Load(#[from] LoadError),
}
