//! CLI error types.

use std::path::PathBuf;

use zmd_config::ConfigError;
use zmd_widget::RenderError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Render(#[from] RenderError),

    #[error("{first} and {second} would both be written to {}", .path.display())]
    DuplicateOutput {
        path: PathBuf,
        first: String,
        second: String,
    },

    #[error("{failed} of {total} sources failed to render")]
    Failed { failed: usize, total: usize },
}
