//! Progress reporting for render runs.
//!
//! Everything goes to stderr; stdout is reserved for rendered HTML.

use std::fmt::Display;
use std::path::Path;

use console::{Style, Term};

/// Render run reporter.
pub(crate) struct Output {
    term: Term,
    done: Style,
    failure: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            done: Style::new().green(),
            failure: Style::new().red().bold(),
        }
    }

    /// Print a plain status note.
    pub(crate) fn note(&self, msg: &str) {
        self.line(None, msg);
    }

    /// Report a source written to `path`.
    pub(crate) fn rendered(&self, source: &str, path: &Path) {
        self.line(Some(&self.done), &rendered_line(source, path));
    }

    /// Report a source whose render cycle failed.
    pub(crate) fn failed(&self, source: &str, err: &dyn Display) {
        self.line(Some(&self.failure), &failed_line(source, err));
    }

    /// Report an error that aborts the run.
    pub(crate) fn fatal(&self, err: &dyn Display) {
        self.line(Some(&self.failure), &format!("Error: {err}"));
    }

    fn line(&self, style: Option<&Style>, msg: &str) {
        let styled = style.map_or_else(|| msg.to_owned(), |s| s.apply_to(msg).to_string());
        // Reporting is best effort; a closed stderr must not fail the run
        let _ = self.term.write_line(&styled);
    }
}

fn rendered_line(source: &str, path: &Path) -> String {
    format!("Rendered {source} -> {}", path.display())
}

fn failed_line(source: &str, err: &dyn Display) -> String {
    format!("Failed {source}: {err}")
}
