//! Markdown rendering and syntax highlighting collaborators.
//!
//! A widget depends on two external engines, both expressed as traits so an
//! embedder can swap them:
//!
//! - [`MarkdownEngine`]: `render(source, highlight) -> html`, calling back
//!   into a highlight function for every code block
//! - [`Highlighter`]: named [`Grammar`]s plus `highlight(code, grammar)`
//!
//! Built-in implementations:
//!
//! - [`CmarkEngine`]: `pulldown-cmark` with GFM extensions
//! - [`SyntectHighlighter`]: `syntect` with a small, fixed grammar registry
//!
//! # Example
//!
//! ```
//! use zmd_markdown::{CmarkEngine, MarkdownEngine, escape_html};
//!
//! let html = CmarkEngine::new().render("# Hi", &|code: &str, _: Option<&str>| escape_html(code));
//! assert_eq!(html, "<h1>Hi</h1>\n");
//! ```

mod engine;
mod highlight;
mod util;

pub use engine::{CmarkEngine, HighlightFn, MarkdownEngine};
pub use highlight::{Grammar, Highlighter, SyntectHighlighter};
pub use util::escape_html;
