//! Markdown widget render pipeline.
//!
//! A [`Widget`] turns a markdown document (fetched from its `src` attribute
//! or embedded in its [`Template`]) into styled, highlighted HTML stamped
//! into its [`Host`]. Every cycle runs two halves concurrently:
//!
//! - [`StyleAssembler`]: the `<style>` block, from a template override or
//!   fetched stylesheets; never fails, degrades to a fixed prelude
//! - [`ContentBuilder`]: the content block; fetches the source while
//!   [`ScriptLoader`] makes sure the renderer and highlighter are loaded
//!
//! Widgets on a page share one [`Environment`], whose
//! [`ResourceCache`](zmd_cache::ResourceCache) deduplicates stylesheet
//! fetches and script loads across all of them.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use zmd_config::Attributes;
//! use zmd_fetch::DefaultFetcher;
//! use zmd_widget::{Environment, FetchingScriptHost, Widget};
//!
//! let fetcher = DefaultFetcher::new();
//! let env = Arc::new(Environment::new(fetcher.clone(), FetchingScriptHost::new(fetcher)));
//! let widget = Widget::new("intro", env)
//!     .with_attributes(Attributes::new().with("src", "intro.md"));
//!
//! if let Some(cycle) = widget.on_attach()? {
//!     cycle.await?;
//! }
//! println!("{}", widget.to_html());
//! ```

mod content;
mod environment;
mod error;
mod host;
mod script;
mod style;
mod template;
#[cfg(test)]
mod testing;
mod widget;

pub use content::{
    CONTENT_CLOSE, CONTENT_OPEN, ContentBuilder, GrammarSelection, highlight_code, select_grammar,
};
pub use environment::{Environment, Probe};
pub use error::{LoadError, RenderError};
pub use host::{Host, Node, ShadowRoot};
pub use script::{
    FetchingScriptHost, HIGHLIGHTER_ATTRIBUTES, HIGHLIGHTER_SIGNAL, RENDERER_ATTRIBUTES,
    RENDERER_SIGNAL, ScriptHost, ScriptLoader,
};
pub use style::{STYLE_CLOSE, STYLE_PRELUDE, StyleAssembler};
pub use template::Template;
pub use widget::{READY_SIGNAL, RENDERED_SIGNAL, RenderState, TAG, Widget};
