//! Shared services for widget instances.

use std::sync::Arc;

use zmd_cache::{ResourceCache, SignalBus};
use zmd_fetch::Fetcher;
use zmd_markdown::{CmarkEngine, Highlighter, MarkdownEngine, SyntectHighlighter};

use crate::script::ScriptHost;

/// Completion probe: reports whether a capability already exists, in which
/// case its script is never loaded.
pub type Probe = Arc<dyn Fn() -> bool>;

/// Services shared by every widget on a page.
///
/// Holds the resource cache, the fetcher and script host, and the two engine
/// collaborators with their completion probes. Widgets keep an `Arc` to it;
/// nothing reaches for ambient global state.
pub struct Environment<F, S> {
    cache: Arc<ResourceCache>,
    fetcher: F,
    scripts: S,
    renderer: Arc<dyn MarkdownEngine>,
    renderer_probe: Probe,
    highlighter: Arc<dyn Highlighter>,
    highlighter_probe: Probe,
}

impl<F: Fetcher, S: ScriptHost> Environment<F, S> {
    /// Create an environment on the process-wide cache with the built-in
    /// engines.
    ///
    /// Built-in engines are compiled in, so both probes report them present
    /// and their scripts are never loaded. Replace the probes to force
    /// loading through the script host.
    #[must_use]
    pub fn new(fetcher: F, scripts: S) -> Self {
        Self {
            cache: ResourceCache::shared(),
            fetcher,
            scripts,
            renderer: Arc::new(CmarkEngine::new()),
            renderer_probe: Arc::new(|| true),
            highlighter: Arc::new(SyntectHighlighter::new()),
            highlighter_probe: Arc::new(|| true),
        }
    }

    /// Use `cache` instead of the process-wide one.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<ResourceCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Replace the markdown engine.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn MarkdownEngine>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Replace the syntax highlighter.
    #[must_use]
    pub fn with_highlighter(mut self, highlighter: Arc<dyn Highlighter>) -> Self {
        self.highlighter = highlighter;
        self
    }

    /// Replace the probe checked before loading the renderer script.
    #[must_use]
    pub fn with_renderer_probe(mut self, probe: Probe) -> Self {
        self.renderer_probe = probe;
        self
    }

    /// Replace the probe checked before loading the highlighter script.
    #[must_use]
    pub fn with_highlighter_probe(mut self, probe: Probe) -> Self {
        self.highlighter_probe = probe;
        self
    }
}

impl<F, S> Environment<F, S> {
    /// Resource cache shared by all widgets in this environment.
    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    /// Signal namespace for resource completions and lifecycle signals.
    pub fn signals(&self) -> &SignalBus {
        self.cache.signals()
    }

    pub(crate) fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub(crate) fn scripts(&self) -> &S {
        &self.scripts
    }

    pub(crate) fn renderer(&self) -> &dyn MarkdownEngine {
        &*self.renderer
    }

    pub(crate) fn renderer_probe(&self) -> &dyn Fn() -> bool {
        &*self.renderer_probe
    }

    pub(crate) fn highlighter(&self) -> &dyn Highlighter {
        &*self.highlighter
    }

    pub(crate) fn highlighter_probe(&self) -> &dyn Fn() -> bool {
        &*self.highlighter_probe
    }
}
