//! Content block assembly: source acquisition, engine loading, rendering.

use zmd_config::InstanceConfig;
use zmd_fetch::{FetchError, Fetcher};
use zmd_markdown::Highlighter;

use crate::environment::Environment;
use crate::error::RenderError;
use crate::script::{
    HIGHLIGHTER_ATTRIBUTES, HIGHLIGHTER_SIGNAL, RENDERER_ATTRIBUTES, RENDERER_SIGNAL, ScriptHost,
    ScriptLoader,
};
use crate::template::Template;

/// Opening of the content container. The `markdown` class prefix marks
/// stamped output.
pub const CONTENT_OPEN: &str = r#"<div class="markdown-body">"#;
/// Closing of the content container.
pub const CONTENT_CLOSE: &str = "</div>";

/// Registry name of the general-purpose scripting grammar.
const SCRIPTING_GRAMMAR: &str = "javascript";
/// Registry name of the C-like grammar.
const CLIKE_GRAMMAR: &str = "clike";

/// Grammar chosen for one code block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrammarSelection<'a> {
    /// The highlighter's default markup grammar.
    Markup,
    /// The general-purpose scripting grammar.
    Scripting,
    /// The C-like grammar.
    CLike,
    /// A grammar the highlighter knows by this exact name.
    Named(&'a str),
}

/// Choose a grammar for `code` with an optional language `hint`.
///
/// First match wins:
///
/// 1. no hint, code starts with `<` after whitespace: markup
/// 2. no hint: scripting
/// 3. hint is a known grammar name: that grammar
/// 4. hint starts with `es` (`es6`, `esnext`): scripting
/// 5. hint is `c`: C-like
/// 6. otherwise: markup
///
/// An empty hint counts as no hint.
pub fn select_grammar<'a>(
    code: &str,
    hint: Option<&'a str>,
    is_known: impl Fn(&str) -> bool,
) -> GrammarSelection<'a> {
    match hint.filter(|hint| !hint.is_empty()) {
        None if code.trim_start().starts_with('<') => GrammarSelection::Markup,
        None => GrammarSelection::Scripting,
        Some(hint) if is_known(hint) => GrammarSelection::Named(hint),
        Some(hint) if hint.starts_with("es") => GrammarSelection::Scripting,
        Some("c") => GrammarSelection::CLike,
        Some(_) => GrammarSelection::Markup,
    }
}

/// Highlight one code block, resolving the selection against `highlighter`.
///
/// A selection the highlighter cannot satisfy falls back to its markup
/// grammar.
pub fn highlight_code(highlighter: &dyn Highlighter, code: &str, hint: Option<&str>) -> String {
    let selection = select_grammar(code, hint, |name| highlighter.grammar(name).is_some());
    let grammar = match selection {
        GrammarSelection::Markup => None,
        GrammarSelection::Scripting => highlighter.grammar(SCRIPTING_GRAMMAR),
        GrammarSelection::CLike => highlighter.grammar(CLIKE_GRAMMAR),
        GrammarSelection::Named(name) => highlighter.grammar(name),
    }
    .unwrap_or_else(|| highlighter.markup());

    highlighter.highlight(code, grammar)
}

/// Builds a widget's rendered content block.
pub struct ContentBuilder<'a, F, S> {
    env: &'a Environment<F, S>,
}

impl<'a, F: Fetcher, S: ScriptHost> ContentBuilder<'a, F, S> {
    /// Create a builder over the shared environment.
    pub fn new(env: &'a Environment<F, S>) -> Self {
        Self { env }
    }

    /// Build the content block for one render cycle.
    ///
    /// Source acquisition and both engine loads run concurrently; none is
    /// cancelled when another fails. The renderer only runs once all three
    /// succeed.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Fetch`] if the source cannot be fetched and
    /// [`RenderError::Load`] if an engine script fails to load.
    pub async fn build(
        &self,
        config: &InstanceConfig,
        template: Option<&Template>,
    ) -> Result<String, RenderError> {
        let scripts = ScriptLoader::new(self.env.cache(), self.env.scripts());

        let (source, renderer, highlighter) = tokio::join!(
            self.source(config, template),
            scripts.ensure(
                &config.renderer_url,
                self.env.renderer_probe(),
                RENDERER_SIGNAL,
                RENDERER_ATTRIBUTES,
            ),
            scripts.ensure(
                &config.highlighter_url,
                self.env.highlighter_probe(),
                HIGHLIGHTER_SIGNAL,
                HIGHLIGHTER_ATTRIBUTES,
            ),
        );
        let source = source?;
        renderer?;
        highlighter?;

        let highlighter = self.env.highlighter();
        let html = self
            .env
            .renderer()
            .render(&source, &|code: &str, hint: Option<&str>| {
                highlight_code(highlighter, code, hint)
            });

        Ok(format!("{CONTENT_OPEN}{html}{CONTENT_CLOSE}"))
    }

    async fn source(
        &self,
        config: &InstanceConfig,
        template: Option<&Template>,
    ) -> Result<String, FetchError> {
        if let Some(markdown) = template.and_then(Template::markdown) {
            return Ok(markdown.to_owned());
        }
        let url = config.source.as_deref().unwrap_or("");
        self.env.fetcher().fetch(url).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::LoadError;
    use crate::testing::{RecordingScriptHost, environment, loading_environment};
    use pretty_assertions::assert_eq;
    use zmd_config::Attributes;
    use zmd_config::instance::{HIGHLIGHTER_URL, RENDERER_URL, SRC};
    use zmd_fetch::MockFetcher;
    use zmd_markdown::{HighlightFn, MarkdownEngine, SyntectHighlighter};

    fn known(name: &str) -> bool {
        ["markup", "css", "clike", "javascript", "js"].contains(&name)
    }

    #[test]
    fn test_select_grammar_without_hint() {
        assert_eq!(select_grammar("<div>", None, known), GrammarSelection::Markup);
        assert_eq!(
            select_grammar("  \n<p>x</p>", None, known),
            GrammarSelection::Markup
        );
        assert_eq!(
            select_grammar("let x=1", None, known),
            GrammarSelection::Scripting
        );
        assert_eq!(
            select_grammar("<div>", Some(""), known),
            GrammarSelection::Markup
        );
    }

    #[test]
    fn test_select_grammar_with_hint() {
        assert_eq!(
            select_grammar("a{}", Some("css"), known),
            GrammarSelection::Named("css")
        );
        assert_eq!(
            select_grammar("let x", Some("es6"), known),
            GrammarSelection::Scripting
        );
        assert_eq!(
            select_grammar("let x", Some("esnext"), known),
            GrammarSelection::Scripting
        );
        assert_eq!(
            select_grammar("int x;", Some("c"), known),
            GrammarSelection::CLike
        );
        assert_eq!(
            select_grammar("x = 1", Some("python"), known),
            GrammarSelection::Markup
        );
    }

    #[test]
    fn test_select_grammar_known_name_wins_over_prefix() {
        let known = |name: &str| name == "es-special";

        assert_eq!(
            select_grammar("x", Some("es-special"), known),
            GrammarSelection::Named("es-special")
        );
    }

    #[test]
    fn test_highlight_code_unknown_hint_uses_markup() {
        let highlighter = SyntectHighlighter::new();

        assert_eq!(
            highlight_code(&highlighter, "x = 1", Some("python")),
            highlighter.highlight("x = 1", highlighter.markup())
        );
    }

    #[test]
    fn test_highlight_code_resolves_clike() {
        let highlighter = SyntectHighlighter::new();
        let clike = highlighter.grammar("clike").unwrap();

        assert_eq!(
            highlight_code(&highlighter, "int x;", Some("c")),
            highlighter.highlight("int x;", clike)
        );
    }

    /// Markdown engine that counts invocations.
    #[derive(Default)]
    struct CountingEngine {
        calls: AtomicUsize,
    }

    impl MarkdownEngine for CountingEngine {
        fn render(&self, source: &str, highlight: &HighlightFn<'_>) -> String {
            self.calls.fetch_add(1, Ordering::SeqCst);
            highlight(source, None)
        }
    }

    fn config(attributes: &Attributes) -> InstanceConfig {
        InstanceConfig::from_attributes(attributes).unwrap()
    }

    #[tokio::test]
    async fn test_build_renders_fetched_source() {
        let env = environment(MockFetcher::new().with_response("doc.md", "# Hi"));

        let html = ContentBuilder::new(&env)
            .build(&config(&Attributes::new().with(SRC, "doc.md")), None)
            .await
            .unwrap();

        assert_eq!(html, "<div class=\"markdown-body\"><h1>Hi</h1>\n</div>");
    }

    #[tokio::test]
    async fn test_build_highlights_code_blocks() {
        let env = environment(MockFetcher::new());
        let template = Template::new().with_markdown("```es6\nlet x = 1;\n```\n");

        let html = ContentBuilder::new(&env)
            .build(&config(&Attributes::new()), Some(&template))
            .await
            .unwrap();

        assert!(html.contains(r#"<code class="language-es6">"#), "{html}");
        assert!(html.contains("let"), "{html}");
    }

    #[tokio::test]
    async fn test_build_prefers_template_markdown() {
        let fetcher = MockFetcher::new().with_response("doc.md", "# Remote");
        let env = environment(fetcher);
        let template = Template::new().with_markdown("# Local");

        let html = ContentBuilder::new(&env)
            .build(&config(&Attributes::new().with(SRC, "doc.md")), Some(&template))
            .await
            .unwrap();

        assert!(html.contains("<h1>Local</h1>"), "{html}");
        assert!(env.fetcher().requests().is_empty());
    }

    #[tokio::test]
    async fn test_failed_source_never_invokes_renderer() {
        let engine = Arc::new(CountingEngine::default());
        let env = environment(MockFetcher::new().with_status("doc.md", 500))
            .with_renderer(Arc::clone(&engine) as _);

        let err = ContentBuilder::new(&env)
            .build(&config(&Attributes::new().with(SRC, "doc.md")), None)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            RenderError::Fetch(FetchError::Status {
                url: "doc.md".to_owned(),
                status: 500
            })
        );
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_source_fails_without_request() {
        let env = environment(MockFetcher::new());

        let err = ContentBuilder::new(&env)
            .build(&config(&Attributes::new()), None)
            .await
            .unwrap_err();

        assert_eq!(err, RenderError::Fetch(FetchError::MissingUrl));
        assert!(env.fetcher().requests().is_empty());
    }

    #[tokio::test]
    async fn test_build_loads_missing_engines() {
        let env = loading_environment(
            MockFetcher::new().with_response("doc.md", "text"),
            RecordingScriptHost::new(),
        );
        let attributes = Attributes::new()
            .with(SRC, "doc.md")
            .with(RENDERER_URL, "md.js")
            .with(HIGHLIGHTER_URL, "hl.js");

        ContentBuilder::new(&env)
            .build(&config(&attributes), None)
            .await
            .unwrap();

        assert_eq!(env.scripts().insert_count("md.js"), 1);
        assert_eq!(env.scripts().insert_count("hl.js"), 1);
        assert!(env.cache().get(RENDERER_SIGNAL).unwrap().loaded);
        assert!(env.cache().get(HIGHLIGHTER_SIGNAL).unwrap().loaded);
    }

    #[tokio::test]
    async fn test_failed_script_is_fatal() {
        let engine = Arc::new(CountingEngine::default());
        let env = loading_environment(
            MockFetcher::new().with_response("doc.md", "text"),
            RecordingScriptHost::new().failing("hl.js"),
        )
        .with_renderer(Arc::clone(&engine) as _);
        let attributes = Attributes::new()
            .with(SRC, "doc.md")
            .with(HIGHLIGHTER_URL, "hl.js");

        let err = ContentBuilder::new(&env)
            .build(&config(&attributes), None)
            .await
            .unwrap_err();

        assert!(
            matches!(&err, RenderError::Load(LoadError::Failed { url, .. }) if url == "hl.js"),
            "Expected LoadError::Failed, got {err:?}"
        );
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
        // Source fetch and renderer load still ran to completion
        assert_eq!(env.fetcher().request_count("doc.md"), 1);
        assert!(env.cache().get(RENDERER_SIGNAL).unwrap().loaded);
    }
}
