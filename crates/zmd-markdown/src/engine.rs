//! Markdown to HTML engines.

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};

use crate::util::escape_html;

/// Highlight callback: `(code, language_hint) -> html`.
///
/// The returned string is inserted into the output verbatim, so the callback
/// is responsible for escaping.
pub type HighlightFn<'a> = dyn Fn(&str, Option<&str>) -> String + 'a;

/// Markdown renderer contract.
pub trait MarkdownEngine {
    /// Render `source` to HTML, passing every code block through `highlight`.
    fn render(&self, source: &str, highlight: &HighlightFn<'_>) -> String;
}

/// `pulldown-cmark` based [`MarkdownEngine`].
///
/// GFM extensions (tables, strikethrough, task lists, footnotes) are enabled
/// by default. Code blocks are emitted as
/// `<pre><code class="language-{hint}">...</code></pre>`, with the class
/// omitted when the block carries no language hint.
#[derive(Debug, Clone)]
pub struct CmarkEngine {
    options: Options,
}

impl CmarkEngine {
    /// Create an engine with GFM extensions enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_FOOTNOTES,
        }
    }

    /// Enable or disable GFM extensions.
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        if !enabled {
            self.options = Options::empty();
        }
        self
    }
}

impl Default for CmarkEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownEngine for CmarkEngine {
    fn render(&self, source: &str, highlight: &HighlightFn<'_>) -> String {
        let mut events = Vec::new();
        let mut code: Option<CodeBlock> = None;

        for event in Parser::new_ext(source, self.options) {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => code = Some(CodeBlock::new(&kind)),
                Event::End(TagEnd::CodeBlock) => {
                    if let Some(block) = code.take() {
                        events.push(Event::Html(CowStr::from(block.render(highlight))));
                    }
                }
                Event::Text(text) if code.is_some() => {
                    if let Some(block) = code.as_mut() {
                        block.content.push_str(&text);
                    }
                }
                other => events.push(other),
            }
        }

        let mut html = String::with_capacity(source.len() * 3 / 2);
        pulldown_cmark::html::push_html(&mut html, events.into_iter());
        html
    }
}

/// Code block being collected.
struct CodeBlock {
    lang: Option<String>,
    content: String,
}

impl CodeBlock {
    fn new(kind: &CodeBlockKind<'_>) -> Self {
        let lang = match kind {
            CodeBlockKind::Fenced(info) => info
                .split_whitespace()
                .next()
                .filter(|lang| !lang.is_empty())
                .map(str::to_owned),
            CodeBlockKind::Indented => None,
        };
        Self {
            lang,
            content: String::new(),
        }
    }

    fn render(&self, highlight: &HighlightFn<'_>) -> String {
        let body = highlight(&self.content, self.lang.as_deref());
        match &self.lang {
            Some(lang) => format!(
                "<pre><code class=\"language-{}\">{body}</code></pre>\n",
                escape_html(lang)
            ),
            None => format!("<pre><code>{body}</code></pre>\n"),
        }
    }
}
