//! Syntax highlighting.

use std::collections::HashMap;

use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::util::escape_html;

/// A named ruleset used to tokenize and colorize one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    name: String,
    definition: String,
}

impl Grammar {
    /// Create a grammar named `name`, backed by the engine-specific `definition`.
    #[must_use]
    pub fn new(name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            definition: definition.into(),
        }
    }

    /// Registry name (e.g., `"javascript"`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Engine-specific definition identifier.
    pub fn definition(&self) -> &str {
        &self.definition
    }
}

/// Syntax highlighter contract.
pub trait Highlighter {
    /// Look up a grammar by exact registry name.
    fn grammar(&self, name: &str) -> Option<&Grammar>;

    /// The default markup grammar.
    fn markup(&self) -> &Grammar;

    /// Highlight `code` with `grammar`, returning escaped HTML.
    fn highlight(&self, code: &str, grammar: &Grammar) -> String;
}

/// Registry names and the syntect syntax each one maps to.
const REGISTRY: &[(&str, &str)] = &[
    ("markup", "HTML"),
    ("html", "HTML"),
    ("xml", "XML"),
    ("svg", "XML"),
    ("mathml", "XML"),
    ("css", "CSS"),
    ("clike", "C"),
    ("javascript", "JavaScript"),
    ("js", "JavaScript"),
];

/// `syntect` based [`Highlighter`].
///
/// Exposes a deliberately small registry (markup, css, clike, javascript and
/// their aliases), the same core set browser highlighters ship by default.
/// Output uses CSS classes rather than inline colors so the page stylesheet
/// decides the theme.
pub struct SyntectHighlighter {
    syntax_set: SyntaxSet,
    grammars: HashMap<&'static str, Grammar>,
    markup: Grammar,
}

impl SyntectHighlighter {
    /// Create a highlighter with syntect's bundled syntaxes.
    #[must_use]
    pub fn new() -> Self {
        let syntax_set = SyntaxSet::load_defaults_newlines();
        let grammars = REGISTRY
            .iter()
            .filter(|(_, definition)| syntax_set.find_syntax_by_name(definition).is_some())
            .map(|&(name, definition)| (name, Grammar::new(name, definition)))
            .collect();
        Self {
            syntax_set,
            grammars,
            markup: Grammar::new("markup", "HTML"),
        }
    }

    fn syntax_for(&self, grammar: &Grammar) -> &SyntaxReference {
        self.syntax_set
            .find_syntax_by_name(grammar.definition())
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text())
    }
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter for SyntectHighlighter {
    fn grammar(&self, name: &str) -> Option<&Grammar> {
        self.grammars.get(name)
    }

    fn markup(&self) -> &Grammar {
        &self.markup
    }

    fn highlight(&self, code: &str, grammar: &Grammar) -> String {
        let syntax = self.syntax_for(grammar);
        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntax_set, ClassStyle::Spaced);
        for line in LinesWithEndings::from(code) {
            if generator
                .parse_html_for_line_which_includes_newline(line)
                .is_err()
            {
                return escape_html(code);
            }
        }
        generator.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_names() {
        let highlighter = SyntectHighlighter::new();

        assert_eq!(highlighter.grammar("javascript").unwrap().name(), "javascript");
        assert_eq!(highlighter.grammar("clike").unwrap().definition(), "C");
        assert!(highlighter.grammar("python").is_none());
        assert!(highlighter.grammar("c").is_none());
        assert_eq!(highlighter.markup().name(), "markup");
    }

    #[test]
    fn test_highlight_escapes_markup() {
        let highlighter = SyntectHighlighter::new();
        let html = highlighter.highlight("<div>a & b</div>\n", highlighter.markup());

        assert!(html.contains("<span"));
        assert!(!html.contains("<div>"));
        assert!(html.contains("&amp;"));
    }

    #[test]
    fn test_unknown_definition_falls_back_to_plain_text() {
        let highlighter = SyntectHighlighter::new();
        let html = highlighter.highlight("x < y\n", &Grammar::new("brainfuck", "Nope"));

        assert!(html.contains("x &lt; y"));
    }
}
