//! Per-instance attribute surface.
//!
//! A widget's configuration lives in string attributes, read into an
//! [`InstanceConfig`] snapshot at the start of every render cycle.

use std::collections::BTreeMap;

use crate::ConfigError;

/// Where to fetch markdown source when no embedded override exists.
pub const SRC: &str = "src";
/// Presence suppresses the automatic render on attach.
pub const MANUAL_RENDER: &str = "manual-render";
/// Presence selects flat insertion instead of an encapsulated root.
pub const NO_SHADOW: &str = "no-shadow";
/// Script location of the markdown engine.
pub const RENDERER_URL: &str = "renderer-url";
/// Script location of the syntax highlighter.
pub const HIGHLIGHTER_URL: &str = "highlighter-url";
/// JSON array of stylesheet URLs.
pub const CSS_URLS: &str = "css-urls";

/// Default markdown engine script.
pub const DEFAULT_RENDERER_URL: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/marked/0.3.17/marked.min.js";
/// Default highlighter script.
pub const DEFAULT_HIGHLIGHTER_URL: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/prism/1.11.0/prism.min.js";
/// Default stylesheets: markdown body styles, then highlighter theme.
pub const DEFAULT_CSS_URLS: [&str; 2] = [
    "https://cdnjs.cloudflare.com/ajax/libs/github-markdown-css/2.10.0/github-markdown.min.css",
    "https://cdnjs.cloudflare.com/ajax/libs/prism/1.11.0/themes/prism.min.css",
];

/// String attributes of one widget instance.
///
/// Boolean attributes are true when present, whatever their value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attributes {
    values: BTreeMap<String, String>,
}

impl Attributes {
    /// Create an empty attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Set an attribute, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Remove an attribute. Returns the previous value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.values.remove(name)
    }

    /// Attribute value, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Whether the attribute is present.
    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Iterate over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Non-empty attribute value.
    fn non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|value| !value.is_empty())
    }
}

/// Read-only configuration snapshot for one render cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstanceConfig {
    /// Markdown source locator.
    pub source: Option<String>,
    /// Suppress the automatic render on attach.
    pub manual_render: bool,
    /// Insert output into the light tree instead of an encapsulated root.
    pub no_shadow: bool,
    /// Markdown engine script location.
    pub renderer_url: String,
    /// Highlighter script location.
    pub highlighter_url: String,
    /// Stylesheet URLs, in output order.
    pub stylesheet_urls: Vec<String>,
}

impl InstanceConfig {
    /// Read a snapshot from `attributes`, applying defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Stylesheets`] if `css-urls` is not a JSON array
    /// of strings.
    pub fn from_attributes(attributes: &Attributes) -> Result<Self, ConfigError> {
        let stylesheet_urls = match attributes.non_empty(CSS_URLS) {
            Some(raw) => serde_json::from_str(raw)?,
            None => DEFAULT_CSS_URLS.iter().map(|&url| url.to_owned()).collect(),
        };

        Ok(Self {
            source: attributes.get(SRC).map(str::to_owned),
            manual_render: attributes.has(MANUAL_RENDER),
            no_shadow: attributes.has(NO_SHADOW),
            renderer_url: attributes
                .non_empty(RENDERER_URL)
                .unwrap_or(DEFAULT_RENDERER_URL)
                .to_owned(),
            highlighter_url: attributes
                .non_empty(HIGHLIGHTER_URL)
                .unwrap_or(DEFAULT_HIGHLIGHTER_URL)
                .to_owned(),
            stylesheet_urls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = InstanceConfig::from_attributes(&Attributes::new()).unwrap();

        assert_eq!(config.source, None);
        assert!(!config.manual_render);
        assert!(!config.no_shadow);
        assert_eq!(config.renderer_url, DEFAULT_RENDERER_URL);
        assert_eq!(config.highlighter_url, DEFAULT_HIGHLIGHTER_URL);
        assert_eq!(config.stylesheet_urls, DEFAULT_CSS_URLS.to_vec());
    }

    #[test]
    fn test_boolean_attributes_by_presence() {
        let attributes = Attributes::new()
            .with(MANUAL_RENDER, "")
            .with(NO_SHADOW, "false");
        let config = InstanceConfig::from_attributes(&attributes).unwrap();

        assert!(config.manual_render);
        // Presence wins, even with a "false" value
        assert!(config.no_shadow);
    }

    #[test]
    fn test_css_urls_parsed_in_order() {
        let attributes = Attributes::new().with(CSS_URLS, r#"["b.css", "a.css"]"#);
        let config = InstanceConfig::from_attributes(&attributes).unwrap();

        assert_eq!(config.stylesheet_urls, vec!["b.css", "a.css"]);
    }

    #[test]
    fn test_css_urls_empty_list() {
        let attributes = Attributes::new().with(CSS_URLS, "[]");
        let config = InstanceConfig::from_attributes(&attributes).unwrap();

        assert!(config.stylesheet_urls.is_empty());
    }

    #[test]
    fn test_empty_css_urls_attribute_uses_defaults() {
        let attributes = Attributes::new().with(CSS_URLS, "");
        let config = InstanceConfig::from_attributes(&attributes).unwrap();

        assert_eq!(config.stylesheet_urls.len(), 2);
    }

    #[test]
    fn test_malformed_css_urls() {
        let attributes = Attributes::new().with(CSS_URLS, "['single-quoted.css']");
        let err = InstanceConfig::from_attributes(&attributes).unwrap_err();

        assert!(
            matches!(err, ConfigError::Stylesheets(_)),
            "Expected ConfigError::Stylesheets, got {err:?}"
        );
    }

    #[test]
    fn test_empty_urls_fall_back_to_defaults() {
        let attributes = Attributes::new()
            .with(SRC, "doc.md")
            .with(RENDERER_URL, "")
            .with(HIGHLIGHTER_URL, "hl.js");
        let config = InstanceConfig::from_attributes(&attributes).unwrap();

        assert_eq!(config.source.as_deref(), Some("doc.md"));
        assert_eq!(config.renderer_url, DEFAULT_RENDERER_URL);
        assert_eq!(config.highlighter_url, "hl.js");
    }

    #[test]
    fn test_attribute_set_and_remove() {
        let mut attributes = Attributes::new();
        attributes.set(SRC, "a.md");
        attributes.set(SRC, "b.md");
        assert_eq!(attributes.get(SRC), Some("b.md"));

        assert_eq!(attributes.remove(SRC), Some("b.md".to_owned()));
        assert!(!attributes.has(SRC));
    }
}
