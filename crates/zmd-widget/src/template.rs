//! Embedded template fragment.
//!
//! A widget may carry a `<template>` with at most one raw-text region
//! (`<xmp>`, the markdown override) and one `<style>` region (the CSS
//! override). Either override bypasses the network for its half of the
//! render.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// Matches the raw-text markdown region.
static XMP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<xmp(?:\s[^>]*)?>(.*?)</xmp\s*>").unwrap());

/// Matches the style region.
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style(?:\s[^>]*)?>(.*?)</style\s*>").unwrap());

/// Local overrides read from a widget's template.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Template {
    markdown: Option<String>,
    style: Option<String>,
}

impl Template {
    /// Create an empty template.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read overrides from a template fragment. Only the first region of each
    /// kind is used.
    ///
    /// The `<xmp>` region is raw text, so a `<style>` tag inside it is part
    /// of the markdown and never a style override.
    pub fn parse(html: &str) -> Self {
        let xmp = XMP_RE.captures(html);
        let markdown = xmp
            .as_ref()
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_owned());

        let outside_xmp = match xmp.and_then(|caps| caps.get(0)) {
            Some(region) => Cow::Owned(format!(
                "{}{}",
                &html[..region.start()],
                &html[region.end()..]
            )),
            None => Cow::Borrowed(html),
        };
        let style = STYLE_RE
            .captures(&outside_xmp)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_owned());

        Self { markdown, style }
    }

    /// Set the markdown override.
    #[must_use]
    pub fn with_markdown(mut self, markdown: impl Into<String>) -> Self {
        self.markdown = Some(markdown.into());
        self
    }

    /// Set the style override.
    #[must_use]
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    /// Markdown override, used verbatim instead of fetching the source.
    pub fn markdown(&self) -> Option<&str> {
        self.markdown.as_deref()
    }

    /// CSS override, used instead of fetching stylesheets.
    pub fn style(&self) -> Option<&str> {
        self.style.as_deref()
    }

    /// Serialize back to a `<template>` element.
    pub fn to_html(&self) -> String {
        let mut html = String::from("<template>");
        if let Some(markdown) = &self.markdown {
            html.push_str("<xmp>");
            html.push_str(markdown);
            html.push_str("</xmp>");
        }
        if let Some(style) = &self.style {
            html.push_str("<style>");
            html.push_str(style);
            html.push_str("</style>");
        }
        html.push_str("</template>");
        html
    }
}
