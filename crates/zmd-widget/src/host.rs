//! Virtual host tree and output stamping.
//!
//! A [`Host`] stands in for the widget's element: light-tree children plus an
//! optional encapsulated root. An adapter serializes it with
//! [`Host::to_html`], using declarative shadow DOM for the encapsulated root.

use std::sync::LazyLock;

use regex::Regex;
use zmd_config::Attributes;
use zmd_markdown::escape_html;

/// Matches markup whose first element carries a `markdown*` class.
static STAMPED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*<[A-Za-z][^\s/>]*(?:\s[^>]*?)?\sclass\s*=\s*["']?markdown"#).unwrap()
});

/// One light-tree child, held as serialized markup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    html: String,
}

impl Node {
    /// Wrap serialized markup.
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    /// Serialized markup.
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Whether this node is rendered output from an earlier cycle.
    pub fn is_stamped(&self) -> bool {
        STAMPED_RE.is_match(&self.html)
    }
}

/// Encapsulated root: content hidden from the surrounding document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShadowRoot {
    content: String,
}

impl ShadowRoot {
    /// Serialized content.
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// A widget's element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Host {
    children: Vec<Node>,
    shadow: Option<ShadowRoot>,
}

impl Host {
    /// Create a host with no children and no encapsulated root.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a light-tree child.
    pub fn append(&mut self, node: Node) {
        self.children.push(node);
    }

    /// Light-tree children in document order.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// The encapsulated root, once one has been created.
    pub fn shadow_root(&self) -> Option<&ShadowRoot> {
        self.shadow.as_ref()
    }

    /// Replace previously rendered output with `html`.
    ///
    /// Stamped light children are removed and the encapsulated root is
    /// cleared before insertion. In `flat` mode `html` becomes the first
    /// light child; otherwise it becomes the encapsulated root's content,
    /// creating the root on first use.
    pub fn stamp(&mut self, html: &str, flat: bool) {
        self.children.retain(|node| !node.is_stamped());
        if let Some(shadow) = &mut self.shadow {
            shadow.content.clear();
        }

        if flat {
            self.children.insert(0, Node::new(html));
        } else {
            self.shadow.get_or_insert_with(ShadowRoot::default).content = html.to_owned();
        }
    }

    /// Serialize the host's contents.
    pub fn inner_html(&self) -> String {
        let mut html = String::new();
        if let Some(shadow) = &self.shadow {
            html.push_str(r#"<template shadowrootmode="open">"#);
            html.push_str(&shadow.content);
            html.push_str("</template>");
        }
        for node in &self.children {
            html.push_str(&node.html);
        }
        html
    }

    /// Serialize the host as a `tag` element carrying `attributes`.
    pub fn to_html(&self, tag: &str, attributes: &Attributes) -> String {
        let mut html = format!("<{tag}");
        for (name, value) in attributes.iter() {
            if value.is_empty() {
                html.push_str(&format!(" {name}"));
            } else {
                html.push_str(&format!(" {name}=\"{}\"", escape_html(value)));
            }
        }
        html.push('>');
        html.push_str(&self.inner_html());
        html.push_str(&format!("</{tag}>"));
        html
    }
}
