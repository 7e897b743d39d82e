//! Clipboard content for share links.
//!
//! Links are copied twice: as HTML anchors labelled with the file's path
//! inside the shared folder, and as bare URLs for targets that only accept
//! plain text.

use arboard::Clipboard;
use minijinja::{Environment, Error as JinjaError};
use serde::Serialize;

/// Anchors separated by `<br>`. Rendered with HTML auto-escaping.
const LINKS_TEMPLATE: &str = "{% for link in links %}{% if not loop.first %}<br>{% endif %}<a href='{{ link.url }}'>{{ link.label }}</a>{% endfor %}";

/// A single share link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    /// The web link carrying the token.
    pub url: String,
    /// The path relative to the shared folder, shown as anchor text.
    pub label: String,
}

impl Link {
    /// Create a link.
    pub fn new(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
        }
    }
}

/// What goes on the clipboard for a batch of links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardContent {
    pub html: String,
    pub text: String,
}

/// Renders link batches into clipboard content.
pub struct LinkRenderer {
    env: Environment<'static>,
}

impl LinkRenderer {
    /// Create a renderer with the built-in link template.
    pub fn new() -> Result<Self, JinjaError> {
        let mut env = Environment::new();
        env.add_template("links.html", LINKS_TEMPLATE)?;
        Ok(Self { env })
    }

    /// Render `links` as HTML anchors plus newline-separated URLs.
    pub fn render(&self, links: &[Link]) -> Result<ClipboardContent, JinjaError> {
        let template = self.env.get_template("links.html")?;
        let html = template.render(minijinja::context! { links => links })?;
        let text = links
            .iter()
            .map(|link| link.url.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Ok(ClipboardContent { html, text })
    }
}

/// Put HTML on the system clipboard with a plain-text alternative.
pub fn set_rich_content(html: &str, text: &str) -> Result<(), arboard::Error> {
    let mut clipboard = Clipboard::new()?;
    clipboard.set_html(html, Some(text))?;
    Ok(())
}
