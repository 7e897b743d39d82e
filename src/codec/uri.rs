//! Text forms of a share token.
//!
//! A token travels either as a protocol URI (`dropbox:<token>`), which the OS
//! hands to us through the registered URL handler, or as a web link
//! (`http://www.sharedropbox.com/<token>`) pasted into mail and chat.

use super::ShareToken;
use crate::paths::strip_prefix_ignore_case;

/// Default URI scheme prefix, also used for protocol handler registration.
pub const DEFAULT_PROTOCOL_PREFIX: &str = "dropbox:";

/// Default base for web links placed on the clipboard.
pub const DEFAULT_LINK_BASE_URL: &str = "http://www.sharedropbox.com/";

/// Recognizes and renders the URI and link forms of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriFormat {
    protocol_prefix: String,
    link_base_url: String,
}

impl Default for UriFormat {
    fn default() -> Self {
        Self::new(DEFAULT_PROTOCOL_PREFIX, DEFAULT_LINK_BASE_URL)
    }
}

impl UriFormat {
    /// Create a format with the given protocol prefix and link base URL.
    pub fn new(protocol_prefix: impl Into<String>, link_base_url: impl Into<String>) -> Self {
        Self {
            protocol_prefix: protocol_prefix.into(),
            link_base_url: link_base_url.into(),
        }
    }

    /// The protocol prefix, e.g. `dropbox:`.
    pub fn protocol_prefix(&self) -> &str {
        &self.protocol_prefix
    }

    /// The URI scheme without its trailing colon, e.g. `dropbox`.
    pub fn scheme(&self) -> &str {
        self.protocol_prefix.trim_end_matches(':')
    }

    /// The web link base, e.g. `http://www.sharedropbox.com/`.
    pub fn link_base_url(&self) -> &str {
        &self.link_base_url
    }

    /// Extract the token from a protocol URI or web link.
    ///
    /// Returns `None` when `arg` is neither form, or when the text after the
    /// prefix is not token-shaped; such arguments are treated as paths.
    pub fn parse(&self, arg: &str) -> Option<ShareToken> {
        let rest = strip_prefix_ignore_case(arg, &self.protocol_prefix)
            .or_else(|| strip_prefix_ignore_case(arg, &self.link_base_url))?;

        // Browsers and launchers sometimes add `//` or a trailing slash.
        ShareToken::parse(rest.trim_matches('/')).ok()
    }

    /// Render `token` as a protocol URI.
    pub fn uri(&self, token: &ShareToken) -> String {
        format!("{}{}", self.protocol_prefix, token)
    }

    /// Render `token` as a web link.
    pub fn link(&self, token: &ShareToken) -> String {
        format!("{}{}", self.link_base_url, token)
    }
}
