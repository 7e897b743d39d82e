//! Shared-folder share tokens.
//!
//! A token names a file by the namespace of the shared folder it lives in
//! plus its path relative to that folder, so the same token finds the file on
//! every machine that mounts the folder, wherever it is mounted. The payload
//! `namespace|relative_path` is carried as unpadded URL-safe base64, which
//! can sit in a URI path segment or an HTML attribute without escaping.
//!
//! Every function here is pure apart from the existence check in
//! [`resolve`].

mod error;
mod uri;

pub use error::{CodecError, CodecResult};
pub use uri::{UriFormat, DEFAULT_LINK_BASE_URL, DEFAULT_PROTOCOL_PREFIX};

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use serde::Serialize;
use tracing::debug;

use crate::folders::SharedFolder;
use crate::paths::{is_separator, relative_components, strip_prefix_ignore_case};

/// Separates the namespace from the relative path inside a token.
pub const DELIMITER: char = '|';

/// Pad `s` with `=` up to the next multiple of four characters.
pub fn add_padding(s: &str) -> String {
    let missing = (4 - s.len() % 4) % 4;
    let mut padded = String::with_capacity(s.len() + missing);
    padded.push_str(s);
    padded.extend(std::iter::repeat('=').take(missing));
    padded
}

/// Drop trailing `=` padding.
pub fn strip_padding(s: &str) -> &str {
    s.trim_end_matches('=')
}

/// An encoded share token.
///
/// Holding a `ShareToken` guarantees only that the text uses the URL-safe
/// base64 alphabet; whether it decodes is checked by [`decode`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShareToken(String);

impl ShareToken {
    /// Validate token text (`[A-Za-z0-9_-]+`).
    pub fn parse(text: &str) -> CodecResult<Self> {
        if text.is_empty() {
            return Err(CodecError::malformed("empty token"));
        }
        if !text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(CodecError::malformed("unexpected character in token"));
        }
        Ok(Self(text.to_string()))
    }

    /// The token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode this token.
    pub fn decode(&self) -> CodecResult<SharePath> {
        decode(self)
    }
}

impl AsRef<str> for ShareToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShareToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ShareToken {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// The decoded contents of a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharePath {
    pub namespace: String,
    pub relative_path: String,
}

impl SharePath {
    /// Create a decoded share path.
    pub fn new(namespace: impl Into<String>, relative_path: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            relative_path: relative_path.into(),
        }
    }

    /// Encode back into a token.
    pub fn encode(&self) -> ShareToken {
        encode(&self.namespace, &self.relative_path)
    }
}

/// Encode a namespace and relative path into a token.
///
/// Neither argument may contain [`DELIMITER`]; such a token would not decode.
pub fn encode(namespace: &str, relative_path: &str) -> ShareToken {
    let data = format!("{}{}{}", namespace, DELIMITER, relative_path);
    let encoded = URL_SAFE.encode(data.as_bytes());
    ShareToken(strip_padding(&encoded).to_string())
}

/// Decode a token into its namespace and relative path.
pub fn decode(token: impl AsRef<str>) -> CodecResult<SharePath> {
    let bytes = URL_SAFE
        .decode(add_padding(token.as_ref()))
        .map_err(|e| CodecError::malformed(format!("invalid base64: {}", e)))?;
    let text = String::from_utf8(bytes)
        .map_err(|_| CodecError::malformed("token payload is not valid UTF-8"))?;

    let mut fields = text.split(DELIMITER);
    let (Some(namespace), Some(relative_path), None) = (fields.next(), fields.next(), fields.next())
    else {
        return Err(CodecError::malformed(format!(
            "expected exactly one '{}' in token payload",
            DELIMITER
        )));
    };

    if namespace.is_empty() {
        return Err(CodecError::malformed("empty namespace"));
    }

    Ok(SharePath::new(namespace, relative_path))
}

/// Resolve a token to a path on this machine.
///
/// The first folder carrying the token's namespace wins, even if a later
/// duplicate would contain the file.
pub fn resolve(token: impl AsRef<str>, folders: &[SharedFolder]) -> CodecResult<PathBuf> {
    let SharePath {
        namespace,
        relative_path,
    } = decode(token)?;

    let folder = folders
        .iter()
        .find(|f| f.namespace() == namespace)
        .ok_or_else(|| CodecError::unknown_namespace(&namespace))?;

    let mut path = folder.local_path().to_path_buf();
    for component in relative_components(&relative_path) {
        if component == ".." || component == "." {
            return Err(CodecError::malformed("relative path leaves the shared folder"));
        }
        path.push(component);
    }
    if !path.starts_with(folder.local_path()) {
        return Err(CodecError::malformed("relative path leaves the shared folder"));
    }

    if !path.exists() {
        return Err(CodecError::path_not_found(path));
    }

    debug!("Resolved {}:{} to {:?}", namespace, relative_path, path);
    Ok(path)
}

/// Create a token for `path`, which must lie inside one of `folders`.
///
/// `path` should already be absolute and normalized. The folder prefix is
/// matched case-insensitively and only on a component boundary; the relative
/// part keeps the spelling of `path`.
pub fn link_from_path(path: &Path, folders: &[SharedFolder]) -> CodecResult<ShareToken> {
    let text = path
        .to_str()
        .ok_or_else(|| CodecError::unencodable_path(path))?;

    for folder in folders {
        let key = folder.comparison_key();
        let Some(relative) = strip_prefix_ignore_case(text, key) else {
            continue;
        };

        let on_boundary =
            relative.is_empty() || relative.starts_with(is_separator) || key.ends_with(is_separator);
        if !on_boundary {
            continue;
        }

        if relative.contains(DELIMITER) {
            return Err(CodecError::unencodable_path(path));
        }

        debug!("Linking {:?} via namespace {}", path, folder.namespace());
        return Ok(encode(folder.namespace(), relative));
    }

    Err(CodecError::not_in_shared_folder(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_add_padding() {
        assert_eq!(add_padding(""), "");
        assert_eq!(add_padding("abcd"), "abcd");
        assert_eq!(add_padding("abcde"), "abcde===");
        assert_eq!(add_padding("abcdef"), "abcdef==");
        assert_eq!(add_padding("abcdefg"), "abcdefg=");
    }

    #[test]
    fn test_add_padding_never_adds_four() {
        for len in 0..16 {
            let s = "x".repeat(len);
            let padded = add_padding(&s);
            assert_eq!(padded.len() % 4, 0);
            assert!(padded.len() - len <= 3);
        }
    }

    #[test]
    fn test_strip_padding() {
        assert_eq!(strip_padding("YQ=="), "YQ");
        assert_eq!(strip_padding("YWI="), "YWI");
        assert_eq!(strip_padding("YWJj"), "YWJj");
        assert_eq!(strip_padding(""), "");
    }

    #[test]
    fn test_encode_is_unpadded_and_url_safe() {
        // Standard base64 of this payload contains both '+' and '/'.
        let token = encode("ns", "/???>>>");
        assert!(!token.as_str().contains('='));
        assert!(!token.as_str().contains('+'));
        assert!(!token.as_str().contains('/'));
        assert!(ShareToken::parse(token.as_str()).is_ok());
    }

    #[test]
    fn test_encode_decode_example() {
        let token = encode("teamA", "/docs/readme.txt");
        let decoded = decode(&token).unwrap();
        assert_eq!(decoded, SharePath::new("teamA", "/docs/readme.txt"));
    }

    #[test]
    fn test_round_trip_various_lengths() {
        // Covers every padding remainder.
        for rel in ["", "/", "/a", "/ab", "/abc", "/abcd", "/ünïcødé/文件.txt"] {
            let token = encode("1234", rel);
            let decoded = decode(&token).unwrap();
            assert_eq!(decoded.namespace, "1234");
            assert_eq!(decoded.relative_path, rel);
        }
    }

    #[test]
    fn test_share_path_encode() {
        let path = SharePath::new("ns", "/x.txt");
        assert_eq!(path.encode(), encode("ns", "/x.txt"));
        assert_eq!(path.encode().decode().unwrap(), path);
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        match decode("a") {
            Err(CodecError::MalformedToken { reason }) => {
                assert!(reason.contains("base64"))
            }
            other => panic!("Expected MalformedToken, got {:?}", other),
        }
        assert!(matches!(
            decode("ab$d"),
            Err(CodecError::MalformedToken { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        let token = strip_padding(&URL_SAFE.encode([0xff, 0xfe, b'|', b'a'])).to_string();
        match decode(&token) {
            Err(CodecError::MalformedToken { reason }) => assert!(reason.contains("UTF-8")),
            other => panic!("Expected MalformedToken, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_missing_delimiter() {
        let token = strip_padding(&URL_SAFE.encode("no-delimiter")).to_string();
        assert!(matches!(
            decode(&token),
            Err(CodecError::MalformedToken { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_two_delimiters() {
        let token = strip_padding(&URL_SAFE.encode("ns|a|b")).to_string();
        assert!(matches!(
            decode(&token),
            Err(CodecError::MalformedToken { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_empty_namespace() {
        let token = encode("", "/a.txt");
        match decode(&token) {
            Err(CodecError::MalformedToken { reason }) => assert!(reason.contains("namespace")),
            other => panic!("Expected MalformedToken, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_allows_empty_relative_path() {
        let decoded = decode(encode("ns", "")).unwrap();
        assert_eq!(decoded.relative_path, "");
    }

    #[test]
    fn test_decode_empty_token() {
        assert!(matches!(decode(""), Err(CodecError::MalformedToken { .. })));
    }

    #[test]
    fn test_share_token_parse() {
        assert!(ShareToken::parse("abc-DEF_123").is_ok());
        assert!(ShareToken::parse("").is_err());
        assert!(ShareToken::parse("abc=").is_err());
        assert!(ShareToken::parse("a/b").is_err());
        assert!(ShareToken::parse("a+b").is_err());
        assert!(ShareToken::parse("ab c").is_err());
    }

    #[test]
    fn test_share_token_from_str_and_display() {
        let token: ShareToken = "dGVhbUF8L2E".parse().unwrap();
        assert_eq!(token.to_string(), "dGVhbUF8L2E");
        assert_eq!(token.as_ref(), "dGVhbUF8L2E");
    }

    #[test]
    fn test_resolve_existing_file() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("docs")).unwrap();
        std::fs::write(temp.path().join("docs/readme.txt"), "hi").unwrap();

        let folders = vec![SharedFolder::new("teamA", temp.path())];
        let token = encode("teamA", "/docs/readme.txt");

        let resolved = resolve(&token, &folders).unwrap();
        assert_eq!(resolved, temp.path().join("docs").join("readme.txt"));
    }

    #[test]
    fn test_resolve_windows_style_relative_path() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("docs")).unwrap();
        std::fs::write(temp.path().join("docs/a.txt"), "hi").unwrap();

        let folders = vec![SharedFolder::new("ns", temp.path())];
        let token = encode("ns", "\\docs\\a.txt");

        let resolved = resolve(&token, &folders).unwrap();
        assert_eq!(resolved, temp.path().join("docs").join("a.txt"));
    }

    #[test]
    fn test_resolve_empty_relative_path_is_folder() {
        let temp = TempDir::new().unwrap();
        let folders = vec![SharedFolder::new("ns", temp.path())];
        let resolved = resolve(encode("ns", ""), &folders).unwrap();
        assert_eq!(resolved, folders[0].local_path());
    }

    #[test]
    fn test_resolve_first_match_wins() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        std::fs::write(second.path().join("only-here.txt"), "x").unwrap();
        std::fs::write(first.path().join("both.txt"), "x").unwrap();
        std::fs::write(second.path().join("both.txt"), "x").unwrap();

        let folders = vec![
            SharedFolder::new("dup", first.path()),
            SharedFolder::new("dup", second.path()),
        ];

        let resolved = resolve(encode("dup", "/both.txt"), &folders).unwrap();
        assert!(resolved.starts_with(first.path()));

        // The second entry is never consulted.
        assert!(matches!(
            resolve(encode("dup", "/only-here.txt"), &folders),
            Err(CodecError::PathNotFound { .. })
        ));
    }

    #[test]
    fn test_resolve_path_not_found() {
        let folders = vec![SharedFolder::new("ns1", "/mnt/shared")];
        match resolve(encode("ns1", "/a/b.txt"), &folders) {
            Err(CodecError::PathNotFound { path }) => {
                assert_eq!(path, PathBuf::from("/mnt/shared/a/b.txt"));
            }
            other => panic!("Expected PathNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_unknown_namespace() {
        match resolve(encode("ghost", "/x"), &[]) {
            Err(CodecError::UnknownNamespace { namespace }) => assert_eq!(namespace, "ghost"),
            other => panic!("Expected UnknownNamespace, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_rejects_parent_components() {
        let temp = TempDir::new().unwrap();
        let folders = vec![SharedFolder::new("ns", temp.path().join("inner"))];
        assert!(matches!(
            resolve(encode("ns", "/../escape.txt"), &folders),
            Err(CodecError::MalformedToken { .. })
        ));
    }

    #[test]
    fn test_link_from_path_case_insensitive() {
        let folders = vec![SharedFolder::new("ns1", "/mnt/shared")];
        let upper = link_from_path(Path::new("/MNT/Shared/a.txt"), &folders).unwrap();
        let lower = link_from_path(Path::new("/mnt/shared/a.txt"), &folders).unwrap();
        assert_eq!(upper, lower);
        assert_eq!(decode(&upper).unwrap(), SharePath::new("ns1", "/a.txt"));
    }

    #[test]
    fn test_link_from_path_final_sigma_folder() {
        let folders = vec![SharedFolder::new("ns1", "/mnt/ΟΔΟΣ")];
        let token = link_from_path(Path::new("/mnt/ΟΔΟΣ/a.txt"), &folders).unwrap();
        assert_eq!(decode(&token).unwrap(), SharePath::new("ns1", "/a.txt"));
    }

    #[test]
    fn test_link_from_path_dotted_capital_i_folder() {
        let folders = vec![SharedFolder::new("ns1", "/mnt/İstanbul")];
        let token = link_from_path(Path::new("/mnt/İstanbul/Harita.pdf"), &folders).unwrap();
        assert_eq!(decode(&token).unwrap(), SharePath::new("ns1", "/Harita.pdf"));

        // The folder itself, with nothing after it.
        let token = link_from_path(Path::new("/mnt/İstanbul"), &folders).unwrap();
        assert_eq!(decode(&token).unwrap().relative_path, "");
    }

    #[test]
    fn test_link_from_path_keeps_relative_case() {
        let folders = vec![SharedFolder::new("ns1", "/Mnt/Shared")];
        let token = link_from_path(Path::new("/mnt/shared/Docs/ReadMe.TXT"), &folders).unwrap();
        assert_eq!(decode(&token).unwrap().relative_path, "/Docs/ReadMe.TXT");
    }

    #[test]
    fn test_link_from_path_not_shared() {
        let folders = vec![SharedFolder::new("ns1", "/mnt/shared")];
        match link_from_path(Path::new("/tmp/other/x.txt"), &folders) {
            Err(CodecError::NotInSharedFolder { path }) => {
                assert_eq!(path, PathBuf::from("/tmp/other/x.txt"));
            }
            other => panic!("Expected NotInSharedFolder, got {:?}", other),
        }
    }

    #[test]
    fn test_link_from_path_requires_component_boundary() {
        let folders = vec![SharedFolder::new("ns1", "/mnt/shared")];
        assert!(matches!(
            link_from_path(Path::new("/mnt/shared2/x.txt"), &folders),
            Err(CodecError::NotInSharedFolder { .. })
        ));
    }

    #[test]
    fn test_link_from_path_folder_itself() {
        let folders = vec![SharedFolder::new("ns1", "/mnt/shared")];
        let token = link_from_path(Path::new("/mnt/shared"), &folders).unwrap();
        assert_eq!(decode(&token).unwrap(), SharePath::new("ns1", ""));
    }

    #[test]
    fn test_link_from_path_first_prefix_wins() {
        let folders = vec![
            SharedFolder::new("outer", "/mnt"),
            SharedFolder::new("inner", "/mnt/shared"),
        ];
        let token = link_from_path(Path::new("/mnt/shared/a.txt"), &folders).unwrap();
        assert_eq!(decode(&token).unwrap(), SharePath::new("outer", "/shared/a.txt"));
    }

    #[test]
    fn test_link_from_path_rejects_delimiter() {
        let folders = vec![SharedFolder::new("ns1", "/mnt/shared")];
        assert!(matches!(
            link_from_path(Path::new("/mnt/shared/a|b.txt"), &folders),
            Err(CodecError::UnencodablePath { .. })
        ));
    }

    #[test]
    fn test_link_then_resolve_on_other_mount() {
        let here = TempDir::new().unwrap();
        let there = TempDir::new().unwrap();
        std::fs::create_dir_all(there.path().join("plans")).unwrap();
        std::fs::write(there.path().join("plans/q3.txt"), "x").unwrap();

        let local = vec![SharedFolder::new("team", here.path())];
        let remote = vec![SharedFolder::new("team", there.path())];

        let token = link_from_path(&here.path().join("plans").join("q3.txt"), &local).unwrap();
        let resolved = resolve(&token, &remote).unwrap();
        assert_eq!(resolved, there.path().join("plans").join("q3.txt"));
    }
}
