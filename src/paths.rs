//! Path helpers shared by the codec and the folder sources.
//!
//! Everything here is lexical: no symlinks are followed and nothing touches
//! the file system except [`absolute`], which reads the current directory.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Returns true for either path separator.
///
/// Tokens minted on Windows carry `\`, tokens minted elsewhere carry `/`,
/// and both must be understood on every machine.
pub fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Collapse `.` and `..` components and duplicate separators.
///
/// `..` at the root of an absolute path is dropped; in a relative path it is
/// kept when there is nothing left to pop.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(".");
    }

    parts.iter().collect()
}

/// Make `path` absolute against the current directory, then normalize it.
pub fn absolute(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(normalize_path(path))
    } else {
        let cwd = std::env::current_dir()?;
        Ok(normalize_path(&cwd.join(path)))
    }
}

/// Strip `prefix` from the start of `text`, comparing case-insensitively.
///
/// Both sides are folded with `str::to_lowercase`, so context-dependent
/// mappings (final sigma) and mappings that change length (`İ`) agree. The
/// returned remainder is a slice of `text`, so the caller keeps the original
/// spelling of everything after the prefix.
pub fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let target = prefix.to_lowercase();
    if target.is_empty() {
        return Some(text);
    }

    let ends = text
        .char_indices()
        .map(|(idx, c)| idx + c.len_utf8());
    for end in ends {
        let folded = text[..end].to_lowercase();
        if folded.len() > target.len() {
            return None;
        }
        if folded == target {
            return Some(&text[end..]);
        }
    }

    None
}

/// Split a token's relative path into components.
///
/// One leading separator is dropped; empty segments (doubled separators) are
/// skipped.
pub fn relative_components(relative: &str) -> impl Iterator<Item = &str> {
    let trimmed = relative
        .strip_prefix(is_separator)
        .unwrap_or(relative);
    trimmed.split(is_separator).filter(|s| !s.is_empty())
}
