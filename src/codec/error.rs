//! Error types for share token handling.

use std::path::PathBuf;
use thiserror::Error;

/// Expected, user-facing failures of the share token codec.
///
/// None of these indicate a bug: they describe input the user handed us
/// (a broken link, a file outside every shared folder, a folder that has not
/// synced yet) and are reported as a warning for the single argument that
/// caused them.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The token could not be decoded into a namespace and relative path.
    #[error("malformed share link: {reason}")]
    MalformedToken { reason: String },

    /// No mounted shared folder carries the token's namespace.
    #[error("could not locate shared folder for namespace {namespace}")]
    UnknownNamespace { namespace: String },

    /// The shared folder is mounted but the file is not there (yet).
    #[error("could not locate shared file: {}", .path.display())]
    PathNotFound { path: PathBuf },

    /// The path is not inside any mounted shared folder.
    #[error("you can only link to items in shared folders: {}", .path.display())]
    NotInSharedFolder { path: PathBuf },

    /// The path cannot be carried in a token (non UTF-8, or contains `|`).
    #[error("cannot create a share link for {}", .path.display())]
    UnencodablePath { path: PathBuf },
}

impl CodecError {
    /// Create a malformed token error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedToken {
            reason: reason.into(),
        }
    }

    /// Create an unknown namespace error.
    pub fn unknown_namespace(namespace: impl Into<String>) -> Self {
        Self::UnknownNamespace {
            namespace: namespace.into(),
        }
    }

    /// Create a path not found error.
    pub fn path_not_found(path: impl Into<PathBuf>) -> Self {
        Self::PathNotFound { path: path.into() }
    }

    /// Create a not-in-shared-folder error.
    pub fn not_in_shared_folder(path: impl Into<PathBuf>) -> Self {
        Self::NotInSharedFolder { path: path.into() }
    }

    /// Create an unencodable path error.
    pub fn unencodable_path(path: impl Into<PathBuf>) -> Self {
        Self::UnencodablePath { path: path.into() }
    }
}

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;
