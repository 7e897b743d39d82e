//! Shared folders and where they come from.
//!
//! A [`SharedFolder`] pairs the namespace the sync service uses to identify a
//! folder with the place that folder is mounted on this machine. The list is
//! read once per invocation through a [`SharedFolderSource`] and never
//! written back.

mod dropbox;

pub use dropbox::DropboxDatabase;

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::paths::normalize_path;

/// Errors raised while reading the shared-folder list.
#[derive(Debug, Error)]
pub enum FolderError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Could not locate Dropbox database {}", .0.display())]
    DatabaseNotFound(PathBuf),

    #[error("Missing Dropbox config key: {0}")]
    MissingConfigKey(String),

    #[error("Could not determine Dropbox data directory")]
    NoDataDir,
}

/// Result type for folder source operations
pub type FolderResult<T> = Result<T, FolderError>;

/// A shared folder mounted on this machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharedFolder {
    namespace: String,
    local_path: PathBuf,
    #[serde(skip)]
    key: String,
}

impl SharedFolder {
    /// Create a shared folder entry. The path is normalized lexically.
    pub fn new(namespace: impl Into<String>, local_path: impl AsRef<Path>) -> Self {
        let local_path = normalize_path(local_path.as_ref());
        let key = local_path.to_string_lossy().to_lowercase();
        Self {
            namespace: namespace.into(),
            local_path,
            key,
        }
    }

    /// The namespace identifying this folder across machines.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Where the folder is mounted locally, in its original case.
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Lowercase form of the local path used for prefix comparisons.
    pub fn comparison_key(&self) -> &str {
        &self.key
    }
}

/// Anything that can produce the ordered list of mounted shared folders.
pub trait SharedFolderSource {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Read the current shared folders, in mount-table order.
    fn list_shared_folders(&self) -> FolderResult<Vec<SharedFolder>>;
}

/// A fixed list of shared folders, typically from the config file.
#[derive(Debug, Clone, Default)]
pub struct StaticFolders {
    folders: Vec<SharedFolder>,
}

impl StaticFolders {
    /// Create a source over the given folders.
    pub fn new(folders: Vec<SharedFolder>) -> Self {
        Self { folders }
    }

    /// Check whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }
}

impl SharedFolderSource for StaticFolders {
    fn name(&self) -> &'static str {
        "static"
    }

    fn list_shared_folders(&self) -> FolderResult<Vec<SharedFolder>> {
        Ok(self.folders.clone())
    }
}
