//! Mount-table reader for the Dropbox desktop client.
//!
//! The client keeps two SQLite files in its data directory:
//! `config.db` (a `config(key, value)` table holding the root namespace and
//! the local Dropbox path) and `filecache.db` (a `mount_table` mapping each
//! shared namespace to a server path like `12345:/Team Folder`). Both are
//! opened read-only; this module never writes to the client's state.

use std::path::{Path, PathBuf};

use rusqlite::types::Value;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::debug;

use super::{FolderError, FolderResult, SharedFolder, SharedFolderSource};
use crate::paths::{normalize_path, relative_components};

const CONFIG_DB: &str = "config.db";
const FILECACHE_DB: &str = "filecache.db";

/// Handle on a Dropbox client data directory.
#[derive(Debug, Clone)]
pub struct DropboxDatabase {
    dir: PathBuf,
}

impl DropboxDatabase {
    /// Use the client databases found in `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Open one of the client databases read-only.
    fn open(&self, filename: &str) -> FolderResult<Connection> {
        let path = normalize_path(&self.dir.join(filename));
        if !path.exists() {
            return Err(FolderError::DatabaseNotFound(path));
        }
        debug!("Opening {:?}", path);
        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(conn)
    }

    /// Read a value from the client's `config` table.
    pub fn config_value(&self, key: &str) -> FolderResult<String> {
        let conn = self.open(CONFIG_DB)?;
        let value: Option<Value> = conn
            .query_row(
                "SELECT value FROM config WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        value
            .and_then(value_to_string)
            .ok_or_else(|| FolderError::MissingConfigKey(key.to_string()))
    }

    /// The namespace of the user's own Dropbox root.
    pub fn root_namespace(&self) -> FolderResult<String> {
        self.config_value("root_ns")
    }

    /// Where the Dropbox folder lives on this machine.
    pub fn dropbox_path(&self) -> FolderResult<PathBuf> {
        Ok(normalize_path(Path::new(&self.config_value("dropbox_path")?)))
    }
}

impl SharedFolderSource for DropboxDatabase {
    fn name(&self) -> &'static str {
        "dropbox"
    }

    fn list_shared_folders(&self) -> FolderResult<Vec<SharedFolder>> {
        let root_ns = self.root_namespace()?;
        let dropbox_path = self.dropbox_path()?;

        let conn = self.open(FILECACHE_DB)?;
        let mut stmt = conn.prepare("SELECT target_ns, server_path FROM mount_table")?;
        let mut rows = stmt.query([])?;

        let mut folders = Vec::new();
        while let Some(row) = rows.next()? {
            let target_ns: Value = row.get(0)?;
            let server_path: String = row.get(1)?;

            let Some(namespace) = value_to_string(target_ns) else {
                debug!("Skipping mount with unreadable namespace: {}", server_path);
                continue;
            };

            let local_path = mount_path(&server_path, &root_ns, &dropbox_path);
            debug!("Shared folder {} -> {:?}", namespace, local_path);
            folders.push(SharedFolder::new(namespace, local_path));
        }

        Ok(folders)
    }
}

/// Map a mount-table server path onto the local Dropbox folder.
///
/// Server paths rooted in the user's own namespace (`<root_ns>:/Team`) are
/// re-rooted under `dropbox_path`; anything else is taken as-is.
fn mount_path(server_path: &str, root_ns: &str, dropbox_path: &Path) -> PathBuf {
    let root_prefix = format!("{}:", root_ns);
    match server_path.strip_prefix(&root_prefix) {
        Some(rest) => {
            let mut path = dropbox_path.to_path_buf();
            path.extend(relative_components(rest));
            normalize_path(&path)
        }
        None => normalize_path(Path::new(server_path)),
    }
}

/// The client stores ids as either integers or text depending on version.
fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::Integer(i) => Some(i.to_string()),
        Value::Text(s) => Some(s),
        _ => None,
    }
}
