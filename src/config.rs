//! Configuration management for shareuri
//!
//! Handles loading and saving configuration from ~/.config/shareuri/config.toml

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::codec::{UriFormat, DEFAULT_LINK_BASE_URL, DEFAULT_PROTOCOL_PREFIX};
use crate::folders::SharedFolder;
use crate::logging;

/// Configuration file name
const CONFIG_FILE: &str = "config.toml";

/// Application name for config directory
pub const APP_NAME: &str = "shareuri";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// A shared folder pinned in the config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FolderEntry {
    pub namespace: String,
    pub path: PathBuf,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// URI prefix recognized and registered as the protocol handler
    #[serde(default)]
    pub protocol_prefix: Option<String>,

    /// Base of the web links put on the clipboard
    #[serde(default)]
    pub link_base_url: Option<String>,

    /// Directory holding the Dropbox client's config.db and filecache.db
    #[serde(default)]
    pub dropbox_dir: Option<PathBuf>,

    /// Log file location
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Shared folders to use instead of reading the Dropbox databases
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shared_folders: Vec<FolderEntry>,
}

impl Config {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the config file path
    ///
    /// Returns ~/.config/shareuri/config.toml on Linux
    pub fn config_path() -> ConfigResult<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Get the config directory path
    pub fn config_dir() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join(APP_NAME))
    }

    /// Load configuration from `path`
    ///
    /// Returns default config if the file doesn't exist
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to `path`, creating its directory if needed
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// URI and link format, falling back to the defaults
    pub fn uri_format(&self) -> UriFormat {
        UriFormat::new(
            self.protocol_prefix
                .as_deref()
                .unwrap_or(DEFAULT_PROTOCOL_PREFIX),
            self.link_base_url
                .as_deref()
                .unwrap_or(DEFAULT_LINK_BASE_URL),
        )
    }

    /// The pinned shared folders, in file order
    pub fn shared_folders(&self) -> Vec<SharedFolder> {
        self.shared_folders
            .iter()
            .map(|entry| SharedFolder::new(&entry.namespace, &entry.path))
            .collect()
    }

    /// Pin a shared folder
    pub fn add_shared_folder(&mut self, namespace: impl Into<String>, path: impl Into<PathBuf>) {
        self.shared_folders.push(FolderEntry {
            namespace: namespace.into(),
            path: path.into(),
        });
    }

    /// Remove all pinned shared folders
    pub fn clear_shared_folders(&mut self) {
        self.shared_folders.clear();
    }

    /// Get effective log file (CLI, then config, then the default location)
    pub fn effective_log_file(&self, cli_log_file: Option<&Path>) -> Option<PathBuf> {
        cli_log_file
            .map(Path::to_path_buf)
            .or_else(|| self.log_file.clone())
            .or_else(logging::default_log_file)
    }
}

/// Format the configuration for display
pub fn format_config(config: &Config) -> String {
    let mut lines = Vec::new();

    lines.push("Current configuration:".to_string());
    lines.push(String::new());

    match config.protocol_prefix {
        Some(ref prefix) => lines.push(format!("  protocol_prefix = \"{}\"", prefix)),
        None => lines.push(format!(
            "  protocol_prefix = (not set, using \"{}\")",
            DEFAULT_PROTOCOL_PREFIX
        )),
    }

    match config.link_base_url {
        Some(ref url) => lines.push(format!("  link_base_url = \"{}\"", url)),
        None => lines.push(format!(
            "  link_base_url = (not set, using \"{}\")",
            DEFAULT_LINK_BASE_URL
        )),
    }

    match config.dropbox_dir {
        Some(ref dir) => lines.push(format!("  dropbox_dir = \"{}\"", dir.display())),
        None => lines.push("  dropbox_dir = (not set, using the platform default)".to_string()),
    }

    match config.log_file {
        Some(ref path) => lines.push(format!("  log_file = \"{}\"", path.display())),
        None => lines.push("  log_file = (not set)".to_string()),
    }

    if config.shared_folders.is_empty() {
        lines.push("  shared_folders = (not set, reading the Dropbox databases)".to_string());
    } else {
        lines.push("  shared_folders:".to_string());
        for entry in &config.shared_folders {
            lines.push(format!("    {} = \"{}\"", entry.namespace, entry.path.display()));
        }
    }

    lines.join("\n")
}
