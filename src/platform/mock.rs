//! Mock platform for testing.
//!
//! Records every reveal, clipboard write, message and install call instead of
//! touching the desktop, and serves a fixed shared-folder list. Failures can
//! be switched on per capability through [`MockConfig`].

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::{InstallContext, MessageLevel, Platform, PlatformError, PlatformResult};
use crate::folders::{FolderError, FolderResult, SharedFolder};

/// Configuration for mock platform behavior.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Folders returned by `list_shared_folders`.
    pub folders: Vec<SharedFolder>,
    /// If set, `list_shared_folders` fails with a missing-key error naming this.
    pub folder_error: Option<String>,
    /// Whether `reveal` fails.
    pub fail_reveal: bool,
    /// Whether `set_rich_content` fails.
    pub fail_clipboard: bool,
}

impl MockConfig {
    /// Create a config serving the given folders.
    pub fn with_folders(folders: Vec<SharedFolder>) -> Self {
        Self {
            folders,
            ..Default::default()
        }
    }

    /// Create a config whose folder source fails.
    pub fn with_folder_error(key: impl Into<String>) -> Self {
        Self {
            folder_error: Some(key.into()),
            ..Default::default()
        }
    }
}

/// A message passed to `show_message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedMessage {
    pub level: MessageLevel,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Default)]
struct Recorded {
    folder_reads: usize,
    revealed: Vec<PathBuf>,
    clipboard: Option<(String, String)>,
    messages: Vec<RecordedMessage>,
    installs: usize,
    uninstalls: usize,
}

/// Mock platform for testing.
///
/// ```ignore
/// use shareuri::folders::SharedFolder;
/// use shareuri::platform::mock::{MockConfig, MockPlatform};
///
/// let platform = MockPlatform::with_config(MockConfig::with_folders(vec![
///     SharedFolder::new("ns1", "/mnt/team"),
/// ]));
/// // ... run a dispatcher against &platform ...
/// assert!(platform.messages().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct MockPlatform {
    config: MockConfig,
    recorded: Mutex<Recorded>,
}

impl MockPlatform {
    /// Create a mock platform with no shared folders.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock platform with custom configuration.
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            recorded: Mutex::new(Recorded::default()),
        }
    }

    fn recorded(&self) -> MutexGuard<'_, Recorded> {
        // A panicking test thread must not hide what was recorded.
        self.recorded.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// How often the folder list was read.
    pub fn folder_reads(&self) -> usize {
        self.recorded().folder_reads
    }

    /// Paths passed to `reveal`, in call order.
    pub fn revealed(&self) -> Vec<PathBuf> {
        self.recorded().revealed.clone()
    }

    /// The last `(html, text)` pair written to the clipboard.
    pub fn clipboard(&self) -> Option<(String, String)> {
        self.recorded().clipboard.clone()
    }

    /// Messages shown, in call order.
    pub fn messages(&self) -> Vec<RecordedMessage> {
        self.recorded().messages.clone()
    }

    /// Messages shown at `level`.
    pub fn messages_at(&self, level: MessageLevel) -> Vec<RecordedMessage> {
        self.recorded()
            .messages
            .iter()
            .filter(|m| m.level == level)
            .cloned()
            .collect()
    }

    /// Number of `install` calls.
    pub fn installs(&self) -> usize {
        self.recorded().installs
    }

    /// Number of `uninstall` calls.
    pub fn uninstalls(&self) -> usize {
        self.recorded().uninstalls
    }
}

impl Platform for MockPlatform {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn dropbox_dir(&self) -> Option<PathBuf> {
        None
    }

    fn list_shared_folders(&self) -> FolderResult<Vec<SharedFolder>> {
        self.recorded().folder_reads += 1;
        match &self.config.folder_error {
            Some(key) => Err(FolderError::MissingConfigKey(key.clone())),
            None => Ok(self.config.folders.clone()),
        }
    }

    fn reveal(&self, path: &Path) -> PlatformResult<()> {
        if self.config.fail_reveal {
            return Err(PlatformError::CommandFailed {
                program: "mock-reveal".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "reveal disabled".to_string(),
            });
        }
        self.recorded().revealed.push(path.to_path_buf());
        Ok(())
    }

    fn set_rich_content(&self, html: &str, text: &str) -> PlatformResult<()> {
        if self.config.fail_clipboard {
            return Err(PlatformError::Clipboard("clipboard disabled".to_string()));
        }
        self.recorded().clipboard = Some((html.to_string(), text.to_string()));
        Ok(())
    }

    fn show_message(&self, level: MessageLevel, title: &str, message: &str) {
        self.recorded().messages.push(RecordedMessage {
            level,
            title: title.to_string(),
            message: message.to_string(),
        });
    }

    fn install(&self, _ctx: &InstallContext) -> PlatformResult<()> {
        self.recorded().installs += 1;
        Ok(())
    }

    fn uninstall(&self, _ctx: &InstallContext) -> PlatformResult<()> {
        self.recorded().uninstalls += 1;
        Ok(())
    }
}
