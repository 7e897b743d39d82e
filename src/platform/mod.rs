//! Operating system integration.
//!
//! Everything that differs between operating systems sits behind the
//! [`Platform`] trait: where the Dropbox client keeps its databases, how to
//! reveal a file in the file browser, how to tell the user something, and how
//! to hook the tool into the desktop (URI handler, context menu entry).
//! [`native`] picks the implementation for the running OS once at startup;
//! callers only ever hold a `&dyn Platform`.

mod linux;
mod macos;
pub mod mock;
mod windows;

pub use linux::LinuxPlatform;
pub use macos::MacPlatform;
pub use windows::WindowsPlatform;

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::clipboard;
use crate::folders::{
    DropboxDatabase, FolderError, FolderResult, SharedFolder, SharedFolderSource,
};

/// Name of the context-menu entry created by `install`.
pub const MENU_ACTION_NAME: &str = "Copy Dropbox URI";

/// Error types for platform operations
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("File system error: {0}")]
    Io(#[from] io::Error),

    #[error("Cannot build a file URI for {}", .0.display())]
    FileUri(PathBuf),

    #[error("Could not determine {0} directory")]
    NoSystemDir(&'static str),

    #[error("Not supported on {platform}: {message}")]
    Unsupported {
        platform: &'static str,
        message: String,
    },
}

/// Result type for platform operations
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Severity of a message shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Warning,
    Error,
}

impl MessageLevel {
    /// Marker printed in front of the message on stderr.
    pub fn marker(&self) -> &'static str {
        match self {
            MessageLevel::Info => "✓",
            MessageLevel::Warning => "!",
            MessageLevel::Error => "✗",
        }
    }
}

/// What `install` needs to know about the running program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallContext {
    /// Absolute path of the executable to register.
    pub executable: PathBuf,
    /// URI scheme to register, e.g. `dropbox`.
    pub scheme: String,
    /// Human-readable program title.
    pub title: String,
}

impl InstallContext {
    /// Describe the currently running executable.
    pub fn current(scheme: impl Into<String>, title: impl Into<String>) -> io::Result<Self> {
        Ok(Self {
            executable: std::env::current_exe()?,
            scheme: scheme.into(),
            title: title.into(),
        })
    }
}

/// The operating system capabilities the tool relies on.
pub trait Platform: Send + Sync {
    /// Name of this platform (for logging).
    fn name(&self) -> &'static str;

    /// Directory where the Dropbox client keeps `config.db` and
    /// `filecache.db`.
    fn dropbox_dir(&self) -> Option<PathBuf>;

    /// Read the shared folders mounted on this machine.
    fn list_shared_folders(&self) -> FolderResult<Vec<SharedFolder>> {
        let dir = self.dropbox_dir().ok_or(FolderError::NoDataDir)?;
        DropboxDatabase::new(dir).list_shared_folders()
    }

    /// Open the file browser with `path` selected.
    fn reveal(&self, path: &Path) -> PlatformResult<()>;

    /// Put HTML content on the clipboard, with `text` as the plain fallback.
    fn set_rich_content(&self, html: &str, text: &str) -> PlatformResult<()> {
        clipboard::set_rich_content(html, text)
            .map_err(|e| PlatformError::Clipboard(e.to_string()))
    }

    /// Tell the user something. Never fails; delivery problems are logged.
    fn show_message(&self, level: MessageLevel, title: &str, message: &str);

    /// Register the URI handler and the file browser menu entry.
    fn install(&self, ctx: &InstallContext) -> PlatformResult<()>;

    /// Remove what `install` created.
    fn uninstall(&self, ctx: &InstallContext) -> PlatformResult<()>;
}

/// The platform implementation for the OS this binary was built for.
#[cfg(target_os = "macos")]
pub fn native() -> Box<dyn Platform> {
    Box::new(MacPlatform::new())
}

/// The platform implementation for the OS this binary was built for.
#[cfg(windows)]
pub fn native() -> Box<dyn Platform> {
    Box::new(WindowsPlatform::new())
}

/// The platform implementation for the OS this binary was built for.
#[cfg(not(any(target_os = "macos", windows)))]
pub fn native() -> Box<dyn Platform> {
    Box::new(LinuxPlatform::new())
}

/// Log a message and echo it to stderr.
///
/// Every platform does this before trying a native dialog, so the message is
/// never lost when no desktop session is around.
fn echo_message(level: MessageLevel, title: &str, message: &str) {
    match level {
        MessageLevel::Info => info!("{}: {}", title, message),
        MessageLevel::Warning => warn!("{}: {}", title, message),
        MessageLevel::Error => error!("{}: {}", title, message),
    }
    eprintln!("{} {}", level.marker(), message);
}

/// Run a command to completion and fail on a non-zero exit status.
fn run_command(cmd: &mut Command) -> PlatformResult<()> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    debug!("Running {:?}", cmd);

    let output = cmd.output().map_err(|source| PlatformError::Spawn {
        program: program.clone(),
        source,
    })?;

    if output.status.success() {
        Ok(())
    } else {
        Err(PlatformError::CommandFailed {
            program,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Start a command without waiting for it.
fn spawn_detached(cmd: &mut Command) -> PlatformResult<()> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    debug!("Spawning {:?}", cmd);
    cmd.spawn()
        .map(|_| ())
        .map_err(|source| PlatformError::Spawn { program, source })
}

/// Check if a binary exists in PATH
fn binary_exists(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Remove a file if it exists. Returns whether anything was removed.
fn remove_if_exists(path: &Path) -> PlatformResult<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed {:?}", path);
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
