//! Command-line dispatch.
//!
//! Each argument is either a share URI, which is resolved and revealed in the
//! file browser, or a path, which is turned into a share link. Links from all
//! path arguments end up on the clipboard together. Codec failures only stop
//! the argument that caused them; collaborator failures (unreadable folder
//! databases, a broken clipboard) stop the whole run.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clipboard::{ClipboardContent, Link, LinkRenderer};
use crate::codec::{self, CodecError, ShareToken, UriFormat};
use crate::config::Config;
use crate::folders::{
    DropboxDatabase, FolderError, FolderResult, SharedFolder, SharedFolderSource, StaticFolders,
};
use crate::paths;
use crate::platform::{MessageLevel, Platform, PlatformError};

/// Title used for messages and the desktop entry.
pub const PROGRAM_TITLE: &str = "Share Dropbox";

/// Failures that abort a dispatch run.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to read shared folders: {0}")]
    Folders(#[from] FolderError),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("Failed to render links: {0}")]
    Render(#[from] minijinja::Error),
}

/// Result type for dispatch
pub type AppResult<T> = Result<T, AppError>;

/// What a command-line argument turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument {
    /// A share URI or web link carrying a token.
    Token(ShareToken),
    /// An existing file or directory, made absolute.
    Path(PathBuf),
    /// Neither; ignored.
    Skipped(String),
}

/// Classify a single argument.
pub fn classify(arg: &str, format: &UriFormat) -> Argument {
    if let Some(token) = format.parse(arg) {
        return Argument::Token(token);
    }

    let path = Path::new(arg);
    if path.exists() {
        match paths::absolute(path) {
            Ok(absolute) => return Argument::Path(absolute),
            Err(e) => debug!("Could not make {:?} absolute: {}", path, e),
        }
    }

    Argument::Skipped(arg.to_string())
}

/// Reads shared folders through the platform's own source.
pub struct PlatformFolders<'a> {
    platform: &'a dyn Platform,
}

impl<'a> PlatformFolders<'a> {
    pub fn new(platform: &'a dyn Platform) -> Self {
        Self { platform }
    }
}

impl SharedFolderSource for PlatformFolders<'_> {
    fn name(&self) -> &'static str {
        self.platform.name()
    }

    fn list_shared_folders(&self) -> FolderResult<Vec<SharedFolder>> {
        self.platform.list_shared_folders()
    }
}

/// Pick the shared-folder source for this run.
///
/// Folders listed in the config win, then a configured Dropbox data
/// directory, then whatever the platform finds.
pub fn folder_source<'a>(
    config: &Config,
    platform: &'a dyn Platform,
) -> Box<dyn SharedFolderSource + 'a> {
    let configured = StaticFolders::new(config.shared_folders());
    if !configured.is_empty() {
        return Box::new(configured);
    }
    if let Some(ref dir) = config.dropbox_dir {
        return Box::new(DropboxDatabase::new(dir));
    }
    Box::new(PlatformFolders::new(platform))
}

/// Whether results are acted upon or only reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Reveal resolved files and copy links to the clipboard.
    #[default]
    Act,
    /// Leave the desktop alone; the caller prints the report.
    Print,
}

/// Outcome of a dispatch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Paths resolved from share URIs, in argument order.
    pub resolved: Vec<PathBuf>,
    /// Links created from path arguments, in argument order.
    pub links: Vec<Link>,
    /// What was put on the clipboard, if anything.
    pub clipboard: Option<ClipboardContent>,
    /// Warning messages shown for arguments that failed.
    pub warnings: Vec<String>,
    /// Arguments that were neither URIs nor existing paths.
    pub skipped: Vec<String>,
}

impl RunReport {
    /// Whether any argument failed.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Runs arguments against a platform and a shared-folder source.
pub struct Dispatcher<'a> {
    platform: &'a dyn Platform,
    source: &'a dyn SharedFolderSource,
    format: UriFormat,
    mode: Mode,
    folders: Option<Vec<SharedFolder>>,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        platform: &'a dyn Platform,
        source: &'a dyn SharedFolderSource,
        format: UriFormat,
    ) -> Self {
        Self {
            platform,
            source,
            format,
            mode: Mode::Act,
            folders: None,
        }
    }

    /// Set the dispatch mode.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// The shared folders, read on first use only.
    fn folders(&mut self) -> AppResult<&[SharedFolder]> {
        if self.folders.is_none() {
            let folders = self.source.list_shared_folders()?;
            debug!(
                "Read {} shared folders from {}",
                folders.len(),
                self.source.name()
            );
            self.folders = Some(folders);
        }
        Ok(self.folders.as_deref().unwrap_or_default())
    }

    /// Dispatch every argument, then copy the collected links.
    pub fn run<S: AsRef<str>>(&mut self, args: &[S]) -> AppResult<RunReport> {
        let mut report = RunReport::default();

        for arg in args {
            match classify(arg.as_ref(), &self.format) {
                Argument::Token(token) => {
                    match codec::resolve(&token, self.folders()?) {
                        Ok(path) => {
                            if self.mode == Mode::Act {
                                info!("Revealing {:?}", path);
                                self.platform.reveal(&path)?;
                            }
                            report.resolved.push(path);
                        }
                        Err(e) => self.warn(&mut report, e),
                    }
                }
                Argument::Path(path) => match self.link(&path) {
                    Ok(link) => report.links.push(link),
                    Err(LinkError::Codec(e)) => self.warn(&mut report, e),
                    Err(LinkError::App(e)) => return Err(e),
                },
                Argument::Skipped(arg) => {
                    debug!("Skipping argument {:?}", arg);
                    report.skipped.push(arg);
                }
            }
        }

        if !report.links.is_empty() {
            let content = LinkRenderer::new()?.render(&report.links)?;
            if self.mode == Mode::Act {
                self.platform
                    .set_rich_content(&content.html, &content.text)?;
                info!("Copied {} link(s) to the clipboard", report.links.len());
            }
            report.clipboard = Some(content);
        }

        Ok(report)
    }

    fn link(&mut self, path: &Path) -> Result<Link, LinkError> {
        let token = codec::link_from_path(path, self.folders()?)?;
        // Anchors show the path as stored in the token, leading separator included.
        let label = codec::decode(&token)?.relative_path;
        Ok(Link::new(self.format.link(&token), label))
    }

    fn warn(&self, report: &mut RunReport, error: impl std::fmt::Display) {
        let message = sentence(&error.to_string());
        warn!("{}", message);
        self.platform
            .show_message(MessageLevel::Warning, PROGRAM_TITLE, &message);
        report.warnings.push(message);
    }
}

/// Failure of a single link, split so that folder errors still abort.
enum LinkError {
    App(AppError),
    Codec(CodecError),
}

impl From<AppError> for LinkError {
    fn from(e: AppError) -> Self {
        LinkError::App(e)
    }
}

impl From<CodecError> for LinkError {
    fn from(e: CodecError) -> Self {
        LinkError::Codec(e)
    }
}

/// Upper-case the first letter of a message.
fn sentence(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
