//! macOS integration.
//!
//! The `dropbox:` URL scheme is declared by the application bundle
//! (`CFBundleURLTypes`). `install` copies the bundled Automator workflow into
//! `~/Library/Services` so Finder offers the menu entry, pointing it at the
//! running bundle.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::{
    echo_message, run_command, InstallContext, MessageLevel, Platform, PlatformError,
    PlatformResult, MENU_ACTION_NAME,
};

/// App path the shipped workflow refers to until it is patched.
const WORKFLOW_APP_PLACEHOLDER: &str = "/Applications/DropboxURI.app";

/// The workflow file holding the app path, relative to the workflow bundle.
const WORKFLOW_DOCUMENT: &str = "Contents/document.wflow";

/// AppleScript taking title and message from argv, so nothing needs escaping.
const ALERT_SCRIPT: [&str; 3] = [
    "on run argv",
    "display alert (item 1 of argv) message (item 2 of argv) as {level}",
    "end run",
];

/// macOS platform.
pub struct MacPlatform;

impl MacPlatform {
    /// Create a new macOS platform
    pub fn new() -> Self {
        Self
    }

    /// `~/Library/Services`
    fn services_dir() -> PlatformResult<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join("Library").join("Services"))
            .ok_or(PlatformError::NoSystemDir("home"))
    }
}

impl Default for MacPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for MacPlatform {
    fn name(&self) -> &'static str {
        "macos"
    }

    fn dropbox_dir(&self) -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".dropbox"))
    }

    fn reveal(&self, path: &Path) -> PlatformResult<()> {
        run_command(Command::new("open").arg("-R").arg(path))
    }

    fn show_message(&self, level: MessageLevel, title: &str, message: &str) {
        echo_message(level, title, message);

        let mut cmd = Command::new("osascript");
        for line in alert_script(level) {
            cmd.arg("-e").arg(line);
        }
        cmd.arg(title).arg(message);

        if let Err(e) = run_command(&mut cmd) {
            warn!("Could not show alert: {}", e);
        }
    }

    fn install(&self, ctx: &InstallContext) -> PlatformResult<()> {
        let app = app_bundle(&ctx.executable).ok_or_else(|| PlatformError::Unsupported {
            platform: self.name(),
            message: format!("{} is not inside an application bundle", ctx.executable.display()),
        })?;
        install_workflow(&app, &Self::services_dir()?)?;
        Ok(())
    }

    fn uninstall(&self, _ctx: &InstallContext) -> PlatformResult<()> {
        remove_workflow(&Self::services_dir()?)?;
        Ok(())
    }
}

fn workflow_name() -> String {
    format!("{}.workflow", MENU_ACTION_NAME)
}

/// The `.app` directory containing `executable` (`<app>/Contents/MacOS/<exe>`).
fn app_bundle(executable: &Path) -> Option<PathBuf> {
    let app = executable.parent()?.parent()?.parent()?;
    let is_app = app
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("app"));
    is_app.then(|| app.to_path_buf())
}

/// Install the bundled Services workflow of `app` into `services_dir`.
///
/// An installed workflow that already points at `app` is left alone; one
/// pointing elsewhere is replaced. Returns whether anything was written.
fn install_workflow(app: &Path, services_dir: &Path) -> PlatformResult<bool> {
    let target = services_dir.join(workflow_name());
    let app_path = app.to_string_lossy();

    if target.exists() {
        let document = fs::read_to_string(target.join(WORKFLOW_DOCUMENT)).unwrap_or_default();
        if document.contains(app_path.as_ref()) {
            debug!("Services workflow {:?} is up to date", target);
            return Ok(false);
        }
    }

    let source = app.join("Contents").join("Resources").join(workflow_name());
    if !source.is_dir() {
        return Err(PlatformError::Unsupported {
            platform: "macos",
            message: format!("{} has no bundled Services workflow", app.display()),
        });
    }

    if target.exists() {
        info!("Services workflow {:?} points elsewhere, reinstalling", target);
        fs::remove_dir_all(&target)?;
    }
    copy_tree(&source, &target)?;

    let document_path = target.join(WORKFLOW_DOCUMENT);
    let document = fs::read_to_string(&document_path)?;
    fs::write(
        &document_path,
        document.replace(WORKFLOW_APP_PLACEHOLDER, app_path.as_ref()),
    )?;

    info!("Installed Services workflow {:?}", target);
    Ok(true)
}

/// Remove the Services workflow. Returns whether one was installed.
fn remove_workflow(services_dir: &Path) -> PlatformResult<bool> {
    let target = services_dir.join(workflow_name());
    match fs::remove_dir_all(&target) {
        Ok(()) => {
            debug!("Removed {:?}", target);
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Recursively copy the directory `from` to `to`.
fn copy_tree(from: &Path, to: &Path) -> PlatformResult<()> {
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry.path().strip_prefix(from).unwrap_or(entry.path());
        let dest = to.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest)?;
        } else {
            fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}

fn alert_script(level: MessageLevel) -> Vec<String> {
    let style = match level {
        MessageLevel::Info => "informational",
        MessageLevel::Warning => "warning",
        MessageLevel::Error => "critical",
    };
    ALERT_SCRIPT
        .iter()
        .map(|line| line.replace("{level}", style))
        .collect()
}
