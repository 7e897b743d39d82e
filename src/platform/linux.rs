//! Freedesktop (Linux, BSD) integration.
//!
//! The URI handler is a hidden `.desktop` entry registered for
//! `x-scheme-handler/<scheme>`; the file browser entry is a Nautilus script,
//! which Nautilus runs with the selected files as arguments.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};
use url::Url;

use super::{
    binary_exists, echo_message, remove_if_exists, run_command, spawn_detached, InstallContext,
    MessageLevel, Platform, PlatformError, PlatformResult, MENU_ACTION_NAME,
};

const DESKTOP_FILE: &str = "shareuri.desktop";

/// Linux desktop platform.
pub struct LinuxPlatform;

impl LinuxPlatform {
    /// Create a new Linux platform
    pub fn new() -> Self {
        Self
    }

    /// `~/.local/share/applications/shareuri.desktop`
    pub fn desktop_entry_path() -> PlatformResult<PathBuf> {
        let data = dirs::data_dir().ok_or(PlatformError::NoSystemDir("data"))?;
        Ok(data.join("applications").join(DESKTOP_FILE))
    }

    /// `~/.local/share/nautilus/scripts/Copy Dropbox URI`
    pub fn nautilus_script_path() -> PlatformResult<PathBuf> {
        let data = dirs::data_dir().ok_or(PlatformError::NoSystemDir("data"))?;
        Ok(data.join("nautilus").join("scripts").join(MENU_ACTION_NAME))
    }
}

impl Default for LinuxPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for LinuxPlatform {
    fn name(&self) -> &'static str {
        "linux"
    }

    fn dropbox_dir(&self) -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".dropbox"))
    }

    fn reveal(&self, path: &Path) -> PlatformResult<()> {
        let items = format!("array:string:{}", file_uri(path)?);
        let shown = run_command(Command::new("dbus-send").args([
            "--session",
            "--print-reply",
            "--dest=org.freedesktop.FileManager1",
            "--type=method_call",
            "/org/freedesktop/FileManager1",
            "org.freedesktop.FileManager1.ShowItems",
            items.as_str(),
            "string:",
        ]));

        match shown {
            Ok(()) => Ok(()),
            Err(e) => {
                debug!("FileManager1.ShowItems failed ({}), falling back to xdg-open", e);
                let dir = path.parent().unwrap_or(path);
                spawn_detached(Command::new("xdg-open").arg(dir))
            }
        }
    }

    fn show_message(&self, level: MessageLevel, title: &str, message: &str) {
        echo_message(level, title, message);

        if !binary_exists("notify-send") {
            return;
        }
        let urgency = match level {
            MessageLevel::Info => "low",
            MessageLevel::Warning => "normal",
            MessageLevel::Error => "critical",
        };
        if let Err(e) = run_command(
            Command::new("notify-send")
                .args(["--urgency", urgency, "--app-name", title])
                .arg(title)
                .arg(message),
        ) {
            warn!("Could not show desktop notification: {}", e);
        }
    }

    fn install(&self, ctx: &InstallContext) -> PlatformResult<()> {
        let entry_path = Self::desktop_entry_path()?;
        write_file(&entry_path, &desktop_entry(ctx))?;

        let mime_type = format!("x-scheme-handler/{}", ctx.scheme);
        if binary_exists("xdg-mime") {
            run_command(Command::new("xdg-mime").args(["default", DESKTOP_FILE, mime_type.as_str()]))?;
        } else {
            warn!("xdg-mime not found; {} handler written but not made default", mime_type);
        }

        let script_path = Self::nautilus_script_path()?;
        write_file(&script_path, &nautilus_script(ctx))?;
        make_executable(&script_path)?;

        debug!("Installed {:?} and {:?}", entry_path, script_path);
        Ok(())
    }

    fn uninstall(&self, _ctx: &InstallContext) -> PlatformResult<()> {
        remove_if_exists(&Self::desktop_entry_path()?)?;
        remove_if_exists(&Self::nautilus_script_path()?)?;
        Ok(())
    }
}

fn write_file(path: &Path, contents: &str) -> PlatformResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> PlatformResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> PlatformResult<()> {
    Ok(())
}

/// Hidden desktop entry that handles `<scheme>:` URIs.
fn desktop_entry(ctx: &InstallContext) -> String {
    format!(
        "[Desktop Entry]\n\
         Type=Application\n\
         Name={title}\n\
         Comment=Open shared Dropbox links\n\
         Exec={exec} %u\n\
         Terminal=false\n\
         NoDisplay=true\n\
         MimeType=x-scheme-handler/{scheme};\n",
        title = ctx.title,
        exec = desktop_exec_quote(&ctx.executable.to_string_lossy()),
        scheme = ctx.scheme,
    )
}

/// Nautilus script forwarding the selected files to the executable.
fn nautilus_script(ctx: &InstallContext) -> String {
    format!(
        "#!/bin/sh\nexec {} \"$@\"\n",
        shell_quote(&ctx.executable.to_string_lossy())
    )
}

/// Quote an argument for the `Exec` key of a desktop entry.
fn desktop_exec_quote(arg: &str) -> String {
    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for c in arg.chars() {
        if matches!(c, '"' | '`' | '$' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Single-quote an argument for `/bin/sh`.
fn shell_quote(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', "'\\''"))
}

/// `file://` URI for an absolute path, raw bytes percent-encoded.
fn file_uri(path: &Path) -> PlatformResult<Url> {
    Url::from_file_path(path).map_err(|()| PlatformError::FileUri(path.to_path_buf()))
}
