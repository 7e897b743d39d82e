//! Windows integration.
//!
//! The URL protocol is registered per user under
//! `HKCU\Software\Classes\<scheme>` with `reg.exe`, and a "Copy Dropbox URI"
//! shortcut is placed in the user's SendTo folder through PowerShell's
//! `WScript.Shell` COM object. Neither needs administrator rights.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use super::{
    echo_message, remove_if_exists, run_command, spawn_detached, InstallContext, MessageLevel,
    Platform, PlatformError, PlatformResult, MENU_ACTION_NAME,
};

/// Windows platform.
pub struct WindowsPlatform;

impl WindowsPlatform {
    /// Create a new Windows platform
    pub fn new() -> Self {
        Self
    }

    /// `%APPDATA%\Microsoft\Windows\SendTo`
    pub fn send_to_dir() -> PlatformResult<PathBuf> {
        let appdata = dirs::config_dir().ok_or(PlatformError::NoSystemDir("AppData"))?;
        Ok(appdata.join("Microsoft").join("Windows").join("SendTo"))
    }

    /// Path of the SendTo shortcut.
    pub fn shortcut_path() -> PlatformResult<PathBuf> {
        Ok(Self::send_to_dir()?.join(format!("{}.lnk", MENU_ACTION_NAME)))
    }
}

impl Default for WindowsPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for WindowsPlatform {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn dropbox_dir(&self) -> Option<PathBuf> {
        dirs::config_dir().map(|appdata| appdata.join("Dropbox"))
    }

    fn reveal(&self, path: &Path) -> PlatformResult<()> {
        // explorer.exe reports exit code 1 even when it succeeds.
        spawn_detached(Command::new("explorer.exe").arg("/select,").arg(path))
    }

    fn show_message(&self, level: MessageLevel, title: &str, message: &str) {
        echo_message(level, title, message);

        let script = message_box_script(level, title, message);
        if let Err(e) = run_command(Command::new("powershell.exe").args([
            "-NoProfile",
            "-NonInteractive",
            "-Command",
            script.as_str(),
        ])) {
            warn!("Could not show message box: {}", e);
        }
    }

    fn install(&self, ctx: &InstallContext) -> PlatformResult<()> {
        for args in protocol_registration(ctx) {
            run_command(Command::new("reg.exe").args(&args))?;
        }

        let shortcut = Self::shortcut_path()?;
        if let Some(parent) = shortcut.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let script = shortcut_script(&shortcut, ctx);
        run_command(Command::new("powershell.exe").args([
            "-NoProfile",
            "-NonInteractive",
            "-Command",
            script.as_str(),
        ]))?;

        debug!("Installed {} protocol and {:?}", ctx.scheme, shortcut);
        Ok(())
    }

    fn uninstall(&self, ctx: &InstallContext) -> PlatformResult<()> {
        remove_if_exists(&Self::shortcut_path()?)?;

        let key = protocol_key(&ctx.scheme);
        if let Err(e) = run_command(Command::new("reg.exe").args(["delete", key.as_str(), "/f"])) {
            // Already gone is fine.
            debug!("Could not delete {}: {}", key, e);
        }
        Ok(())
    }
}

fn protocol_key(scheme: &str) -> String {
    format!("HKCU\\Software\\Classes\\{}", scheme)
}

/// `reg.exe` invocations registering `<scheme>:` to launch the executable.
fn protocol_registration(ctx: &InstallContext) -> Vec<Vec<String>> {
    let key = protocol_key(&ctx.scheme);
    let exe = ctx.executable.to_string_lossy();
    let command = format!("\"{}\" \"%1\"", exe);
    let icon = format!("{},0", exe);

    let add = |subkey: &str, value: &[&str], data: &str| {
        let mut args = vec!["add".to_string(), format!("{}{}", key, subkey)];
        args.extend(value.iter().map(|s| s.to_string()));
        args.extend(["/d".to_string(), data.to_string(), "/f".to_string()]);
        args
    };

    vec![
        add("", &["/ve"], &format!("URL:{} Protocol", ctx.scheme)),
        add("", &["/v", "URL Protocol"], ""),
        add("\\DefaultIcon", &["/ve"], &icon),
        add("\\shell\\open\\command", &["/ve"], &command),
    ]
}

/// Quote a string for a single-quoted PowerShell literal.
fn ps_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn shortcut_script(shortcut: &Path, ctx: &InstallContext) -> String {
    let exe = ctx.executable.to_string_lossy();
    let workdir = ctx
        .executable
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!(
        "$s = (New-Object -ComObject WScript.Shell).CreateShortcut({lnk}); \
         $s.TargetPath = {exe}; \
         $s.WorkingDirectory = {workdir}; \
         $s.Description = {desc}; \
         $s.IconLocation = {icon}; \
         $s.Save()",
        lnk = ps_quote(&shortcut.to_string_lossy()),
        exe = ps_quote(&exe),
        workdir = ps_quote(&workdir),
        desc = ps_quote(MENU_ACTION_NAME),
        icon = ps_quote(&format!("{},0", exe)),
    )
}

fn message_box_script(level: MessageLevel, title: &str, message: &str) -> String {
    let icon = match level {
        MessageLevel::Info => "Information",
        MessageLevel::Warning => "Warning",
        MessageLevel::Error => "Error",
    };
    format!(
        "Add-Type -AssemblyName PresentationFramework; \
         [System.Windows.MessageBox]::Show({}, {}, 'OK', '{}') | Out-Null",
        ps_quote(message),
        ps_quote(title),
        icon
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> InstallContext {
        InstallContext {
            executable: PathBuf::from("C:\\Tools\\shareuri.exe"),
            scheme: "dropbox".to_string(),
            title: "Share Dropbox".to_string(),
        }
    }

    #[test]
    fn test_windows_name() {
        assert_eq!(WindowsPlatform::new().name(), "windows");
    }

    #[test]
    fn test_shortcut_path() {
        if let Ok(path) = WindowsPlatform::shortcut_path() {
            assert!(path.to_string_lossy().ends_with("Copy Dropbox URI.lnk"));
            assert!(path.to_string_lossy().contains("SendTo"));
        }
    }

    #[test]
    fn test_protocol_registration() {
        let commands = protocol_registration(&ctx());
        assert_eq!(commands.len(), 4);

        assert_eq!(
            commands[0],
            vec![
                "add",
                "HKCU\\Software\\Classes\\dropbox",
                "/ve",
                "/d",
                "URL:dropbox Protocol",
                "/f"
            ]
        );
        assert_eq!(
            commands[1],
            vec![
                "add",
                "HKCU\\Software\\Classes\\dropbox",
                "/v",
                "URL Protocol",
                "/d",
                "",
                "/f"
            ]
        );
        assert_eq!(commands[2][1], "HKCU\\Software\\Classes\\dropbox\\DefaultIcon");
        assert_eq!(commands[2][4], "C:\\Tools\\shareuri.exe,0");
        assert_eq!(
            commands[3][1],
            "HKCU\\Software\\Classes\\dropbox\\shell\\open\\command"
        );
        assert_eq!(commands[3][4], "\"C:\\Tools\\shareuri.exe\" \"%1\"");
    }

    #[test]
    fn test_ps_quote() {
        assert_eq!(ps_quote("plain"), "'plain'");
        assert_eq!(ps_quote("it's"), "'it''s'");
    }

    #[test]
    fn test_shortcut_script() {
        let script = shortcut_script(Path::new("C:\\SendTo\\Copy Dropbox URI.lnk"), &ctx());
        assert!(script.contains("CreateShortcut('C:\\SendTo\\Copy Dropbox URI.lnk')"));
        assert!(script.contains("$s.TargetPath = 'C:\\Tools\\shareuri.exe'"));
        assert!(script.contains("$s.Description = 'Copy Dropbox URI'"));
        assert!(script.ends_with("$s.Save()"));
    }

    #[test]
    fn test_message_box_script() {
        let script = message_box_script(MessageLevel::Warning, "Share Dropbox", "Don't panic");
        assert!(script.contains("Show('Don''t panic', 'Share Dropbox', 'OK', 'Warning')"));
    }
}
