//! Integration tests for the `shareuri` binary.
//!
//! Every test pins its shared folders and log file in a temp config so the
//! user's Dropbox databases and log directory are never touched. Only
//! `--print` dispatch is exercised; acting on results needs a desktop.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

use shareuri::codec::encode;

struct Env {
    temp: TempDir,
    shared: PathBuf,
}

impl Env {
    /// A temp config pinning namespace `ns1` to `<temp>/Shared`.
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let shared = temp.path().join("Shared");
        fs::create_dir_all(shared.join("docs")).unwrap();
        fs::write(shared.join("docs").join("readme.txt"), "hello").unwrap();

        let config = format!(
            "[[shared_folders]]\nnamespace = 'ns1'\npath = '{}'\n",
            shared.display()
        );
        fs::write(temp.path().join("config.toml"), config).unwrap();

        Self { temp, shared }
    }

    fn config_path(&self) -> PathBuf {
        self.temp.path().join("config.toml")
    }

    fn log_path(&self) -> PathBuf {
        self.temp.path().join("logs").join("shareuri.log")
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_shareuri"))
            .arg("--config")
            .arg(self.config_path())
            .arg("--log-file")
            .arg(self.log_path())
            .args(args)
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to execute shareuri")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_decode_uri() {
    let env = Env::new();
    let uri = format!("dropbox:{}", encode("teamA", "/docs/readme.txt"));

    let output = env.run(&["decode", &uri]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("namespace: teamA"));
    assert!(out.contains("relative_path: /docs/readme.txt"));
}

#[test]
fn test_decode_bare_token() {
    let env = Env::new();
    let token = encode("teamA", "/a.txt").to_string();

    let output = env.run(&["decode", &token]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("relative_path: /a.txt"));
}

#[test]
fn test_decode_malformed() {
    let env = Env::new();

    let output = env.run(&["decode", "not a token"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("malformed share link"));
}

#[test]
fn test_folders_json() {
    let env = Env::new();

    let output = env.run(&["folders", "--json"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let folders: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let folders = folders.as_array().unwrap();
    assert_eq!(folders.len(), 1);
    assert_eq!(folders[0]["namespace"], "ns1");
    assert_eq!(
        folders[0]["local_path"].as_str().unwrap(),
        path_arg(&env.shared)
    );
}

#[test]
fn test_print_link_for_path() {
    let env = Env::new();
    let file = env.shared.join("docs").join("readme.txt");

    let output = env.run(&["--print", path_arg(&file)]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let link = stdout(&output).trim().to_string();
    assert!(link.starts_with("http://www.sharedropbox.com/"));

    // The link decodes back to the file's place in the shared folder.
    let decoded = env.run(&["decode", &link]);
    assert!(stdout(&decoded).contains("namespace: ns1"));
    assert!(stdout(&decoded).contains("readme.txt"));
}

#[test]
fn test_print_resolved_uri() {
    let env = Env::new();
    let uri = format!("dropbox:{}", encode("ns1", "/docs/readme.txt"));

    let output = env.run(&["--print", &uri]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let resolved = PathBuf::from(stdout(&output).trim());
    assert_eq!(resolved, env.shared.join("docs").join("readme.txt"));
}

#[test]
fn test_print_with_warning_still_prints_good_links() {
    let env = Env::new();
    let outside = env.temp.path().join("outside.txt");
    fs::write(&outside, "x").unwrap();
    let file = env.shared.join("docs").join("readme.txt");

    let output = env.run(&["--print", path_arg(&outside), path_arg(&file)]);

    assert_eq!(output.status.code(), Some(1), "Expected warning exit code");
    assert!(stderr(&output).contains("You can only link to items in shared folders"));
    assert_eq!(stdout(&output).lines().count(), 1);
}

#[test]
fn test_unknown_namespace_warns() {
    let env = Env::new();
    let uri = format!("dropbox:{}", encode("elsewhere", "/x.txt"));

    let output = env.run(&["--print", &uri]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("elsewhere"));
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_config_path_and_add_folder() {
    let env = Env::new();

    let output = env.run(&["config", "path"]);
    assert!(output.status.success());
    assert_eq!(PathBuf::from(stdout(&output).trim()), env.config_path());

    let extra = env.temp.path().join("Extra");
    fs::create_dir_all(&extra).unwrap();
    let output = env.run(&["config", "add-folder", "ns2", path_arg(&extra)]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("✓"));

    let folders = stdout(&env.run(&["folders"]));
    let lines: Vec<&str> = folders.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("ns1\t"));
    assert!(lines[1].starts_with("ns2\t"));

    let shown = stdout(&env.run(&["config"]));
    assert!(shown.contains("Current configuration:"));
    assert!(shown.contains("ns2 = "));
}

#[test]
fn test_invalid_config_fails() {
    let env = Env::new();
    fs::write(env.config_path(), "shared_folders = 3").unwrap();

    let output = env.run(&["folders"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("✗"));
}

#[test]
fn test_log_file_written() {
    let env = Env::new();

    let output = env.run(&["folders"]);
    assert!(output.status.success());

    // The log rotates daily, so the file carries a date suffix.
    let logs: Vec<PathBuf> = fs::read_dir(env.temp.path().join("logs"))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(logs.len(), 1);

    let name = logs[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("shareuri.log."), "unexpected log file {}", name);

    let log = fs::read_to_string(&logs[0]).unwrap();
    assert!(log.contains("Loaded config"));
}
