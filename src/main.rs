use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error, info};

use shareuri::app::{folder_source, Dispatcher, Mode, PROGRAM_TITLE};
use shareuri::codec::{self, ShareToken};
use shareuri::config::{format_config, Config};
use shareuri::logging::{init_logging, LogConfig, Verbosity};
use shareuri::paths;
use shareuri::platform::{self, InstallContext, MessageLevel, Platform};

/// Some arguments could not be handled.
const EXIT_WARNING: u8 = 1;
/// The run was aborted.
const EXIT_ERROR: u8 = 2;

#[derive(Parser)]
#[command(name = "shareuri")]
#[command(version)]
#[command(about = "Copy and open links to files in shared Dropbox folders")]
#[command(
    long_about = "Turns files inside shared Dropbox folders into links that open the same file on every machine the folder is synced to, and opens such links by revealing the file in the file browser."
)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Share URIs to open, or files to copy links for
    #[arg(value_name = "URI_OR_PATH")]
    targets: Vec<String>,

    /// Print resolved paths and links instead of revealing files and using the clipboard
    #[arg(long)]
    print: bool,

    /// Increase stderr logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Write logs to this file instead of the default location
    #[arg(long, value_name = "PATH", global = true)]
    log_file: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Register the URI handler and the file browser menu entry
    Install,
    /// Remove the URI handler and the file browser menu entry
    Uninstall,
    /// List the shared folders mounted on this machine
    Folders {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the shared folder and relative path inside a share URI or token
    Decode {
        /// Share URI, web link, or bare token
        token: String,
    },
    /// Show or edit the configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the current configuration
    Show,
    /// Print the config file path
    Path,
    /// Pin a shared folder instead of reading the Dropbox databases
    AddFolder {
        /// Namespace of the shared folder
        namespace: String,
        /// Where the folder is mounted on this machine
        path: PathBuf,
    },
    /// Remove all pinned shared folders
    ClearFolders,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = match cli.config.clone().map_or_else(Config::config_path, Ok) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("✗ {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let config = match Config::load_from(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ {}: {}", config_path.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let _guard = init_logging(&LogConfig {
        verbosity: Verbosity::from_count(cli.verbose),
        log_file: config.effective_log_file(cli.log_file.as_deref()),
    });
    debug!("Loaded config from {:?}", config_path);

    let platform = platform::native();
    info!("Running on {}", platform.name());

    match run(cli, config, &config_path, platform.as_ref()) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            platform.show_message(MessageLevel::Error, PROGRAM_TITLE, &format!("{:#}", e));
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run(cli: Cli, config: Config, config_path: &Path, platform: &dyn Platform) -> Result<ExitCode> {
    match cli.command {
        None => dispatch(&cli.targets, cli.print, &config, platform),
        Some(Commands::Install) => {
            let ctx = install_context(&config)?;
            platform.install(&ctx).context("Installation failed")?;
            platform.show_message(
                MessageLevel::Info,
                PROGRAM_TITLE,
                &format!("Installed the {}: handler", ctx.scheme),
            );
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Uninstall) => {
            let ctx = install_context(&config)?;
            platform.uninstall(&ctx).context("Uninstallation failed")?;
            platform.show_message(
                MessageLevel::Info,
                PROGRAM_TITLE,
                &format!("Removed the {}: handler", ctx.scheme),
            );
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Folders { json }) => {
            let source = folder_source(&config, platform);
            let folders = source
                .list_shared_folders()
                .with_context(|| format!("Failed to read shared folders from {}", source.name()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&folders)?);
            } else if folders.is_empty() {
                println!("No shared folders found.");
            } else {
                for folder in &folders {
                    println!("{}\t{}", folder.namespace(), folder.local_path().display());
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Decode { token }) => {
            let parsed = config
                .uri_format()
                .parse(&token)
                .map(Ok)
                .unwrap_or_else(|| ShareToken::parse(&token));

            match parsed.and_then(|token| codec::decode(&token)) {
                Ok(share) => {
                    println!("namespace: {}", share.namespace);
                    println!("relative_path: {}", share.relative_path);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    platform.show_message(MessageLevel::Warning, PROGRAM_TITLE, &e.to_string());
                    Ok(ExitCode::from(EXIT_WARNING))
                }
            }
        }
        Some(Commands::Config { action }) => {
            handle_config(action.unwrap_or(ConfigAction::Show), config, config_path)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn dispatch(
    targets: &[String],
    print: bool,
    config: &Config,
    platform: &dyn Platform,
) -> Result<ExitCode> {
    if targets.is_empty() {
        Cli::command().print_help()?;
        return Ok(ExitCode::SUCCESS);
    }

    let source = folder_source(config, platform);
    let mode = if print { Mode::Print } else { Mode::Act };
    let mut dispatcher =
        Dispatcher::new(platform, source.as_ref(), config.uri_format()).with_mode(mode);

    let report = dispatcher.run(targets)?;

    if print {
        for path in &report.resolved {
            println!("{}", path.display());
        }
        for link in &report.links {
            println!("{}", link.url);
        }
    }

    if report.has_warnings() {
        Ok(ExitCode::from(EXIT_WARNING))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn install_context(config: &Config) -> Result<InstallContext> {
    let format = config.uri_format();
    InstallContext::current(format.scheme(), PROGRAM_TITLE)
        .context("Could not determine the path of this executable")
}

fn handle_config(action: ConfigAction, mut config: Config, config_path: &Path) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("Config file: {}", config_path.display());
            println!();
            println!("{}", format_config(&config));
        }
        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
        ConfigAction::AddFolder { namespace, path } => {
            let path = paths::absolute(&path)
                .with_context(|| format!("Invalid folder path: {}", path.display()))?;
            println!("✓ Pinned {} = {}", namespace, path.display());
            config.add_shared_folder(namespace, path);
            config
                .save_to(config_path)
                .with_context(|| format!("Failed to save {}", config_path.display()))?;
        }
        ConfigAction::ClearFolders => {
            config.clear_shared_folders();
            config
                .save_to(config_path)
                .with_context(|| format!("Failed to save {}", config_path.display()))?;
            println!("✓ Cleared pinned shared folders");
        }
    }
    Ok(())
}
