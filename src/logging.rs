//! Structured logging and diagnostics for shareuri.
//!
//! The tool usually runs without a terminal (launched by the file browser or
//! the URL handler), so everything is also written to a log file at debug
//! level. Stderr output is opt-in through `-v`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use crate::config::APP_NAME;

const LOG_FILE: &str = "shareuri.log";

/// Rotated log files kept next to the current one.
const MAX_LOG_FILES: usize = 5;

/// Log verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// No stderr logging
    #[default]
    Quiet,
    /// Normal logging (info level)
    Normal,
    /// Verbose logging (debug level)
    Verbose,
    /// Very verbose logging (trace level)
    Trace,
}

impl Verbosity {
    /// Map a `-v` count to a verbosity.
    pub fn from_count(count: u8) -> Self {
        match count {
            0 => Verbosity::Quiet,
            1 => Verbosity::Normal,
            2 => Verbosity::Verbose,
            _ => Verbosity::Trace,
        }
    }

    /// Get the tracing level filter for this verbosity.
    pub fn as_level_filter(&self) -> LevelFilter {
        match self {
            Verbosity::Quiet => LevelFilter::ERROR,
            Verbosity::Normal => LevelFilter::INFO,
            Verbosity::Verbose => LevelFilter::DEBUG,
            Verbosity::Trace => LevelFilter::TRACE,
        }
    }
}

/// Configuration for the logging system.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Verbosity level for stderr output.
    pub verbosity: Verbosity,
    /// Optional path to log file.
    pub log_file: Option<PathBuf>,
}

/// Guard that must be kept alive for the duration of logging.
///
/// When this guard is dropped, the logging system will flush pending logs.
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

impl LogGuard {
    fn new(file_guard: Option<WorkerGuard>) -> Self {
        Self {
            _file_guard: file_guard,
        }
    }
}

/// `<data_local_dir>/shareuri/shareuri.log`
pub fn default_log_file() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join(APP_NAME).join(LOG_FILE))
}

/// Initialize the logging system.
///
/// Returns a guard that must be kept alive for the duration of logging.
/// When the guard is dropped, pending log entries will be flushed. The log
/// file rotates daily into `<name>.YYYY-MM-DD` and only the newest
/// `MAX_LOG_FILES` are kept. A log file that cannot be opened is skipped
/// rather than failing startup.
///
/// ```ignore
/// use shareuri::logging::{init_logging, LogConfig, Verbosity};
///
/// let config = LogConfig {
///     verbosity: Verbosity::Verbose,
///     log_file: Some("/tmp/shareuri.log".into()),
/// };
/// let _guard = init_logging(&config);
/// tracing::info!("Logging initialized");
/// ```
pub fn init_logging(config: &LogConfig) -> LogGuard {
    let file_appender = config.log_file.as_deref().and_then(open_log_file);

    // The registry-wide filter must let the file layer see debug events.
    let default_level = if file_appender.is_some() {
        config.verbosity.as_level_filter().max(LevelFilter::DEBUG)
    } else {
        config.verbosity.as_level_filter()
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let (file_layer, file_guard) = if let Some(file_appender) = file_appender {
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(non_blocking)
            .with_filter(LevelFilter::DEBUG);

        (Some(file_layer), Some(guard))
    } else {
        (None, None)
    };

    let stderr_layer = if config.verbosity != Verbosity::Quiet {
        Some(
            fmt::layer()
                .with_ansi(true)
                .with_target(false)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr)
                .with_filter(config.verbosity.as_level_filter()),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    LogGuard::new(file_guard)
}

/// Open a daily rolling appender for `path`.
fn open_log_file(path: &Path) -> Option<RollingFileAppender> {
    let (dir, filename) = prepare_log_file(path)?;
    match rolling_appender(&dir, &filename) {
        Ok(appender) => Some(appender),
        Err(e) => {
            eprintln!("Warning: cannot open log file in {:?}: {}", dir, e);
            None
        }
    }
}

fn rolling_appender(
    dir: &Path,
    filename: &str,
) -> Result<RollingFileAppender, tracing_appender::rolling::InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(filename)
        .max_log_files(MAX_LOG_FILES)
        .build(dir)
}

/// Split a log path into directory and file name, creating the directory.
fn prepare_log_file(path: &Path) -> Option<(PathBuf, String)> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let filename = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(LOG_FILE)
        .to_string();

    match fs::create_dir_all(&dir) {
        Ok(()) => Some((dir, filename)),
        Err(e) => {
            eprintln!("Warning: cannot create log directory {:?}: {}", dir, e);
            None
        }
    }
}
