//! Logging infrastructure for recap.
//!
//! Structured file logging with daily rotation to platform-standard
//! directories. The console is reserved for prompts and job output, so
//! diagnostics go to files only. Filtering is controlled by `RECAP_LOG`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use directories::ProjectDirs;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Log files older than this many days are removed on startup.
const RETENTION_DAYS: u64 = 7;

/// Result of initializing the logging system.
pub struct LoggingContext {
    /// Guard that must be held for the application lifetime to ensure logs are flushed.
    pub _guard: WorkerGuard,
    /// The session ID for this invocation.
    pub session_id: String,
    /// The directory where logs are written.
    pub log_directory: PathBuf,
}

/// Error that occurred during logging initialization.
#[derive(Debug)]
pub struct LoggingError {
    pub message: String,
}

impl std::fmt::Display for LoggingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Generates a 6-character random hex session ID.
fn generate_session_id() -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    let bytes: [u8; 3] = rng.random();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Pick the platform log directory.
///
/// macOS: ~/Library/Logs/recap/
/// Linux: ~/.local/state/recap/
/// Windows: %LocalAppData%\recap\
fn resolve_log_dir(project_dirs: &ProjectDirs) -> Option<PathBuf> {
    if cfg!(target_os = "macos") {
        dirs::home_dir().map(|home| home.join("Library").join("Logs").join("recap"))
    } else {
        project_dirs
            .state_dir()
            .map(PathBuf::from)
            .or_else(|| Some(project_dirs.cache_dir().to_path_buf()))
    }
}

/// Initializes the logging system.
///
/// Returns a `LoggingContext` on success, or a `LoggingError` on failure.
/// The returned `WorkerGuard` must be held for the application lifetime.
pub fn init() -> Result<LoggingContext, LoggingError> {
    let session_id = generate_session_id();

    let project_dirs = ProjectDirs::from("dev", "recap", "recap").ok_or_else(|| LoggingError {
        message: "Failed to determine platform directories".to_string(),
    })?;

    let log_dir = resolve_log_dir(&project_dirs).ok_or_else(|| LoggingError {
        message: "Failed to determine log directory".to_string(),
    })?;

    fs::create_dir_all(&log_dir).map_err(|e| LoggingError {
        message: format!("Failed to create log directory: {}", e),
    })?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "recap");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_env("RECAP_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    info!(session_id = %session_id, "session_start");

    Ok(LoggingContext {
        _guard: guard,
        session_id,
        log_directory: log_dir,
    })
}

/// Cleans up log files older than the retention period.
///
/// Scans the log directory for `recap.*` files and deletes the stale ones.
/// Errors are logged at WARN level but don't prevent startup.
pub fn cleanup_old_logs(log_dir: &Path) {
    let retention = Duration::from_secs(RETENTION_DAYS * 24 * 60 * 60);

    let entries = match fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "Failed to read log directory for cleanup");
            return;
        }
    };

    let now = SystemTime::now();
    let mut deleted_count = 0u32;

    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !file_name.starts_with("recap.") {
            continue;
        }

        let age = fs::metadata(&path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok());
        let Some(age) = age else {
            // Unreadable metadata or a file dated in the future, skip
            continue;
        };

        if age > retention {
            match fs::remove_file(&path) {
                Ok(()) => {
                    debug!(file = %file_name, age_days = age.as_secs() / 86400, "Deleted old log file");
                    deleted_count += 1;
                }
                Err(e) => {
                    warn!(file = %file_name, error = %e, "Failed to delete old log file");
                }
            }
        }
    }

    if deleted_count > 0 {
        debug!(count = deleted_count, "Log cleanup completed");
    }
}
