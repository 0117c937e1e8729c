//! Subscriber setup for the `dirsweep` binary.
//!
//! Console output always goes to stderr. With a log directory configured, two
//! more layers are added: `dirsweep.log` accumulates across runs and
//! `dirsweep.session.log` is truncated on every start.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

pub const PERSISTENT_LOG: &str = "dirsweep.log";
pub const SESSION_LOG: &str = "dirsweep.session.log";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Cannot open log file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Logging already initialized: {0}")]
    Init(#[from] TryInitError),
}

/// Keeps the background log writers alive. Dropping it flushes and stops them.
#[must_use = "dropping the guard stops file logging"]
#[derive(Debug, Default)]
pub struct LogGuard {
    _guards: Vec<WorkerGuard>,
}

/// Level filter used when `RUST_LOG` is not set.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

/// Installs the global subscriber.
///
/// `RUST_LOG` overrides the level chosen from `verbose`.
///
/// # Errors
///
/// Fails if the log directory or files cannot be created, or if a global
/// subscriber is already set.
pub fn init_logging(verbose: bool, log_dir: Option<&Path>) -> Result<LogGuard, LoggingError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let mut guards = Vec::new();
    let (persistent_layer, session_layer) = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir).map_err(|e| LoggingError::Io {
                path: dir.to_path_buf(),
                source: e,
            })?;

            let appender = tracing_appender::rolling::never(dir, PERSISTENT_LOG);
            let (persistent_writer, guard) = tracing_appender::non_blocking(appender);
            guards.push(guard);

            let session_path = dir.join(SESSION_LOG);
            let session_file = fs::File::create(&session_path).map_err(|e| LoggingError::Io {
                path: session_path,
                source: e,
            })?;
            let (session_writer, guard) = tracing_appender::non_blocking(session_file);
            guards.push(guard);

            (
                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(persistent_writer)
                        .with_ansi(false),
                ),
                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(session_writer)
                        .with_ansi(false),
                ),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(persistent_layer)
        .with(session_layer)
        .try_init()?;

    Ok(LogGuard { _guards: guards })
}
