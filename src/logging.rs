//! File logging
//!
//! The terminal belongs to the UI while the app runs, so tracing output is
//! written to a log file instead of stderr.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use directories::ProjectDirs;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
const DEFAULT_FILTER: &str = "metforecast=info";

/// Errors that can occur while setting up logging
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Could not open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A global subscriber was already installed
    #[error("Could not install log subscriber: {0}")]
    Init(String),
}

/// Returns the platform log location, e.g. `~/.local/share/metforecast/metforecast.log`
///
/// Falls back to the working directory when no home directory is known.
pub fn default_log_path() -> PathBuf {
    ProjectDirs::from("", "", "metforecast")
        .map(|dirs| dirs.data_local_dir().join("metforecast.log"))
        .unwrap_or_else(|| PathBuf::from("metforecast.log"))
}

/// Opens `path` for appending, creating missing parent directories
pub fn open_log_file(path: &Path) -> Result<File, LoggingError> {
    let open_err = |source| LoggingError::Open {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(open_err)?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(open_err)
}

/// Installs the global tracing subscriber writing to `path`
///
/// `RUST_LOG` overrides the default `metforecast=info` filter.
pub fn init(path: &Path) -> Result<(), LoggingError> {
    let file = open_log_file(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))
}
