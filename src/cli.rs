//! Command-line interface parsing for metforecast
//!
//! This module handles parsing of CLI arguments using clap, including the
//! DataPoint API key, the starting forecast resolution and where logs go.
//! Everything is validated before the terminal is switched to raw mode.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::data::datapoint::{DATAPOINT_BASE_URL, DEFAULT_TIMEOUT};
use crate::data::Resolution;
use crate::logging;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// No API key was given on the command line or in the environment
    #[error("A DataPoint API key is required: pass --api-key or set MET_OFFICE_API_KEY")]
    MissingApiKey,

    /// The specified resolution is not recognized
    #[error("Invalid resolution: '{0}'. Valid resolutions: daily, 3hourly")]
    InvalidResolution(String),
}

/// metforecast - Browse Met Office DataPoint site forecasts
#[derive(Parser, Debug)]
#[command(name = "metforecast")]
#[command(about = "Browse Met Office site forecasts in the terminal")]
#[command(version)]
pub struct Cli {
    /// DataPoint API key
    #[arg(long, env = "MET_OFFICE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// DataPoint base URL
    #[arg(long, env = "MET_OFFICE_BASE_URL", default_value = DATAPOINT_BASE_URL)]
    pub base_url: String,

    /// Forecast resolution to start with
    ///
    /// Valid resolutions: daily (day), 3hourly (three-hourly, 3h)
    #[arg(long, value_name = "RESOLUTION", default_value = "daily")]
    pub resolution: String,

    /// HTTP timeout in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout: u64,

    /// Log file path
    #[arg(long, env = "METFORECAST_LOG", value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub api_key: String,
    pub base_url: String,
    /// Resolution of the first location fetch
    pub resolution: Resolution,
    pub timeout: Duration,
    pub log_file: PathBuf,
}

/// Parses a resolution string argument into a Resolution.
///
/// # Arguments
/// * `s` - The resolution string from CLI
///
/// # Returns
/// * `Ok(Resolution)` if the string matches a known resolution
/// * `Err(CliError::InvalidResolution)` if the string doesn't match
pub fn parse_resolution_arg(s: &str) -> Result<Resolution, CliError> {
    Resolution::from_str(s).ok_or_else(|| CliError::InvalidResolution(s.to_string()))
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Arguments
    /// * `cli` - The parsed CLI struct
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with appropriate settings
    /// * `Err(CliError)` if the API key is missing or the resolution is invalid
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let api_key = cli
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(CliError::MissingApiKey)?
            .to_string();

        let resolution = parse_resolution_arg(&cli.resolution)?;

        let log_file = cli
            .log_file
            .clone()
            .unwrap_or_else(logging::default_log_path);

        Ok(StartupConfig {
            api_key,
            base_url: cli.base_url.clone(),
            resolution,
            timeout: Duration::from_secs(cli.timeout),
            log_file,
        })
    }
}
