//! Broker configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Environment variable naming the host to bind or connect to.
pub const ENV_HOST: &str = "SERVER_NAME";
/// Environment variable naming the TCP port.
pub const ENV_PORT: &str = "SERVER_PORT";
/// Environment variable for the grid height.
pub const ENV_ROWS: &str = "BOARD_ROWS";
/// Environment variable for the grid width.
pub const ENV_COLS: &str = "BOARD_COLS";
/// Environment variable for the log file directory.
pub const ENV_LOG_DIR: &str = "LOG_DIR";

/// Largest number of cells a grid may have.
pub const MAX_CELLS: usize = 10_000;

/// Configuration for one broker run.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
#[serde(default)]
pub struct BrokerConfig {
    /// Host to bind (broker) or connect to (player).
    host: String,

    /// TCP port.
    port: u16,

    /// Grid height.
    rows: usize,

    /// Grid width.
    cols: usize,

    /// Directory for the log file. Console only when unset.
    log_dir: Option<PathBuf>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            rows: 3,
            cols: 3,
            log_dir: None,
        }
    }
}

impl BrokerConfig {
    /// Loads configuration from TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(host = %config.host, port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Loads the file (or defaults), then applies the process environment.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_env(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an environment lookup and validates.
    #[instrument(skip(self, lookup))]
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(host) = lookup(ENV_HOST) {
            self.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.port = parse_var(ENV_PORT, &port)?;
        }
        if let Some(rows) = lookup(ENV_ROWS) {
            self.rows = parse_var(ENV_ROWS, &rows)?;
        }
        if let Some(cols) = lookup(ENV_COLS) {
            self.cols = parse_var(ENV_COLS, &cols)?;
        }
        if let Some(dir) = lookup(ENV_LOG_DIR) {
            self.log_dir = Some(PathBuf::from(dir));
        }
        self.validate()?;
        Ok(self)
    }

    /// Checks that the grid has at least one cell and at most [`MAX_CELLS`].
    #[instrument(skip(self))]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::new(format!(
                "Board must have at least one row and column, got {}x{}",
                self.rows, self.cols
            )));
        }
        match self.rows.checked_mul(self.cols) {
            Some(cells) if cells <= MAX_CELLS => Ok(()),
            _ => Err(ConfigError::new(format!(
                "Board {}x{} exceeds {} cells",
                self.rows, self.cols, MAX_CELLS
            ))),
        }
    }

    /// `host:port` address string.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[track_caller]
fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::new(format!("Invalid {}={:?}: {}", key, value, e)))
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
