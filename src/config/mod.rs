//! Configuration management for sns-tracker.
//!
//! Configuration is read from `~/.config/sns-tracker/config.toml` (or the
//! path given with `--config`). If the default file doesn't exist, one is
//! created with commented defaults. Environment variables override the
//! file and command-line flags override both.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::scraper::{RetryPolicy, ScraperConfig};
use crate::sheets::DEFAULT_SHEET_NAME;

/// Main configuration struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sheets: SheetsConfig,
    pub scraper: ScraperConfig,
    pub tracker: TrackerConfig,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sheets: SheetsConfig::default(),
            scraper: ScraperConfig::default(),
            tracker: TrackerConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

/// Where records are written
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
    /// Service-account JSON key
    pub credentials_path: PathBuf,
    /// Spreadsheet URL or bare id
    pub spreadsheet_url: Option<String>,
    /// Worksheet tab, created when missing
    pub sheet_name: String,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            credentials_path: PathBuf::from("gcp_credentials.json"),
            spreadsheet_url: None,
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
        }
    }
}

/// Pacing of the tracking pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Pause after each successfully processed URL, in milliseconds
    pub request_delay_ms: u64,
    /// Scrape attempts per URL
    pub max_retries: u32,
    /// First retry backoff in milliseconds, doubled per attempt
    pub backoff_base_ms: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: 2000,
            max_retries: 3,
            backoff_base_ms: 1000,
        }
    }
}

impl TrackerConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_backoff: Duration::from_millis(self.backoff_base_ms),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default location.
    ///
    /// A missing default file is created with comments and defaults are
    /// returned. An explicit path that doesn't exist is an error.
    /// Missing fields in the config file will use default values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default_path = Self::default_config_path()?;
                if !default_path.exists() {
                    Self::create_default_config(&default_path)?;
                    return Ok(Self::default());
                }
                default_path
            }
        };

        let content = fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path,
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/sns-tracker/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("sns-tracker").join("config.toml"))
    }

    /// Apply overrides from the process environment
    pub fn apply_process_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("GOOGLE_CREDENTIALS_PATH") {
            self.sheets.credentials_path = PathBuf::from(path);
        }
        if let Some(url) = lookup("SPREADSHEET_URL").filter(|u| !u.trim().is_empty()) {
            self.sheets.spreadsheet_url = Some(url);
        }
        if let Some(chrome) = lookup("CHROME_PATH").filter(|p| !p.trim().is_empty()) {
            self.scraper.chrome_executable = Some(PathBuf::from(chrome));
        }
        if let Some(headless) = lookup("HEADLESS_MODE") {
            self.scraper.headless = headless.trim().eq_ignore_ascii_case("true");
        }
        if let Some(delay) = lookup("REQUEST_DELAY") {
            self.tracker.request_delay_ms = parse_delay_secs(&delay)?;
        }
        if let Some(retries) = lookup("MAX_RETRIES") {
            self.tracker.max_retries = retries.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("MAX_RETRIES must be a whole number, got {:?}", retries))
            })?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = level.trim().to_lowercase();
        }
        Ok(())
    }

    /// Check that everything needed to reach the spreadsheet is present
    pub fn validate(&self) -> Result<(), ConfigError> {
        let has_spreadsheet = self
            .sheets
            .spreadsheet_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty());
        if !has_spreadsheet {
            return Err(ConfigError::Invalid(
                "No spreadsheet configured: set SPREADSHEET_URL, sheets.spreadsheet_url or --spreadsheet"
                    .to_string(),
            ));
        }

        if !self.sheets.credentials_path.exists() {
            return Err(ConfigError::Invalid(format!(
                "Google credentials file not found: {}",
                self.sheets.credentials_path.display()
            )));
        }

        Ok(())
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# sns-tracker configuration
#
# Environment variables override these values:
#   GOOGLE_CREDENTIALS_PATH, SPREADSHEET_URL, CHROME_PATH, HEADLESS_MODE,
#   REQUEST_DELAY (seconds), MAX_RETRIES, LOG_LEVEL
# Command-line flags override both.

# One of: debug, info, warn, error
log_level = "info"

[sheets]
# Google service-account JSON key
credentials_path = "gcp_credentials.json"

# Spreadsheet URL or id; must be shared with the service account
# spreadsheet_url = "https://docs.google.com/spreadsheets/d/<id>/edit"

# Worksheet tab name, created when missing
sheet_name = "SNS_Video_Data"

[scraper]
# Run browser in headless mode (no visible window)
headless = true

# Chrome/Chromium binary; auto-detected when unset
# chrome_executable = "/usr/bin/chromium"

# Wait for the page to finish loading, in seconds
page_load_timeout_secs = 10

# Wait for an awaited element to appear, in seconds
element_timeout_secs = 10

# Extra wait after load for dynamic content (milliseconds)
settle_delay_ms = 2000

# Browser window size
window_width = 1920
window_height = 1080

[tracker]
# Pause after each successfully processed video (milliseconds)
request_delay_ms = 2000

# Scrape attempts per video
max_retries = 3

# First retry backoff (milliseconds), doubled for every further attempt
backoff_base_ms = 1000
"##
        .to_string()
    }
}

/// Seconds as a float ("2", "0.5") to whole milliseconds
fn parse_delay_secs(value: &str) -> Result<u64, ConfigError> {
    let secs: f64 = value.trim().parse().map_err(|_| {
        ConfigError::Invalid(format!("REQUEST_DELAY must be a number of seconds, got {:?}", value))
    })?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(ConfigError::Invalid(format!(
            "REQUEST_DELAY must be a non-negative number of seconds, got {:?}",
            value
        )));
    }
    Ok((secs * 1000.0).round() as u64)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("{0}")]
    Invalid(String),
}
