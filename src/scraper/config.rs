use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the browser-backed scrapers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    /// Explicit Chrome/Chromium binary; auto-detected when unset
    pub chrome_executable: Option<PathBuf>,

    /// Cap on waiting for `document.readyState == "complete"` in seconds (default: 10)
    pub page_load_timeout_secs: u64,

    /// Cap on waiting for an awaited element to appear in seconds (default: 10)
    pub element_timeout_secs: u64,

    /// Fixed delay after the page reports ready, in milliseconds (default: 2000)
    pub settle_delay_ms: u64,

    /// Browser window width in pixels (default: 1920)
    pub window_width: u32,

    /// Browser window height in pixels (default: 1080)
    pub window_height: u32,

    /// User agent string to use
    pub user_agent: Option<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_executable: None,
            page_load_timeout_secs: 10,
            element_timeout_secs: 10,
            settle_delay_ms: 2000,
            window_width: 1920,
            window_height: 1080,
            user_agent: Some(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                    .to_string(),
            ),
        }
    }
}

impl ScraperConfig {
    /// Get the page load timeout as a Duration
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    /// Get the element wait timeout as a Duration
    pub fn element_timeout(&self) -> Duration {
        Duration::from_secs(self.element_timeout_secs)
    }

    /// Get the settle delay as a Duration
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Config with every wait disabled, for fixture pages that are ready immediately
    pub fn immediate() -> Self {
        Self {
            page_load_timeout_secs: 0,
            element_timeout_secs: 0,
            settle_delay_ms: 0,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = ScraperConfig::default();
        assert!(config.headless);
        assert!(config.chrome_executable.is_none());
        assert_eq!(config.page_load_timeout_secs, 10);
        assert_eq!(config.element_timeout_secs, 10);
        assert_eq!(config.settle_delay_ms, 2000);
        assert_eq!((config.window_width, config.window_height), (1920, 1080));
        assert!(config.user_agent.is_some());
    }

    #[test]
    fn test_durations() {
        let config = ScraperConfig::default();
        assert_eq!(config.page_load_timeout(), Duration::from_secs(10));
        assert_eq!(config.element_timeout(), Duration::from_secs(10));
        assert_eq!(config.settle_delay(), Duration::from_millis(2000));
    }

    #[test]
    fn test_immediate_config() {
        let config = ScraperConfig::immediate();
        assert_eq!(config.page_load_timeout(), Duration::ZERO);
        assert_eq!(config.settle_delay(), Duration::ZERO);
        // Inherits defaults for the rest
        assert!(config.headless);
    }

    #[test]
    fn test_partial_toml() {
        let config: ScraperConfig = toml::from_str("headless = false\nsettle_delay_ms = 500").unwrap();
        assert!(!config.headless);
        assert_eq!(config.settle_delay_ms, 500);
        assert_eq!(config.page_load_timeout_secs, 10);
    }
}
