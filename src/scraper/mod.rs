//! Browser-based metric extraction for social video pages.
//!
//! # Architecture
//!
//! ```text
//! URL → PlatformRouter → PlatformScraper ─┐
//!                                         ├→ RetryDriver → VideoRecord
//! SessionFactory → SessionScope ──────────┘
//! ```
//!
//! Each platform scraper only knows how to read one page through a
//! [`Session`]; retries, backoff and browser lifecycle live in
//! [`RetryDriver`] and [`SessionScope`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use sns_tracker::scraper::{ChromeLauncher, PlatformRouter, RetryDriver, RetryPolicy, ScraperConfig, SessionScope};
//!
//! let config = ScraperConfig::default();
//! let launcher = ChromeLauncher::new(config.clone());
//! let router = PlatformRouter::new(config);
//!
//! let platform = router.route(url).ok_or(...)?;
//! let scraper = router.scraper_for(platform);
//!
//! let mut scope = SessionScope::new(&launcher);
//! let record = RetryDriver::new(RetryPolicy::default())
//!     .scrape_with_retry(&mut scope, scraper.as_ref(), url)
//!     .await;
//! scope.close().await;
//! ```

mod chrome;
mod config;
mod extractor;
mod instagram;
pub mod number;
mod retry;
mod router;
mod session;
mod tiktok;

#[cfg(test)]
pub(crate) mod fixture;

pub use chrome::{ChromeLauncher, ChromeSession};
pub use config::ScraperConfig;
pub use instagram::InstagramScraper;
pub use number::parse_count;
pub use retry::{RetryDriver, RetryPolicy};
pub use router::PlatformRouter;
pub use session::{Session, SessionFactory, SessionScope};
pub use tiktok::TikTokScraper;

use async_trait::async_trait;
use regex::Regex;

use crate::app::Result;
use crate::domain::{Platform, VideoRecord};

/// Capability shared by the per-platform scrapers
#[async_trait]
pub trait PlatformScraper: Send + Sync {
    /// Platform whose pages this scraper understands
    fn platform(&self) -> Platform;

    /// Video id from the URL path, or an empty string when no pattern matches
    fn extract_id(&self, url: &str) -> String;

    /// Load `url` in `session` and extract a record.
    ///
    /// Fields that cannot be found keep their defaults; only a failed
    /// navigation is an error.
    async fn scrape(&self, session: &mut dyn Session, url: &str) -> Result<VideoRecord>;
}

/// First capture group of the first pattern matching `url`
fn match_id(patterns: &[Regex], url: &str) -> String {
    patterns
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}
