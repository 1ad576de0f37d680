//! # sns-tracker
//!
//! Scrapes public metrics of Instagram and TikTok videos with a headless
//! Chromium browser and records them in a Google Sheets worksheet.
//!
//! ## Architecture
//!
//! ```text
//! URL → PlatformRouter → RetryDriver(PlatformScraper) → SpreadsheetSink → Worksheet
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! # Write the header row
//! sns-tracker init -c gcp_credentials.json -s <spreadsheet-url>
//!
//! # Track one video
//! sns-tracker track --url https://www.tiktok.com/@user/video/1234567890
//!
//! # Refresh every video listed in a file
//! sns-tracker update --file urls.txt
//!
//! # Refresh them every morning
//! sns-tracker schedule --file urls.txt --daily-at 09:00
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together all components:
/// worksheet, browser launcher, router, retry driver.
pub mod app;

/// Command-line interface using clap.
///
/// - `init` - Write the header row
/// - `track` - Append newly scraped videos
/// - `update` - Refresh metrics of tracked videos
/// - `schedule` - Periodic update passes
pub mod cli;

/// Configuration file, environment overrides and validation.
pub mod config;

/// Core domain models.
///
/// - [`Platform`](domain::Platform): supported video platforms
/// - [`VideoRecord`](domain::VideoRecord): one scraped metrics snapshot
pub mod domain;

/// Periodic update loop.
pub mod scheduler;

/// Browser-driven scraping of video pages.
///
/// Uses headless Chrome via chromiumoxide behind the
/// [`Session`](scraper::Session) trait.
///
/// - [`PlatformScraper`](scraper::PlatformScraper): per-platform extraction
/// - [`RetryDriver`](scraper::RetryDriver): bounded retries with backoff
/// - [`PlatformRouter`](scraper::PlatformRouter): URL to platform
/// - [`parse_count`](scraper::parse_count): "1.2K" style counts
pub mod scraper;

/// Spreadsheet persistence.
///
/// - [`SpreadsheetSink`](sheets::SpreadsheetSink): row schema and upserts
/// - [`GoogleWorksheet`](sheets::GoogleWorksheet): Sheets API v4 transport
pub mod sheets;

/// The scrape-extract-persist pipeline.
pub mod tracker;
