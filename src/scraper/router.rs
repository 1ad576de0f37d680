use crate::domain::Platform;
use crate::scraper::{InstagramScraper, PlatformScraper, ScraperConfig, TikTokScraper};

/// Maps video URLs to the scraper for their platform.
///
/// Matching is a plain substring test on the whole URL, Instagram first.
pub struct PlatformRouter {
    config: ScraperConfig,
}

impl PlatformRouter {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }

    pub fn route(&self, url: &str) -> Option<Platform> {
        detect_platform(url)
    }

    pub fn scraper_for(&self, platform: Platform) -> Box<dyn PlatformScraper> {
        match platform {
            Platform::Instagram => Box::new(InstagramScraper::new(self.config.clone())),
            Platform::TikTok => Box::new(TikTokScraper::new(self.config.clone())),
        }
    }
}

pub fn detect_platform(url: &str) -> Option<Platform> {
    if url.contains("instagram.com") {
        Some(Platform::Instagram)
    } else if url.contains("tiktok.com") {
        Some(Platform::TikTok)
    } else {
        None
    }
}
