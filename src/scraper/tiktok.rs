use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::{error, info, warn};

use crate::app::Result;
use crate::domain::{Platform, VideoRecord};
use crate::scraper::extractor::{
    contains_keyword, first_text, non_empty, present, wait_for_page_load, wait_for_text,
};
use crate::scraper::number::parse_count;
use crate::scraper::session::Session;
use crate::scraper::{match_id, PlatformScraper, ScraperConfig};

static ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"/video/(\d+)", r"@[^/]+/video/(\d+)", r"/v/(\d+)"]
        .iter()
        .map(|p| Regex::new(p).expect("valid TikTok id pattern"))
        .collect()
});

const AUTHOR_SELECTORS: &[&str] = &[
    "[data-e2e='browse-username']",
    "h2[data-e2e='browse-username']",
    ".author-uniqueId",
];

const TITLE_SELECTORS: &[&str] = &[
    "[data-e2e='browse-video-desc']",
    ".video-meta-caption",
    "div[data-e2e='video-desc']",
];

const LIKE_SELECTORS: &[&str] = &[
    "[data-e2e='like-count']",
    "[data-e2e='browse-like-count']",
    "strong[data-e2e='like-count']",
];

const COMMENT_SELECTORS: &[&str] = &[
    "[data-e2e='comment-count']",
    "[data-e2e='browse-comment-count']",
    "strong[data-e2e='comment-count']",
];

const SHARE_SELECTORS: &[&str] = &[
    "[data-e2e='share-count']",
    "[data-e2e='browse-share-count']",
    "strong[data-e2e='share-count']",
];

const VIEW_SELECTORS: &[&str] = &[
    "[data-e2e='video-views']",
    "strong[data-e2e='video-views']",
    ".video-count",
];
const VIEW_KEYWORDS: &[&str] = &["view", "回視聴", "조회"];

/// Scraper for TikTok video pages
pub struct TikTokScraper {
    config: ScraperConfig,
}

impl TikTokScraper {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }

    async fn author(&self, session: &dyn Session) -> Option<String> {
        for selector in AUTHOR_SELECTORS {
            if let Some(text) = wait_for_text(session, selector, self.config.element_timeout()).await {
                return Some(text.trim().replace('@', ""));
            }
        }
        None
    }

    async fn count(&self, session: &dyn Session, selectors: &[&str]) -> Option<u64> {
        first_text(session, selectors, non_empty)
            .await
            .map(|text| parse_count(&text))
    }
}

#[async_trait]
impl PlatformScraper for TikTokScraper {
    fn platform(&self) -> Platform {
        Platform::TikTok
    }

    fn extract_id(&self, url: &str) -> String {
        match_id(&ID_PATTERNS, url)
    }

    async fn scrape(&self, session: &mut dyn Session, url: &str) -> Result<VideoRecord> {
        info!("Scraping TikTok video: {}", url);

        if let Err(e) = session.goto(url).await {
            error!("Failed to scrape TikTok video {}: {}", url, e);
            return Err(e);
        }
        let session: &dyn Session = session;
        wait_for_page_load(session, self.config.page_load_timeout(), self.config.settle_delay()).await;

        let mut video = VideoRecord::new(Platform::TikTok, url, self.extract_id(url));

        match self.author(session).await {
            Some(author) => video.author = author,
            None => warn!("Could not find author information"),
        }

        match first_text(session, TITLE_SELECTORS, present).await {
            Some(title) => video.set_title(&title),
            None => warn!("Could not find title/description"),
        }

        match self.count(session, LIKE_SELECTORS).await {
            Some(likes) => video.like_count = likes,
            None => warn!("Could not extract like count"),
        }

        match self.count(session, COMMENT_SELECTORS).await {
            Some(comments) => video.comment_count = comments,
            None => warn!("Could not extract comment count"),
        }

        match self.count(session, SHARE_SELECTORS).await {
            Some(shares) => video.share_count = shares,
            None => warn!("Could not extract share count"),
        }

        let views = first_text(session, VIEW_SELECTORS, |t| {
            non_empty(t) && contains_keyword(t, VIEW_KEYWORDS)
        })
        .await;
        match views {
            Some(views) => video.view_count = parse_count(&views),
            None => warn!("Could not extract view count"),
        }

        info!("Successfully scraped TikTok video data: {}", video.video_id);
        Ok(video)
    }
}
