use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::{error, info, warn};

use crate::app::Result;
use crate::domain::{Platform, VideoRecord};
use crate::scraper::extractor::{
    first_text, keyword_count, non_empty, present, wait_for_page_load, wait_for_text,
};
use crate::scraper::number::parse_count;
use crate::scraper::session::Session;
use crate::scraper::{match_id, PlatformScraper, ScraperConfig};

static ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"/p/([A-Za-z0-9_-]+)",
        r"/reel/([A-Za-z0-9_-]+)",
        r"/tv/([A-Za-z0-9_-]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid Instagram id pattern"))
    .collect()
});

const AUTHOR_SELECTOR: &str = "header a";
const CAPTION_SELECTOR: &str = "article div[data-testid='post-caption'] span";
const UPLOAD_TIME_SELECTOR: &str = "time";

const LIKE_SELECTORS: &[&str] = &[
    "section button span",
    "article section span",
    "[data-testid='like-count']",
];
const LIKE_KEYWORDS: &[&str] = &["like", "いいね", "좋아요"];

const VIEW_SELECTORS: &[&str] = &[
    "span[title*='view']",
    "span[title*='再生']",
    "div[data-testid='video-view-count']",
];

const COMMENT_SELECTORS: &[&str] = &["section button span", "[data-testid='comment-count']"];
const COMMENT_KEYWORDS: &[&str] = &["comment", "コメント", "댓글"];

/// Scraper for Instagram posts, reels and IGTV pages
pub struct InstagramScraper {
    config: ScraperConfig,
}

impl InstagramScraper {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }

    /// View counts live in a `title` attribute on most layouts, in the text on others
    async fn view_count(&self, session: &dyn Session) -> Option<u64> {
        for selector in VIEW_SELECTORS {
            let title = session.attribute(selector, "title").await;
            let text = match title.filter(|t| !t.trim().is_empty()) {
                Some(title) => Some(title),
                None => session.text(selector).await,
            };
            if let Some(text) = text.filter(|t| !t.trim().is_empty()) {
                return Some(parse_count(&text));
            }
        }
        None
    }

    async fn upload_date(&self, session: &dyn Session) -> Option<String> {
        let datetime = session.attribute(UPLOAD_TIME_SELECTOR, "datetime").await;
        if let Some(datetime) = datetime.filter(|d| !d.trim().is_empty()) {
            return Some(datetime);
        }
        session.text(UPLOAD_TIME_SELECTOR).await
    }
}

#[async_trait]
impl PlatformScraper for InstagramScraper {
    fn platform(&self) -> Platform {
        Platform::Instagram
    }

    fn extract_id(&self, url: &str) -> String {
        match_id(&ID_PATTERNS, url)
    }

    async fn scrape(&self, session: &mut dyn Session, url: &str) -> Result<VideoRecord> {
        info!("Scraping Instagram video: {}", url);

        if let Err(e) = session.goto(url).await {
            error!("Failed to scrape Instagram video {}: {}", url, e);
            return Err(e);
        }
        let session: &dyn Session = session;
        wait_for_page_load(session, self.config.page_load_timeout(), self.config.settle_delay()).await;

        let mut video = VideoRecord::new(Platform::Instagram, url, self.extract_id(url));

        match wait_for_text(session, AUTHOR_SELECTOR, self.config.element_timeout()).await {
            Some(author) => video.author = author.trim().to_string(),
            None => warn!("Could not find author information"),
        }

        match first_text(session, &[CAPTION_SELECTOR], present).await {
            Some(caption) => video.set_title(&caption),
            None => warn!("Could not find caption/title"),
        }

        match keyword_count(session, LIKE_SELECTORS, LIKE_KEYWORDS).await {
            Some(likes) => video.like_count = likes,
            None => warn!("Could not extract like count"),
        }

        match self.view_count(session).await {
            Some(views) => video.view_count = views,
            None => warn!("Could not extract view count"),
        }

        match keyword_count(session, COMMENT_SELECTORS, COMMENT_KEYWORDS).await {
            Some(comments) => video.comment_count = comments,
            None => warn!("Could not extract comment count"),
        }

        match self.upload_date(session).await.filter(|d| non_empty(d.trim())) {
            Some(date) => video.upload_date = date.trim().to_string(),
            None => warn!("Could not find upload date"),
        }

        info!("Successfully scraped Instagram video data: {}", video.video_id);
        Ok(video)
    }
}
