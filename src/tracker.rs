//! Scrape-extract-persist pipeline over one URL, a batch, or an update pass.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::app::{Result, TrackerError};
use crate::domain::VideoRecord;
use crate::scraper::{PlatformRouter, RetryDriver, SessionFactory, SessionScope};
use crate::sheets::{SpreadsheetSink, Worksheet};

/// What an update pass did with one URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// An existing row had its metrics overwritten
    Updated,
    /// No row matched, so the full record was appended
    Appended,
}

/// Result of processing a list of URLs
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<VideoRecord>,
    pub failed: Vec<String>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Drives URLs through router, retrying scraper and spreadsheet sink.
///
/// URLs are handled one at a time with a single live browser; each URL
/// gets its own session that is closed before the next one starts.
pub struct VideoTracker {
    sink: SpreadsheetSink,
    sessions: Arc<dyn SessionFactory>,
    router: PlatformRouter,
    retry: RetryDriver,
    request_delay: Duration,
}

impl VideoTracker {
    pub fn new(
        sink: SpreadsheetSink,
        sessions: Arc<dyn SessionFactory>,
        router: PlatformRouter,
        retry: RetryDriver,
        request_delay: Duration,
    ) -> Self {
        Self {
            sink,
            sessions,
            router,
            retry,
            request_delay,
        }
    }

    pub fn sink(&self) -> &SpreadsheetSink {
        &self.sink
    }

    /// Write the header row, clearing the worksheet if it holds anything else
    pub async fn initialize(&self) -> Result<()> {
        self.sink.initialize_headers().await.inspect_err(|e| {
            error!("Failed to initialize spreadsheet: {}", e);
        })?;
        info!(
            "Spreadsheet initialized with sheet: {}",
            self.sink.worksheet().title()
        );
        Ok(())
    }

    /// Scrape `url` without persisting anything
    pub async fn scrape(&self, url: &str) -> Result<VideoRecord> {
        let platform = self
            .router
            .route(url)
            .ok_or_else(|| TrackerError::UnsupportedPlatform(url.to_string()))?;
        let scraper = self.router.scraper_for(platform);

        let mut scope = SessionScope::new(self.sessions.as_ref());
        let result = self
            .retry
            .scrape_with_retry(&mut scope, scraper.as_ref(), url)
            .await;
        scope.close().await;

        let video = result?;
        if video.video_id.is_empty() {
            warn!("Could not extract a video id from {}", url);
        }
        Ok(video)
    }

    /// Scrape `url` and append it as a new row
    pub async fn track_single(&self, url: &str) -> Result<VideoRecord> {
        let result = async {
            let video = self.scrape(url).await?;
            self.sink.append(&video).await?;
            Ok(video)
        }
        .await;

        match result {
            Ok(video) => {
                info!("Successfully tracked video: {}", url);
                Ok(video)
            }
            Err(e) => {
                error!("Failed to track video {}: {}", url, e);
                Err(e)
            }
        }
    }

    /// Track every URL in order.
    ///
    /// Unsupported and unscrapable URLs are logged and skipped; a sink
    /// failure aborts the batch.
    pub async fn track_many(&self, urls: &[String]) -> Result<BatchReport> {
        let mut report = BatchReport::default();

        for url in urls {
            let video = match self.scrape(url).await {
                Ok(video) => video,
                Err(e) => {
                    error!("Failed to track video {}: {}", url, e);
                    report.failed.push(url.clone());
                    continue;
                }
            };

            self.sink.append(&video).await?;
            info!("Successfully tracked video: {}", url);
            report.succeeded.push(video);
            self.pause().await;
        }

        if !report.failed.is_empty() {
            warn!(
                "Failed to track {} videos: {:?}",
                report.failed.len(),
                report.failed
            );
        }
        info!(
            "Successfully tracked {} out of {} videos",
            report.succeeded.len(),
            urls.len()
        );
        Ok(report)
    }

    /// Refresh one URL: overwrite its metrics when a row exists, append otherwise
    pub async fn update_single(&self, url: &str) -> Result<(VideoRecord, UpdateOutcome)> {
        let video = self.scrape(url).await?;
        let outcome = self.persist_update(&video).await?;
        Ok((video, outcome))
    }

    /// [`update_single`](Self::update_single) over every URL.
    ///
    /// URLs that cannot be scraped are logged and skipped; any failure to
    /// write the spreadsheet aborts the pass.
    pub async fn update_existing(&self, urls: &[String]) -> Result<BatchReport> {
        let mut report = BatchReport::default();

        for url in urls {
            let video = match self.scrape(url).await {
                Ok(video) => video,
                Err(TrackerError::UnsupportedPlatform(_)) => {
                    warn!("Unsupported platform for URL: {}", url);
                    report.failed.push(url.clone());
                    continue;
                }
                Err(e) => {
                    error!("Failed to update video {}: {}", url, e);
                    report.failed.push(url.clone());
                    continue;
                }
            };

            self.persist_update(&video).await.inspect_err(|e| {
                error!("Failed to update video {}: {}", url, e);
            })?;
            report.succeeded.push(video);
            self.pause().await;
        }

        info!(
            "Successfully processed {} videos for updates",
            report.succeeded.len()
        );
        Ok(report)
    }

    async fn persist_update(&self, video: &VideoRecord) -> Result<UpdateOutcome> {
        let url = &video.video_url;
        if self.sink.update_metrics(url, &video.metrics()).await? {
            info!("Updated existing video data for: {}", url);
            return Ok(UpdateOutcome::Updated);
        }

        self.sink.append(video).await?;
        info!("Added new video data for: {}", url);
        Ok(UpdateOutcome::Appended)
    }

    async fn pause(&self) {
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::{assert_err, assert_ok};

    use async_trait::async_trait;

    use super::*;
    use crate::domain::Platform;
    use crate::scraper::fixture::HtmlBrowser;
    use crate::scraper::{RetryPolicy, ScraperConfig};
    use crate::sheets::{CellUpdate, CellValue, Column, MemoryWorksheet};

    const TIKTOK_URL: &str = "https://www.tiktok.com/@dancer/video/7300000000000000001";
    const INSTAGRAM_URL: &str = "https://www.instagram.com/reel/Cx1Yz2AbCdE/";
    const TIKTOK_PAGE: &str = r#"
        <html><body>
          <h2 data-e2e="browse-username">@dancer</h2>
          <div data-e2e="browse-video-desc">Morning routine</div>
          <strong data-e2e="like-count">2.5K</strong>
          <strong data-e2e="comment-count">40</strong>
          <strong data-e2e="share-count">12</strong>
          <strong data-e2e="video-views">90,000 views</strong>
        </body></html>
    "#;

    /// Worksheet whose every call fails with an I/O error
    struct UnreachableSheet;

    #[async_trait]
    impl Worksheet for UnreachableSheet {
        fn title(&self) -> &str {
            "SNS_Video_Data"
        }

        async fn header_row(&self) -> Result<Vec<String>> {
            Err(unreachable_sheet())
        }

        async fn clear(&self) -> Result<()> {
            Err(unreachable_sheet())
        }

        async fn append_rows(&self, _rows: &[Vec<CellValue>]) -> Result<()> {
            Err(unreachable_sheet())
        }

        async fn all_rows(&self) -> Result<Vec<Vec<String>>> {
            Err(unreachable_sheet())
        }

        async fn update_cells(&self, _updates: &[CellUpdate]) -> Result<()> {
            Err(unreachable_sheet())
        }
    }

    fn unreachable_sheet() -> TrackerError {
        std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset").into()
    }

    struct Harness {
        browser: Arc<HtmlBrowser>,
        sheet: Arc<MemoryWorksheet>,
        tracker: VideoTracker,
    }

    fn harness(pages: Vec<(&str, &str)>) -> Harness {
        let browser = Arc::new(HtmlBrowser::new(pages));
        let sheet = Arc::new(MemoryWorksheet::new("SNS_Video_Data"));
        let tracker = VideoTracker::new(
            SpreadsheetSink::new(sheet.clone()),
            browser.clone(),
            PlatformRouter::new(ScraperConfig::immediate()),
            RetryDriver::new(RetryPolicy {
                max_retries: 2,
                base_backoff: Duration::ZERO,
            }),
            Duration::ZERO,
        );
        Harness {
            browser,
            sheet,
            tracker,
        }
    }

    #[tokio::test]
    async fn test_track_single_appends_row() {
        let h = harness(vec![(TIKTOK_URL, TIKTOK_PAGE)]);
        h.tracker.initialize().await.unwrap();

        let video = h.tracker.track_single(TIKTOK_URL).await.unwrap();

        assert_eq!(video.author, "dancer");
        assert_eq!(video.like_count, 2500);
        assert_eq!(video.view_count, 90_000);
        let rows = h.sheet.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][2], TIKTOK_URL);
        assert_eq!(rows[1][3], "7300000000000000001");
        assert_eq!(h.browser.opened(), 1);
        assert_eq!(h.browser.closed(), 1);
    }

    #[tokio::test]
    async fn test_blank_page_yields_defaults() {
        let h = harness(vec![(INSTAGRAM_URL, "<html><body></body></html>")]);

        let video = h.tracker.track_single(INSTAGRAM_URL).await.unwrap();

        assert_eq!(video.platform, Platform::Instagram);
        assert_eq!(video.video_id, "Cx1Yz2AbCdE");
        assert_eq!(video.title, "");
        assert_eq!(video.author, "");
        assert_eq!(
            (video.view_count, video.like_count, video.comment_count, video.share_count),
            (0, 0, 0, 0)
        );
        assert_eq!(video.upload_date, "");
    }

    #[tokio::test]
    async fn test_unsupported_url_is_rejected_without_browser() {
        let h = harness(vec![]);
        let result = h.tracker.track_single("https://youtube.com/watch?v=1").await;

        assert!(matches!(result, Err(TrackerError::UnsupportedPlatform(_))));
        assert_eq!(h.browser.opened(), 0);
        assert!(h.sheet.rows().is_empty());
    }

    #[tokio::test]
    async fn test_failed_scrape_closes_every_session() {
        let h = harness(vec![]);
        let result = h.tracker.track_single(TIKTOK_URL).await;

        assert_err!(result);
        assert_eq!(h.browser.opened(), 2);
        assert_eq!(h.browser.closed(), 2);
    }

    #[tokio::test]
    async fn test_track_many_skips_failures() {
        let h = harness(vec![(TIKTOK_URL, TIKTOK_PAGE)]);
        let urls = vec![
            TIKTOK_URL.to_string(),
            "https://example.com/video/1".to_string(),
            "https://www.tiktok.com/@ghost/video/1".to_string(),
        ];

        let report = assert_ok!(h.tracker.track_many(&urls).await);

        assert_eq!(report.succeeded.len(), 1);
        assert_eq!(report.total(), 3);
        assert_eq!(report.failed, urls[1..].to_vec());
        assert_eq!(h.sheet.rows().len(), 1);
    }

    #[tokio::test]
    async fn test_update_overwrites_existing_row() {
        let h = harness(vec![(TIKTOK_URL, TIKTOK_PAGE)]);
        h.tracker.initialize().await.unwrap();

        let mut stale = VideoRecord::new(Platform::TikTok, TIKTOK_URL, "7300000000000000001");
        stale.author = "old-name".into();
        stale.view_count = 1;
        h.tracker.sink().append(&stale).await.unwrap();

        let (_, outcome) = h.tracker.update_single(TIKTOK_URL).await.unwrap();

        assert_eq!(outcome, UpdateOutcome::Updated);
        let rows = h.sheet.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][5], "90000");
        assert_eq!(rows[1][6], "2500");
        // only metrics are refreshed
        assert_eq!(rows[1][9], "old-name");
    }

    #[tokio::test]
    async fn test_update_appends_unknown_video() {
        let h = harness(vec![(TIKTOK_URL, TIKTOK_PAGE)]);
        h.tracker.initialize().await.unwrap();

        let report = h
            .tracker
            .update_existing(&[TIKTOK_URL.to_string(), "https://example.com/x".to_string()])
            .await
            .unwrap();

        assert_eq!(report.succeeded.len(), 1);
        assert_eq!(report.failed.len(), 1);
        let rows = h.sheet.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][9], "dancer");
    }

    #[tokio::test]
    async fn test_update_aborts_on_sink_failure() {
        let h = harness(vec![(TIKTOK_URL, TIKTOK_PAGE)]);
        // a header row without the metric columns
        h.sheet
            .append_rows(&[vec![Column::VideoUrl.header().into()], vec![TIKTOK_URL.into()]])
            .await
            .unwrap();

        let result = h.tracker.update_existing(&[TIKTOK_URL.to_string()]).await;

        assert!(matches!(result, Err(TrackerError::Sheets(_))));
    }

    #[tokio::test]
    async fn test_update_aborts_on_any_write_failure() {
        let browser = Arc::new(HtmlBrowser::new(vec![(TIKTOK_URL, TIKTOK_PAGE)]));
        let tracker = VideoTracker::new(
            SpreadsheetSink::new(Arc::new(UnreachableSheet)),
            browser.clone(),
            PlatformRouter::new(ScraperConfig::immediate()),
            RetryDriver::new(RetryPolicy {
                max_retries: 2,
                base_backoff: Duration::ZERO,
            }),
            Duration::ZERO,
        );
        let urls = vec![TIKTOK_URL.to_string(), TIKTOK_URL.to_string()];

        let result = tracker.update_existing(&urls).await;

        assert!(matches!(result, Err(TrackerError::Io(_))));
        // the second URL is never scraped
        assert_eq!(browser.opened(), 1);
    }
}
