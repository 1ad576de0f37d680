use std::time::Duration;

use tracing::{error, warn};

use crate::app::{Result, TrackerError};
use crate::domain::VideoRecord;
use crate::scraper::session::SessionScope;
use crate::scraper::PlatformScraper;

/// Bounded retry schedule: `max_retries` attempts, sleeping
/// `base_backoff * 2^attempt` between them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay after the failed attempt `attempt` (0-indexed)
    pub fn backoff(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_backoff.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }
}

/// Runs a scraper against a session scope until it succeeds or the policy
/// is exhausted. Every failed attempt discards the scope's session so the
/// next attempt starts on a fresh browser.
pub struct RetryDriver {
    policy: RetryPolicy,
}

impl RetryDriver {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub async fn scrape_with_retry(
        &self,
        scope: &mut SessionScope<'_>,
        scraper: &dyn PlatformScraper,
        url: &str,
    ) -> Result<VideoRecord> {
        let mut last_error: Option<TrackerError> = None;

        for attempt in 0..self.policy.max_retries {
            let result = match scope.live().await {
                Ok(session) => scraper.scrape(session, url).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(video) => return Ok(video),
                Err(e) => {
                    warn!(
                        url,
                        attempt = attempt + 1,
                        "Scraping attempt failed: {}",
                        e
                    );
                    last_error = Some(e);
                    scope.discard().await;

                    if attempt + 1 < self.policy.max_retries {
                        tokio::time::sleep(self.policy.backoff(attempt)).await;
                    }
                }
            }
        }

        error!("All scraping attempts failed for {}", url);
        Err(last_error.unwrap_or_else(|| TrackerError::RetryExhausted {
            url: url.to_string(),
            attempts: self.policy.max_retries,
        }))
    }
}
