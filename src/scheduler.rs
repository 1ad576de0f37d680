//! Periodic update passes over a fixed list of video URLs.
//!
//! Runs in the foreground until the shutdown future resolves (Ctrl-C from
//! the CLI). A failed pass is logged and the loop keeps going.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDateTime, NaiveTime, TimeZone};
use tracing::{error, info, warn};

use crate::tracker::{BatchReport, VideoTracker};

/// When update passes run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Every day at this local wall-clock time
    Daily(NaiveTime),
    /// Fixed interval, the first pass one interval after start
    Every(Duration),
}

impl Schedule {
    pub fn hourly() -> Self {
        Schedule::Every(Duration::from_secs(3600))
    }

    /// Parse interval string like "1h", "30m", "45s", "1d" or bare seconds
    pub fn parse_interval(s: &str) -> Result<Duration, String> {
        let s = s.trim().to_lowercase();

        let secs = if let Some(hours) = s.strip_suffix('h') {
            hours
                .parse::<u64>()
                .map(|h| h * 3600)
                .map_err(|_| format!("Invalid hours: {}", hours))?
        } else if let Some(minutes) = s.strip_suffix('m') {
            minutes
                .parse::<u64>()
                .map(|m| m * 60)
                .map_err(|_| format!("Invalid minutes: {}", minutes))?
        } else if let Some(days) = s.strip_suffix('d') {
            days.parse::<u64>()
                .map(|d| d * 86400)
                .map_err(|_| format!("Invalid days: {}", days))?
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.parse::<u64>()
                .map_err(|_| format!("Invalid seconds: {}", secs))?
        } else {
            s.parse::<u64>().map_err(|_| {
                format!("Invalid interval: {}. Use format like '1h', '30m', '1d'", s)
            })?
        };

        if secs == 0 {
            return Err("Interval must be greater than zero".to_string());
        }
        Ok(Duration::from_secs(secs))
    }

    /// Parse a daily run time in 24h "HH:MM" form
    pub fn parse_time(s: &str) -> Result<NaiveTime, String> {
        NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .map_err(|_| format!("Invalid time: {}. Use HH:MM, e.g. 09:00", s))
    }

    /// Format interval for display
    pub fn format_interval(interval: Duration) -> String {
        let secs = interval.as_secs();
        if secs >= 86400 && secs.is_multiple_of(86400) {
            format!("{}d", secs / 86400)
        } else if secs >= 3600 && secs.is_multiple_of(3600) {
            format!("{}h", secs / 3600)
        } else if secs >= 60 && secs.is_multiple_of(60) {
            format!("{}m", secs / 60)
        } else {
            format!("{}s", secs)
        }
    }

    /// Time from `now` until the next pass should start
    pub fn next_delay(&self, now: DateTime<Local>) -> Duration {
        match self {
            Schedule::Every(interval) => *interval,
            Schedule::Daily(at) => {
                let next = next_daily_run(now.naive_local(), *at);
                // a wall-clock time skipped by a DST jump resolves to the earliest valid instant
                let next = Local
                    .from_local_datetime(&next)
                    .earliest()
                    .unwrap_or_else(|| now + chrono::Duration::days(1));
                (next - now).to_std().unwrap_or(Duration::ZERO)
            }
        }
    }
}

impl std::fmt::Display for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Schedule::Daily(at) => write!(f, "daily at {}", at.format("%H:%M")),
            Schedule::Every(interval) => write!(f, "every {}", Self::format_interval(*interval)),
        }
    }
}

/// The first occurrence of `at` strictly after `now`
fn next_daily_run(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    }
}

/// Scheduler runner
pub struct Scheduler<'a> {
    tracker: &'a VideoTracker,
    schedule: Schedule,
    urls: Vec<String>,
}

impl<'a> Scheduler<'a> {
    pub fn new(tracker: &'a VideoTracker, schedule: Schedule, urls: Vec<String>) -> Self {
        info!("Added {} URLs to tracking list", urls.len());
        Self {
            tracker,
            schedule,
            urls,
        }
    }

    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    /// Loop until `shutdown` resolves
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!("Starting video tracking scheduler ({})", self.schedule);
        tokio::pin!(shutdown);

        loop {
            let delay = self.schedule.next_delay(Local::now());
            info!("Next update in {}", Self::describe(delay));

            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(delay) => {}
            }

            tokio::select! {
                _ = &mut shutdown => break,
                _ = self.run_pass() => {}
            }
        }

        info!("Scheduler stopped");
    }

    /// One update pass over every URL. `None` when there is nothing to do
    /// or the pass failed.
    pub async fn run_pass(&self) -> Option<BatchReport> {
        if self.urls.is_empty() {
            warn!("No video URLs to update");
            return None;
        }

        info!("Starting scheduled update of {} videos", self.urls.len());
        let started = std::time::Instant::now();

        match self.tracker.update_existing(&self.urls).await {
            Ok(report) => {
                info!(
                    "Scheduled update completed: {} videos updated, {} failed in {:.2} seconds",
                    report.succeeded.len(),
                    report.failed.len(),
                    started.elapsed().as_secs_f64()
                );
                Some(report)
            }
            Err(e) => {
                error!("Scheduled update failed: {}", e);
                None
            }
        }
    }

    fn describe(delay: Duration) -> String {
        Schedule::format_interval(Duration::from_secs(delay.as_secs().max(1)))
    }
}
