use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Titles and captions are cut to this many characters before persisting.
pub const TITLE_MAX_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    TikTok,
}

impl Platform {
    /// Lower-case key used in logs and configuration
    pub fn key(&self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::TikTok => "tiktok",
        }
    }

    /// Name written to the spreadsheet's Platform column
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Instagram => "Instagram",
            Platform::TikTok => "TikTok",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Metrics snapshot of a single video, as scraped from its public page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub platform: Platform,
    pub video_url: String,
    pub video_id: String,
    pub title: String,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub share_count: u64,
    pub author: String,
    pub duration: String,
    pub upload_date: String,
    pub timestamp: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl VideoRecord {
    /// Create a record with every scraped field at its default
    pub fn new(platform: Platform, video_url: impl Into<String>, video_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            platform,
            video_url: video_url.into(),
            video_id: video_id.into(),
            title: String::new(),
            view_count: 0,
            like_count: 0,
            comment_count: 0,
            share_count: 0,
            author: String::new(),
            duration: String::new(),
            upload_date: String::new(),
            timestamp: now,
            last_updated: now,
        }
    }

    /// Set the title, truncated to [`TITLE_MAX_CHARS`] characters
    pub fn set_title(&mut self, title: &str) {
        self.title = title.trim().chars().take(TITLE_MAX_CHARS).collect();
    }

    /// The subset of fields refreshed by an update pass
    pub fn metrics(&self) -> MetricsUpdate {
        MetricsUpdate {
            view_count: self.view_count,
            like_count: self.like_count,
            comment_count: self.comment_count,
            share_count: self.share_count,
            last_updated: Utc::now(),
        }
    }

    /// Human-readable multi-line summary for terminal output
    pub fn summary(&self) -> Summary<'_> {
        Summary(self)
    }
}

/// Partial field set written over an existing spreadsheet row.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsUpdate {
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub share_count: u64,
    pub last_updated: DateTime<Utc>,
}

pub struct Summary<'a>(&'a VideoRecord);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let video = self.0;
        let author = if video.author.is_empty() {
            "Unknown"
        } else {
            &video.author
        };
        let title: String = if video.title.is_empty() {
            "No title".to_string()
        } else {
            video.title.chars().take(50).collect()
        };

        writeln!(f, "Video Summary:")?;
        writeln!(f, "- Platform: {}", video.platform)?;
        writeln!(f, "- Author: {}", author)?;
        writeln!(f, "- Title: {}...", title)?;
        writeln!(f, "- Views: {}", group_thousands(video.view_count))?;
        writeln!(f, "- Likes: {}", group_thousands(video.like_count))?;
        writeln!(f, "- Comments: {}", group_thousands(video.comment_count))?;
        writeln!(f, "- Shares: {}", group_thousands(video.share_count))?;
        write!(f, "- Last Updated: {}", video.last_updated.to_rfc3339())
    }
}

/// Format an integer with `,` between groups of three digits
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
