pub mod commands;

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveTime;
use clap::{Args, Parser, Subcommand};

use crate::config::Config;
use crate::scheduler::Schedule;

#[derive(Parser)]
#[command(name = "sns-tracker")]
#[command(about = "Track Instagram and TikTok video metrics in Google Sheets", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/sns-tracker/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the Google service-account JSON key
    #[arg(short, long, global = true)]
    pub credentials: Option<PathBuf>,

    /// Google Spreadsheet URL or id
    #[arg(short, long, global = true)]
    pub spreadsheet: Option<String>,

    /// Worksheet tab to write to
    #[arg(long, global = true)]
    pub sheet_name: Option<String>,

    /// Log level: debug, info, warn, error
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Keep rows in memory instead of writing to Google Sheets
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Let command-line flags override file and environment settings
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(credentials) = &self.credentials {
            config.sheets.credentials_path = credentials.clone();
        }
        if let Some(spreadsheet) = &self.spreadsheet {
            config.sheets.spreadsheet_url = Some(spreadsheet.clone());
        }
        if let Some(sheet_name) = &self.sheet_name {
            config.sheets.sheet_name = sheet_name.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.to_lowercase();
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the header row, clearing the worksheet if it holds anything else
    Init,
    /// Scrape videos and append them as new rows
    Track {
        #[command(flatten)]
        source: UrlSource,
    },
    /// Refresh metrics of tracked videos, appending the ones not yet in the sheet
    Update {
        #[command(flatten)]
        source: UrlSource,
    },
    /// Run update passes periodically until interrupted
    Schedule {
        /// File with one video URL per line
        #[arg(short, long)]
        file: PathBuf,

        #[command(flatten)]
        when: ScheduleArgs,
    },
}

/// Where the video URLs come from
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct UrlSource {
    /// Single video URL
    #[arg(short, long)]
    pub url: Option<String>,

    /// File with one video URL per line (`#` starts a comment)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Several video URLs
    #[arg(long, num_args = 1..)]
    pub urls: Option<Vec<String>>,
}

#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct ScheduleArgs {
    /// Run once a day at this local time (HH:MM)
    #[arg(long, value_parser = Schedule::parse_time)]
    pub daily_at: Option<NaiveTime>,

    /// Run every hour
    #[arg(long)]
    pub hourly: bool,

    /// Run at a fixed interval (e.g., "30m", "6h", "1d")
    #[arg(long, value_parser = Schedule::parse_interval)]
    pub every: Option<Duration>,
}

impl ScheduleArgs {
    pub fn schedule(&self) -> Schedule {
        match (self.daily_at, self.every) {
            (Some(at), _) => Schedule::Daily(at),
            (None, Some(interval)) => Schedule::Every(interval),
            (None, None) => Schedule::hourly(),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_track_single_url() {
        let cli = Cli::parse_from(["sns-tracker", "track", "--url", "https://www.tiktok.com/@a/video/1"]);
        match cli.command {
            Commands::Track { source } => {
                assert_eq!(source.url.as_deref(), Some("https://www.tiktok.com/@a/video/1"));
                assert!(source.file.is_none());
            }
            _ => panic!("expected track"),
        }
    }

    #[test]
    fn test_url_sources_are_exclusive() {
        let result = Cli::try_parse_from([
            "sns-tracker",
            "track",
            "--url",
            "https://a.tiktok.com/",
            "--file",
            "urls.txt",
        ]);
        assert!(result.is_err());
        assert!(Cli::try_parse_from(["sns-tracker", "update"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "sns-tracker",
            "update",
            "--urls",
            "https://a.tiktok.com/1",
            "https://b.tiktok.com/2",
            "--dry-run",
            "-s",
            "sheet-id",
        ]);
        assert!(cli.dry_run);

        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.sheets.spreadsheet_url.as_deref(), Some("sheet-id"));

        match cli.command {
            Commands::Update { source } => assert_eq!(source.urls.unwrap().len(), 2),
            _ => panic!("expected update"),
        }
    }

    #[test]
    fn test_schedule_options() {
        let cli = Cli::parse_from(["sns-tracker", "schedule", "--file", "u.txt", "--every", "30m"]);
        match cli.command {
            Commands::Schedule { when, .. } => {
                assert_eq!(when.schedule(), Schedule::Every(Duration::from_secs(1800)));
            }
            _ => panic!("expected schedule"),
        }

        let cli = Cli::parse_from(["sns-tracker", "schedule", "-f", "u.txt", "--daily-at", "09:30"]);
        match cli.command {
            Commands::Schedule { when, .. } => assert_eq!(
                when.schedule(),
                Schedule::Daily(NaiveTime::from_hms_opt(9, 30, 0).unwrap())
            ),
            _ => panic!("expected schedule"),
        }

        assert!(Cli::try_parse_from(["sns-tracker", "schedule", "-f", "u.txt"]).is_err());
        assert!(
            Cli::try_parse_from(["sns-tracker", "schedule", "-f", "u.txt", "--every", "soon"])
                .is_err()
        );
    }
}
