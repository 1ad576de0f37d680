use std::fs;
use std::path::Path;

use tracing::info;

use crate::app::{AppContext, Result, TrackerError};
use crate::cli::UrlSource;
use crate::scheduler::{Schedule, Scheduler};
use crate::tracker::UpdateOutcome;

/// Video URLs from a file: one per line, blank lines and `#` comments skipped
pub fn read_urls_from_file(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|e| {
        TrackerError::Other(format!("Failed to load URLs from {}: {}", path.display(), e))
    })?;

    let urls: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect();

    info!("Loaded {} URLs from {}", urls.len(), path.display());
    Ok(urls)
}

/// Resolve `source` to a URL list
pub fn collect_urls(source: &UrlSource) -> Result<Vec<String>> {
    if let Some(url) = &source.url {
        return Ok(vec![url.clone()]);
    }
    if let Some(path) = &source.file {
        return read_urls_from_file(path);
    }
    Ok(source.urls.clone().unwrap_or_default())
}

pub async fn init(ctx: &AppContext) -> Result<()> {
    ctx.tracker.initialize().await?;
    println!(
        "Spreadsheet initialized with sheet: {}",
        ctx.config.sheets.sheet_name
    );
    Ok(())
}

pub async fn track(ctx: &AppContext, source: &UrlSource) -> Result<()> {
    if let Some(url) = &source.url {
        let video = ctx.tracker.track_single(url).await?;
        println!("{}", video.summary());
        return Ok(());
    }

    let urls = collect_urls(source)?;
    if urls.is_empty() {
        println!("No URLs to track");
        return Ok(());
    }

    println!("Tracking {} videos...", urls.len());
    let report = ctx.tracker.track_many(&urls).await?;

    for video in &report.succeeded {
        println!("{}", video.summary());
    }
    for url in &report.failed {
        eprintln!("  Failed: {}", url);
    }
    println!(
        "Successfully tracked {} out of {} videos",
        report.succeeded.len(),
        urls.len()
    );
    Ok(())
}

pub async fn update(ctx: &AppContext, source: &UrlSource) -> Result<()> {
    if let Some(url) = &source.url {
        let (video, outcome) = ctx.tracker.update_single(url).await?;
        match outcome {
            UpdateOutcome::Updated => println!("Updated existing video: {}", url),
            UpdateOutcome::Appended => println!("Added new video: {}", url),
        }
        println!("{}", video.summary());
        return Ok(());
    }

    let urls = collect_urls(source)?;
    if urls.is_empty() {
        println!("No URLs to update");
        return Ok(());
    }

    println!("Updating {} videos...", urls.len());
    let report = ctx.tracker.update_existing(&urls).await?;

    for url in &report.failed {
        eprintln!("  Failed: {}", url);
    }
    println!(
        "Update complete: {} out of {} videos processed",
        report.succeeded.len(),
        urls.len()
    );
    Ok(())
}

/// Runs until Ctrl-C, which the binary handles by exiting
pub async fn schedule(ctx: &AppContext, file: &Path, schedule: Schedule) -> Result<()> {
    let urls = read_urls_from_file(file)?;
    println!(
        "Scheduling updates of {} videos ({}). Press Ctrl-C to stop.",
        urls.len(),
        schedule
    );

    let scheduler = Scheduler::new(&ctx.tracker, schedule, urls);
    scheduler.run_until(std::future::pending::<()>()).await;
    Ok(())
}

/// Print the rows a dry run collected
pub fn print_dry_run(ctx: &AppContext) {
    let Some(sheet) = &ctx.dry_run_sheet else {
        return;
    };

    let rows = sheet.rows();
    println!("Dry run: {} rows in {}", rows.len(), ctx.config.sheets.sheet_name);
    for row in rows {
        println!("  {}", row.join(" | "));
    }
}
