use std::sync::Arc;

use tracing::{error, info, warn};

use crate::app::{Result, TrackerError};
use crate::domain::{MetricsUpdate, VideoRecord};
use crate::sheets::{CellUpdate, CellValue, Column, Worksheet};

/// Writes video records into a worksheet using the fixed 13-column layout
#[derive(Clone)]
pub struct SpreadsheetSink {
    sheet: Arc<dyn Worksheet>,
}

impl SpreadsheetSink {
    pub fn new(sheet: Arc<dyn Worksheet>) -> Self {
        Self { sheet }
    }

    pub fn worksheet(&self) -> &Arc<dyn Worksheet> {
        &self.sheet
    }

    /// Make row 1 exactly the expected headers.
    ///
    /// Any mismatch clears the whole sheet first: existing data is lost.
    pub async fn initialize_headers(&self) -> Result<()> {
        let headers = Column::headers();
        let existing = self.sheet.header_row().await.inspect_err(|e| {
            error!("Failed to initialize headers: {}", e);
        })?;

        if existing == headers {
            return Ok(());
        }

        if !existing.is_empty() {
            warn!(
                "Header row of {} does not match, clearing the worksheet",
                self.sheet.title()
            );
        }

        let row: Vec<CellValue> = headers.into_iter().map(CellValue::Text).collect();
        let result = async {
            self.sheet.clear().await?;
            self.sheet.append_rows(&[row]).await
        }
        .await;

        result.inspect_err(|e| error!("Failed to initialize headers: {}", e))?;
        info!("Initialized headers in worksheet: {}", self.sheet.title());
        Ok(())
    }

    /// Append one record as a new row
    pub async fn append(&self, video: &VideoRecord) -> Result<()> {
        if video.video_id.is_empty() {
            warn!("Persisting video without an id: {}", video.video_url);
        }

        self.sheet
            .append_rows(&[record_row(video)])
            .await
            .inspect_err(|e| error!("Failed to append video data: {}", e))?;

        info!("Appended data for video: {}", video.video_url);
        Ok(())
    }

    /// Append many records in a single call; nothing happens for an empty slice
    pub async fn batch_append(&self, videos: &[VideoRecord]) -> Result<()> {
        if videos.is_empty() {
            return Ok(());
        }

        let rows: Vec<Vec<CellValue>> = videos.iter().map(record_row).collect();
        self.sheet
            .append_rows(&rows)
            .await
            .inspect_err(|e| error!("Failed to batch append video data: {}", e))?;

        info!("Batch appended {} video records", rows.len());
        Ok(())
    }

    /// Overwrite `fields` on the first row whose Video_URL equals `url`.
    ///
    /// Returns `false` without touching the sheet when no row matches.
    pub async fn upsert(&self, url: &str, fields: &[(Column, CellValue)]) -> Result<bool> {
        let result = self.try_upsert(url, fields).await;
        result.inspect_err(|e| error!("Failed to update existing video: {}", e))
    }

    /// [`upsert`](Self::upsert) the refreshed metrics of a video
    pub async fn update_metrics(&self, url: &str, metrics: &MetricsUpdate) -> Result<bool> {
        self.upsert(url, &metrics_fields(metrics)).await
    }

    async fn try_upsert(&self, url: &str, fields: &[(Column, CellValue)]) -> Result<bool> {
        let rows = self.sheet.all_rows().await?;
        let Some(header) = rows.first() else {
            warn!("Video not found for update: {}", url);
            return Ok(false);
        };

        let url_index = column_index(header, Column::VideoUrl)?;
        let mut targets = Vec::with_capacity(fields.len());
        for (column, value) in fields {
            targets.push((column_index(header, *column)?, value));
        }

        let matched = rows
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, row)| row.get(url_index).map(String::as_str) == Some(url));

        let Some((position, _)) = matched else {
            warn!("Video not found for update: {}", url);
            return Ok(false);
        };

        let updates: Vec<CellUpdate> = targets
            .into_iter()
            .map(|(index, value)| CellUpdate {
                row: position + 1,
                column: index + 1,
                value: value.clone(),
            })
            .collect();

        if !updates.is_empty() {
            self.sheet.update_cells(&updates).await?;
        }

        info!("Updated existing video: {}", url);
        Ok(true)
    }
}

/// 0-based index of `column` in the live header row
fn column_index(header: &[String], column: Column) -> Result<usize> {
    header
        .iter()
        .position(|h| h.trim() == column.header())
        .ok_or_else(|| {
            TrackerError::Sheets(format!(
                "Column '{}' not found in header row; run `init` first",
                column.header()
            ))
        })
}

/// Cell values of a record in [`Column::ALL`] order
pub fn record_row(video: &VideoRecord) -> Vec<CellValue> {
    Column::ALL
        .iter()
        .map(|column| match column {
            Column::Timestamp => CellValue::Text(video.timestamp.to_rfc3339()),
            Column::Platform => CellValue::from(video.platform.display_name()),
            Column::VideoUrl => CellValue::Text(video.video_url.clone()),
            Column::VideoId => CellValue::Text(video.video_id.clone()),
            Column::Title => CellValue::Text(video.title.clone()),
            Column::ViewCount => CellValue::Number(video.view_count),
            Column::LikeCount => CellValue::Number(video.like_count),
            Column::CommentCount => CellValue::Number(video.comment_count),
            Column::ShareCount => CellValue::Number(video.share_count),
            Column::Author => CellValue::Text(video.author.clone()),
            Column::Duration => CellValue::Text(video.duration.clone()),
            Column::UploadDate => CellValue::Text(video.upload_date.clone()),
            Column::LastUpdated => CellValue::Text(video.last_updated.to_rfc3339()),
        })
        .collect()
}

fn metrics_fields(metrics: &MetricsUpdate) -> Vec<(Column, CellValue)> {
    vec![
        (Column::ViewCount, CellValue::Number(metrics.view_count)),
        (Column::LikeCount, CellValue::Number(metrics.like_count)),
        (Column::CommentCount, CellValue::Number(metrics.comment_count)),
        (Column::ShareCount, CellValue::Number(metrics.share_count)),
        (Column::LastUpdated, CellValue::Text(metrics.last_updated.to_rfc3339())),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Platform;
    use crate::sheets::MemoryWorksheet;

    fn sink() -> (Arc<MemoryWorksheet>, SpreadsheetSink) {
        let sheet = Arc::new(MemoryWorksheet::new("SNS_Video_Data"));
        let sink = SpreadsheetSink::new(sheet.clone());
        (sheet, sink)
    }

    fn video(url: &str) -> VideoRecord {
        let mut video = VideoRecord::new(Platform::TikTok, url, "1");
        video.author = "someone".into();
        video.view_count = 10;
        video.like_count = 2;
        video
    }

    #[tokio::test]
    async fn test_initialize_headers_on_empty_sheet() {
        let (sheet, sink) = sink();
        sink.initialize_headers().await.unwrap();
        assert_eq!(sheet.rows(), vec![Column::headers()]);
    }

    #[tokio::test]
    async fn test_initialize_headers_is_idempotent() {
        let (sheet, sink) = sink();
        sink.initialize_headers().await.unwrap();
        sink.append(&video("https://www.tiktok.com/@a/video/1")).await.unwrap();
        sink.initialize_headers().await.unwrap();
        assert_eq!(sheet.rows().len(), 2);
    }

    #[tokio::test]
    async fn test_initialize_headers_clears_mismatched_sheet() {
        let (sheet, sink) = sink();
        sheet.append_rows(&[vec!["Old".into(), "Header".into()]]).await.unwrap();
        sheet.append_rows(&[vec!["data".into()]]).await.unwrap();

        sink.initialize_headers().await.unwrap();

        assert_eq!(sheet.rows(), vec![Column::headers()]);
    }

    #[tokio::test]
    async fn test_append_writes_fixed_column_order() {
        let (sheet, sink) = sink();
        sink.initialize_headers().await.unwrap();
        let record = video("https://www.tiktok.com/@a/video/1");
        sink.append(&record).await.unwrap();

        let rows = sheet.rows();
        let row = &rows[1];
        assert_eq!(row.len(), 13);
        assert_eq!(row[1], "TikTok");
        assert_eq!(row[2], "https://www.tiktok.com/@a/video/1");
        assert_eq!(row[3], "1");
        assert_eq!(row[5], "10");
        assert_eq!(row[6], "2");
        assert_eq!(row[9], "someone");
        assert_eq!(row[12], record.last_updated.to_rfc3339());
    }

    #[tokio::test]
    async fn test_batch_append_single_call() {
        let (sheet, sink) = sink();
        let videos = vec![
            video("https://www.tiktok.com/@a/video/1"),
            video("https://www.tiktok.com/@a/video/2"),
        ];
        sink.batch_append(&videos).await.unwrap();
        sink.batch_append(&[]).await.unwrap();

        assert_eq!(sheet.rows().len(), 2);
        assert_eq!(sheet.append_calls(), 1);
    }

    #[tokio::test]
    async fn test_upsert_updates_only_named_columns() {
        let (sheet, sink) = sink();
        sink.initialize_headers().await.unwrap();
        let first = video("https://www.tiktok.com/@a/video/1");
        let second = video("https://www.tiktok.com/@a/video/2");
        sink.batch_append(&[first.clone(), second]).await.unwrap();
        let before = sheet.rows();

        let updated = sink
            .upsert(
                "https://www.tiktok.com/@a/video/2",
                &[(Column::ViewCount, 999u64.into()), (Column::Author, "renamed".into())],
            )
            .await
            .unwrap();

        assert!(updated);
        let after = sheet.rows();
        assert_eq!(after[1], before[1]);
        assert_eq!(after[2][5], "999");
        assert_eq!(after[2][9], "renamed");
        for column in [0, 1, 2, 3, 4, 6, 7, 8, 10, 11, 12] {
            assert_eq!(after[2][column], before[2][column], "column {column}");
        }
    }

    #[tokio::test]
    async fn test_upsert_first_match_wins() {
        let (sheet, sink) = sink();
        sink.initialize_headers().await.unwrap();
        let url = "https://www.instagram.com/p/DUP/";
        sink.batch_append(&[video(url), video(url)]).await.unwrap();

        assert!(sink.upsert(url, &[(Column::LikeCount, 5u64.into())]).await.unwrap());

        let rows = sheet.rows();
        assert_eq!(rows[1][6], "5");
        assert_eq!(rows[2][6], "2");
    }

    #[tokio::test]
    async fn test_upsert_unknown_url_leaves_sheet_untouched() {
        let (sheet, sink) = sink();
        sink.initialize_headers().await.unwrap();
        sink.append(&video("https://www.tiktok.com/@a/video/1")).await.unwrap();
        let before = sheet.rows();

        let updated = sink
            .upsert("https://www.tiktok.com/@a/video/404", &[(Column::ViewCount, 1u64.into())])
            .await
            .unwrap();

        assert!(!updated);
        assert_eq!(sheet.rows(), before);
        assert_eq!(sheet.update_calls(), 0);
    }

    #[tokio::test]
    async fn test_upsert_on_empty_sheet_is_not_found() {
        let (_sheet, sink) = sink();
        let updated = sink.upsert("https://x.tiktok.com/", &[]).await.unwrap();
        assert!(!updated);
    }

    #[tokio::test]
    async fn test_upsert_missing_header_is_an_error() {
        let (sheet, sink) = sink();
        sheet
            .append_rows(&[vec!["Video_URL".into()], vec!["https://a.tiktok.com/".into()]])
            .await
            .unwrap();

        let result = sink
            .upsert("https://a.tiktok.com/", &[(Column::ViewCount, 1u64.into())])
            .await;

        assert!(matches!(result, Err(TrackerError::Sheets(_))));
    }

    #[tokio::test]
    async fn test_update_metrics_writes_counts_and_timestamp() {
        let (sheet, sink) = sink();
        sink.initialize_headers().await.unwrap();
        let url = "https://www.tiktok.com/@a/video/1";
        sink.append(&video(url)).await.unwrap();

        let mut fresh = video(url);
        fresh.view_count = 12_000;
        fresh.share_count = 7;
        let metrics = fresh.metrics();
        assert!(sink.update_metrics(url, &metrics).await.unwrap());

        let row = &sheet.rows()[1];
        assert_eq!(row[5], "12000");
        assert_eq!(row[8], "7");
        assert_eq!(row[12], metrics.last_updated.to_rfc3339());
        assert_eq!(row[9], "someone");
    }
}
