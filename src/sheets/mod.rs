//! Spreadsheet persistence for video records.
//!
//! [`SpreadsheetSink`] holds the row schema and upsert logic; the
//! [`Worksheet`] trait is the thin transport underneath it, implemented by
//! [`GoogleWorksheet`] (Sheets API v4) and [`MemoryWorksheet`] (dry runs).

mod auth;
mod google;
mod memory;
mod sink;

pub use auth::{ServiceAccountAuth, ServiceAccountKey};
pub use google::{http_client, spreadsheet_id, GoogleWorksheet};
pub use memory::MemoryWorksheet;
pub use sink::SpreadsheetSink;

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::app::Result;

/// Default worksheet (tab) name
pub const DEFAULT_SHEET_NAME: &str = "SNS_Video_Data";

/// Columns of the tracking sheet, in their fixed order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Timestamp,
    Platform,
    VideoUrl,
    VideoId,
    Title,
    ViewCount,
    LikeCount,
    CommentCount,
    ShareCount,
    Author,
    Duration,
    UploadDate,
    LastUpdated,
}

impl Column {
    pub const ALL: [Column; 13] = [
        Column::Timestamp,
        Column::Platform,
        Column::VideoUrl,
        Column::VideoId,
        Column::Title,
        Column::ViewCount,
        Column::LikeCount,
        Column::CommentCount,
        Column::ShareCount,
        Column::Author,
        Column::Duration,
        Column::UploadDate,
        Column::LastUpdated,
    ];

    /// Header text in row 1
    pub fn header(&self) -> &'static str {
        match self {
            Column::Timestamp => "Timestamp",
            Column::Platform => "Platform",
            Column::VideoUrl => "Video_URL",
            Column::VideoId => "Video_ID",
            Column::Title => "Title",
            Column::ViewCount => "View_Count",
            Column::LikeCount => "Like_Count",
            Column::CommentCount => "Comment_Count",
            Column::ShareCount => "Share_Count",
            Column::Author => "Author",
            Column::Duration => "Duration",
            Column::UploadDate => "Upload_Date",
            Column::LastUpdated => "Last_Updated",
        }
    }

    pub fn headers() -> Vec<String> {
        Self::ALL.iter().map(|c| c.header().to_string()).collect()
    }
}

/// A single cell value as written to the sheet
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(u64),
}

impl CellValue {
    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Text(s) => Value::String(s.clone()),
            CellValue::Number(n) => Value::from(*n),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<u64> for CellValue {
    fn from(n: u64) -> Self {
        CellValue::Number(n)
    }
}

/// Targeted write of one cell; `row` and `column` are 1-based like A1 notation
#[derive(Debug, Clone, PartialEq)]
pub struct CellUpdate {
    pub row: usize,
    pub column: usize,
    pub value: CellValue,
}

/// Row-oriented access to one worksheet tab
#[async_trait]
pub trait Worksheet: Send + Sync {
    /// Tab name
    fn title(&self) -> &str;

    /// Values of row 1, empty when the sheet is empty
    async fn header_row(&self) -> Result<Vec<String>>;

    /// Remove every value from the sheet
    async fn clear(&self) -> Result<()>;

    /// Append rows after the last non-empty row, in one call
    async fn append_rows(&self, rows: &[Vec<CellValue>]) -> Result<()>;

    /// Every row including the header, as displayed strings
    async fn all_rows(&self) -> Result<Vec<Vec<String>>>;

    /// Overwrite individual cells, in one call
    async fn update_cells(&self, updates: &[CellUpdate]) -> Result<()>;
}

/// Column letters for a 1-based column index: 1 → A, 27 → AA
pub fn column_letter(mut column: usize) -> String {
    let mut letters = Vec::new();
    while column > 0 {
        let rem = (column - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        column = (column - 1) / 26;
    }
    letters.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_in_fixed_order() {
        let headers = Column::headers();
        assert_eq!(headers.len(), 13);
        assert_eq!(headers[0], "Timestamp");
        assert_eq!(headers[2], "Video_URL");
        assert_eq!(headers[12], "Last_Updated");
    }

    #[test]
    fn test_column_letter() {
        assert_eq!(column_letter(1), "A");
        assert_eq!(column_letter(13), "M");
        assert_eq!(column_letter(26), "Z");
        assert_eq!(column_letter(27), "AA");
        assert_eq!(column_letter(703), "AAA");
    }

    #[test]
    fn test_cell_value_json() {
        assert_eq!(CellValue::from(5u64).to_json(), serde_json::json!(5));
        assert_eq!(CellValue::from("x").to_json(), serde_json::json!("x"));
        assert_eq!(CellValue::from(12u64).to_string(), "12");
    }
}
