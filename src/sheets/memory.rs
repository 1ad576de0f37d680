use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::app::{Result, TrackerError};
use crate::sheets::{CellUpdate, CellValue, Worksheet};

/// Worksheet kept in process memory. Backs `--dry-run` and the tests.
#[derive(Debug)]
pub struct MemoryWorksheet {
    title: String,
    rows: Mutex<Vec<Vec<String>>>,
    append_calls: AtomicUsize,
    update_calls: AtomicUsize,
}

impl MemoryWorksheet {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            rows: Mutex::new(Vec::new()),
            append_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
        }
    }

    /// Snapshot of every row
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.lock().map(|rows| rows.clone()).unwrap_or_default()
    }

    pub fn append_calls(&self) -> usize {
        self.append_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Vec<String>>>> {
        self.rows
            .lock()
            .map_err(|_| TrackerError::Sheets("worksheet lock poisoned".to_string()))
    }
}

#[async_trait]
impl Worksheet for MemoryWorksheet {
    fn title(&self) -> &str {
        &self.title
    }

    async fn header_row(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.first().cloned().unwrap_or_default())
    }

    async fn clear(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }

    async fn append_rows(&self, rows: &[Vec<CellValue>]) -> Result<()> {
        let mut sheet = self.lock()?;
        sheet.extend(
            rows.iter()
                .map(|row| row.iter().map(CellValue::to_string).collect::<Vec<_>>()),
        );
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn all_rows(&self) -> Result<Vec<Vec<String>>> {
        Ok(self.lock()?.clone())
    }

    async fn update_cells(&self, updates: &[CellUpdate]) -> Result<()> {
        let mut sheet = self.lock()?;
        for update in updates {
            if update.row == 0 || update.column == 0 {
                return Err(TrackerError::Sheets(format!(
                    "invalid cell position {}:{}",
                    update.row, update.column
                )));
            }
            if sheet.len() < update.row {
                sheet.resize(update.row, Vec::new());
            }
            let row = &mut sheet[update.row - 1];
            if row.len() < update.column {
                row.resize(update.column, String::new());
            }
            row[update.column - 1] = update.value.to_string();
        }
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_and_read_back() {
        let sheet = MemoryWorksheet::new("Tab");
        sheet
            .append_rows(&[vec!["a".into(), 1u64.into()], vec!["b".into()]])
            .await
            .unwrap();

        assert_eq!(sheet.title(), "Tab");
        assert_eq!(sheet.header_row().await.unwrap(), vec!["a", "1"]);
        assert_eq!(sheet.all_rows().await.unwrap().len(), 2);
        assert_eq!(sheet.append_calls(), 1);
    }

    #[tokio::test]
    async fn test_update_cells_pads_short_rows() {
        let sheet = MemoryWorksheet::new("Tab");
        sheet.append_rows(&[vec!["a".into()]]).await.unwrap();
        sheet
            .update_cells(&[CellUpdate {
                row: 2,
                column: 3,
                value: "x".into(),
            }])
            .await
            .unwrap();

        assert_eq!(sheet.rows(), vec![vec!["a".to_string()], vec![String::new(), String::new(), "x".to_string()]]);
    }

    #[tokio::test]
    async fn test_clear_empties_sheet() {
        let sheet = MemoryWorksheet::new("Tab");
        sheet.append_rows(&[vec!["a".into()]]).await.unwrap();
        sheet.clear().await.unwrap();
        assert!(sheet.header_row().await.unwrap().is_empty());
    }
}
