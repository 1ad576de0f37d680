use std::sync::Arc;

use tracing::info;

use crate::app::error::{Result, TrackerError};
use crate::config::Config;
use crate::scraper::{ChromeLauncher, PlatformRouter, RetryDriver, SessionFactory};
use crate::sheets::{
    http_client, GoogleWorksheet, MemoryWorksheet, ServiceAccountAuth, SpreadsheetSink, Worksheet,
};
use crate::tracker::VideoTracker;

pub struct AppContext {
    pub config: Config,
    pub tracker: VideoTracker,
    /// Set for dry runs, where rows never leave the process
    pub dry_run_sheet: Option<Arc<MemoryWorksheet>>,
}

impl AppContext {
    /// Connect to the configured spreadsheet and wire up the tracker
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let spreadsheet = config
            .sheets
            .spreadsheet_url
            .as_deref()
            .ok_or_else(|| TrackerError::Other("No spreadsheet configured".into()))?;

        let client = http_client()?;
        let auth = Arc::new(ServiceAccountAuth::from_file(
            client.clone(),
            &config.sheets.credentials_path,
        )?);
        info!("Authenticating as {}", auth.client_email());

        let sheet =
            GoogleWorksheet::open(client, auth, spreadsheet, &config.sheets.sheet_name).await?;

        Ok(Self::with_worksheet(config, Arc::new(sheet), None))
    }

    /// Same wiring over an in-memory worksheet; no credentials needed
    pub fn dry_run(config: Config) -> Self {
        let sheet = Arc::new(MemoryWorksheet::new(config.sheets.sheet_name.clone()));
        Self::with_worksheet(config, sheet.clone(), Some(sheet))
    }

    fn with_worksheet(
        config: Config,
        sheet: Arc<dyn Worksheet>,
        dry_run_sheet: Option<Arc<MemoryWorksheet>>,
    ) -> Self {
        let sessions: Arc<dyn SessionFactory> =
            Arc::new(ChromeLauncher::new(config.scraper.clone()));
        let tracker = VideoTracker::new(
            SpreadsheetSink::new(sheet),
            sessions,
            PlatformRouter::new(config.scraper.clone()),
            RetryDriver::new(config.tracker.retry_policy()),
            config.tracker.request_delay(),
        );

        Self {
            config,
            tracker,
            dry_run_sheet,
        }
    }
}
