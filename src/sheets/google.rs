use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use url::Url;

use crate::app::{Result, TrackerError};
use crate::sheets::{column_letter, CellUpdate, CellValue, ServiceAccountAuth, Worksheet};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const NEW_SHEET_ROWS: u32 = 1000;
const NEW_SHEET_COLUMNS: u32 = 20;
/// Cells are stored verbatim; strings are never parsed as numbers or formulas
const VALUE_INPUT_OPTION: &str = "RAW";

static SPREADSHEET_URL_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/spreadsheets/d/([a-zA-Z0-9_-]+)").expect("valid spreadsheet url pattern")
});

/// Spreadsheet id from either a full `docs.google.com` URL or a bare id
pub fn spreadsheet_id(reference: &str) -> Result<String> {
    let reference = reference.trim();
    if let Some(caps) = SPREADSHEET_URL_ID.captures(reference) {
        return Ok(caps[1].to_string());
    }
    if !reference.is_empty()
        && reference
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Ok(reference.to_string());
    }
    Err(TrackerError::Sheets(format!(
        "Not a spreadsheet URL or id: {:?}",
        reference
    )))
}

/// HTTP client shared by token exchange and the Sheets API
pub fn http_client() -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(30))
        .gzip(true)
        .brotli(true)
        .user_agent(concat!("sns-tracker/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// `'Tab Name'!range` with single quotes in the title doubled
fn a1_range(title: &str, range: Option<&str>) -> String {
    let quoted = format!("'{}'", title.replace('\'', "''"));
    match range {
        Some(range) => format!("{}!{}", quoted, range),
        None => quoted,
    }
}

fn cell_range(title: &str, update: &CellUpdate) -> String {
    let cell = format!("{}{}", column_letter(update.column), update.row);
    a1_range(title, Some(&cell))
}

fn append_body(rows: &[Vec<CellValue>]) -> Value {
    let values: Vec<Vec<Value>> = rows
        .iter()
        .map(|row| row.iter().map(CellValue::to_json).collect())
        .collect();
    json!({ "values": values })
}

fn batch_update_body(title: &str, updates: &[CellUpdate]) -> Value {
    let data: Vec<Value> = updates
        .iter()
        .map(|update| {
            json!({
                "range": cell_range(title, update),
                "values": [[update.value.to_json()]],
            })
        })
        .collect();
    json!({ "valueInputOption": VALUE_INPUT_OPTION, "data": data })
}

fn endpoint(spreadsheet_id: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(SHEETS_API)?;
    url.path_segments_mut()
        .map_err(|_| TrackerError::Sheets("Sheets API base URL cannot be a base".to_string()))?
        .push(spreadsheet_id)
        .extend(segments);
    Ok(url)
}

async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TrackerError::Sheets(format!(
        "Sheets API returned HTTP {}: {}",
        status, body
    )))
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// One tab of a Google spreadsheet, accessed through the Sheets v4 REST API
pub struct GoogleWorksheet {
    client: Client,
    auth: Arc<ServiceAccountAuth>,
    spreadsheet_id: String,
    title: String,
}

impl GoogleWorksheet {
    /// Open the tab `title`, creating it (1000×20) when the spreadsheet lacks it
    pub async fn open(
        client: Client,
        auth: Arc<ServiceAccountAuth>,
        spreadsheet_ref: &str,
        title: &str,
    ) -> Result<Self> {
        let sheet = Self {
            client,
            auth,
            spreadsheet_id: spreadsheet_id(spreadsheet_ref)?,
            title: title.to_string(),
        };

        if !sheet.tab_exists().await? {
            sheet.add_tab().await?;
            info!("Created new worksheet: {}", title);
        }

        info!("Connected to spreadsheet: {}", sheet.spreadsheet_id);
        Ok(sheet)
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    async fn tab_exists(&self) -> Result<bool> {
        let mut url = endpoint(&self.spreadsheet_id, &[])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");

        let response = self
            .client
            .get(url)
            .bearer_auth(self.auth.token().await?)
            .send()
            .await?;
        let meta: SpreadsheetMeta = check(response).await?.json().await?;

        Ok(meta
            .sheets
            .iter()
            .any(|sheet| sheet.properties.title == self.title))
    }

    async fn add_tab(&self) -> Result<()> {
        let url = endpoint(&self.spreadsheet_id, &[])?;
        let url = Url::parse(&format!("{}:batchUpdate", url))?;
        let body = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": self.title,
                        "gridProperties": {
                            "rowCount": NEW_SHEET_ROWS,
                            "columnCount": NEW_SHEET_COLUMNS,
                        }
                    }
                }
            }]
        });
        self.post(url, &body).await
    }

    async fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>> {
        let url = endpoint(&self.spreadsheet_id, &["values", range])?;
        let response = self
            .client
            .get(url)
            .bearer_auth(self.auth.token().await?)
            .send()
            .await?;
        let range: ValueRange = check(response).await?.json().await?;

        Ok(range
            .values
            .iter()
            .map(|row| row.iter().map(display_value).collect())
            .collect())
    }

    async fn post(&self, url: Url, body: &Value) -> Result<()> {
        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .bearer_auth(self.auth.token().await?)
            .json(body)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl Worksheet for GoogleWorksheet {
    fn title(&self) -> &str {
        &self.title
    }

    async fn header_row(&self) -> Result<Vec<String>> {
        let rows = self.get_values(&a1_range(&self.title, Some("1:1"))).await?;
        Ok(rows.into_iter().next().unwrap_or_default())
    }

    async fn clear(&self) -> Result<()> {
        let range = format!("{}:clear", a1_range(&self.title, None));
        let url = endpoint(&self.spreadsheet_id, &["values", range.as_str()])?;
        self.post(url, &json!({})).await
    }

    async fn append_rows(&self, rows: &[Vec<CellValue>]) -> Result<()> {
        let range = format!("{}:append", a1_range(&self.title, Some("A1")));
        let mut url = endpoint(&self.spreadsheet_id, &["values", range.as_str()])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", VALUE_INPUT_OPTION)
            .append_pair("insertDataOption", "INSERT_ROWS");

        self.post(url, &append_body(rows)).await
    }

    async fn all_rows(&self) -> Result<Vec<Vec<String>>> {
        self.get_values(&a1_range(&self.title, None)).await
    }

    async fn update_cells(&self, updates: &[CellUpdate]) -> Result<()> {
        let url = endpoint(&self.spreadsheet_id, &["values:batchUpdate"])?;
        self.post(url, &batch_update_body(&self.title, updates)).await
    }
}
