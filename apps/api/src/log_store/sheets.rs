//! Google Sheets v4 backend.
//!
//! The spreadsheet is addressed by ID, or by document name resolved once
//! through Drive. Reads use formatted values, so every cell arrives as a string.

use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::auth::TokenProvider;
use super::{records_from_rows, LogStore, Record, StoreError};
use crate::config::SpreadsheetLocator;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

/// Cells are stored exactly as sent. Free text is never parsed as a formula,
/// number or date.
const APPEND_QUERY: [(&str, &str); 2] = [
    ("valueInputOption", "RAW"),
    ("insertDataOption", "INSERT_ROWS"),
];

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    message: String,
}

/// One worksheet (tab) of one spreadsheet, acting as the Log Store.
pub struct SheetsStore {
    client: Client,
    token: TokenProvider,
    locator: SpreadsheetLocator,
    worksheet: String,
    spreadsheet_id: Mutex<Option<String>>,
    sheets_base: String,
    drive_files_url: String,
}

impl SheetsStore {
    pub fn new(
        client: Client,
        token: TokenProvider,
        locator: SpreadsheetLocator,
        worksheet: String,
    ) -> Self {
        let spreadsheet_id = match &locator {
            SpreadsheetLocator::Id(id) => Some(id.clone()),
            SpreadsheetLocator::Name(_) => None,
        };
        Self {
            client,
            token,
            locator,
            worksheet,
            spreadsheet_id: Mutex::new(spreadsheet_id),
            sheets_base: SHEETS_API_BASE.to_string(),
            drive_files_url: DRIVE_FILES_URL.to_string(),
        }
    }

    #[cfg(test)]
    fn with_endpoints(mut self, sheets_base: String, drive_files_url: String) -> Self {
        self.sheets_base = sheets_base;
        self.drive_files_url = drive_files_url;
        self
    }

    fn cached_id(&self) -> Option<String> {
        self.spreadsheet_id
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    async fn spreadsheet_id(&self) -> Result<String, StoreError> {
        if let Some(id) = self.cached_id() {
            return Ok(id);
        }
        let name = match &self.locator {
            SpreadsheetLocator::Id(id) => return Ok(id.clone()),
            SpreadsheetLocator::Name(name) => name,
        };

        let query = drive_query(name);
        let response = self
            .send_authorized(|token| {
                self.client
                    .get(&self.drive_files_url)
                    .bearer_auth(token)
                    .query(&[("q", query.as_str()), ("fields", "files(id,name)")])
            })
            .await?;
        let list: DriveFileList = response.json().await?;

        let id = list
            .files
            .into_iter()
            .next()
            .map(|f| f.id)
            .ok_or_else(|| {
                StoreError::NotFound(format!(
                    "no spreadsheet named '{name}' is shared with {}",
                    self.token.client_email()
                ))
            })?;
        info!("Resolved spreadsheet '{name}' to {id}");
        *self.spreadsheet_id.lock().unwrap_or_else(|e| e.into_inner()) = Some(id.clone());
        Ok(id)
    }

    /// Sends a request with a bearer token. A 401 drops the cached token and
    /// retries once with a fresh one.
    async fn send_authorized<F>(&self, build: F) -> Result<Response, StoreError>
    where
        F: Fn(&str) -> RequestBuilder,
    {
        let token = self.token.access_token().await?;
        let mut response = build(&token).send().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("Google API rejected the cached token, re-authorising");
            self.token.reset();
            let token = self.token.access_token().await?;
            response = build(&token).send().await?;
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GoogleError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl LogStore for SheetsStore {
    async fn append_rows(&self, rows: Vec<Vec<Value>>) -> Result<(), StoreError> {
        let id = self.spreadsheet_id().await?;
        let range = format!("{}:append", a1_range(&self.worksheet, Some("A1")));
        let url = values_url(&self.sheets_base, &id, &range)?;
        let count = rows.len();
        let body = json!({ "majorDimension": "ROWS", "values": rows });

        self.send_authorized(|token| {
            self.client
                .post(url.clone())
                .bearer_auth(token)
                .query(&APPEND_QUERY)
                .json(&body)
        })
        .await?;

        debug!("Appended {} rows to '{}'", count, self.worksheet);
        Ok(())
    }

    async fn read_records(&self) -> Result<Vec<Record>, StoreError> {
        let id = self.spreadsheet_id().await?;
        let url = values_url(&self.sheets_base, &id, &a1_range(&self.worksheet, None))?;

        let response = self
            .send_authorized(|token| {
                self.client
                    .get(url.clone())
                    .bearer_auth(token)
                    .query(&[("majorDimension", "ROWS")])
            })
            .await?;
        let range: ValueRange = response.json().await?;

        let records = records_from_rows(range.values);
        debug!("Read {} records from '{}'", records.len(), self.worksheet);
        Ok(records)
    }

    fn reset(&self) {
        self.token.reset();
        if matches!(self.locator, SpreadsheetLocator::Name(_)) {
            *self.spreadsheet_id.lock().unwrap_or_else(|e| e.into_inner()) = None;
        }
    }
}

/// A1 notation for a worksheet, quoting the tab name.
fn a1_range(worksheet: &str, cell: Option<&str>) -> String {
    let quoted = format!("'{}'", worksheet.replace('\'', "''"));
    match cell {
        Some(cell) => format!("{quoted}!{cell}"),
        None => quoted,
    }
}

/// `spreadsheets/{id}/values/{range}` with each segment percent-encoded.
fn values_url(base: &str, spreadsheet_id: &str, range: &str) -> Result<Url, StoreError> {
    let mut url = Url::parse(base)
        .map_err(|e| StoreError::Unavailable(format!("bad Sheets base URL: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| StoreError::Unavailable("Sheets base URL cannot take a path".to_string()))?
        .push(spreadsheet_id)
        .push("values")
        .push(range);
    Ok(url)
}

fn drive_query(name: &str) -> String {
    let escaped = name.replace('\\', "\\\\").replace('\'', "\\'");
    format!("name = '{escaped}' and mimeType = '{SPREADSHEET_MIME}' and trashed = false")
}
