use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Default model candidates, tried in order until one answers.
const DEFAULT_EXTRACTION_MODELS: &str =
    "models/gemini-2.5-flash,models/gemini-2.0-flash,models/gemini-1.5-flash";

/// Which Log Store backend the composition root wires in.
#[derive(Debug, Clone, PartialEq)]
pub enum LogStoreBackend {
    /// Google Sheets, the system of record.
    Sheets,
    /// In-process table for local development. Lost on restart.
    Memory,
}

/// How the spreadsheet document is located.
#[derive(Debug, Clone, PartialEq)]
pub enum SpreadsheetLocator {
    Id(String),
    /// Resolved through a Drive search on first use.
    Name(String),
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub extraction_models: Vec<String>,
    pub log_store: LogStoreBackend,
    /// Raw service-account key JSON. `None` only for the memory backend.
    pub service_account_json: Option<String>,
    pub spreadsheet: SpreadsheetLocator,
    pub worksheet: String,
    pub report_cache_ttl: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            get(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        let log_store = match get("LOG_STORE").as_deref().map(str::trim) {
            None | Some("") | Some("sheets") => LogStoreBackend::Sheets,
            Some("memory") => LogStoreBackend::Memory,
            Some(other) => bail!("LOG_STORE must be 'sheets' or 'memory', got '{other}'"),
        };

        let service_account_json = match log_store {
            LogStoreBackend::Memory => None,
            LogStoreBackend::Sheets => match get("GOOGLE_SERVICE_ACCOUNT_JSON") {
                Some(json) if !json.trim().is_empty() => Some(json),
                _ => {
                    let path = require("GOOGLE_SERVICE_ACCOUNT_FILE").context(
                        "Set GOOGLE_SERVICE_ACCOUNT_JSON or GOOGLE_SERVICE_ACCOUNT_FILE",
                    )?;
                    let json = std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read service account key '{path}'"))?;
                    Some(json)
                }
            },
        };

        let spreadsheet = match get("LOG_SPREADSHEET_ID").filter(|v| !v.trim().is_empty()) {
            Some(id) => SpreadsheetLocator::Id(id.trim().to_string()),
            None => SpreadsheetLocator::Name(
                get("LOG_SPREADSHEET_NAME").unwrap_or_else(|| "My Workout DB".to_string()),
            ),
        };

        let extraction_models = parse_model_list(
            &get("EXTRACTION_MODELS").unwrap_or_else(|| DEFAULT_EXTRACTION_MODELS.to_string()),
        );
        if extraction_models.is_empty() {
            bail!("EXTRACTION_MODELS must name at least one model");
        }

        let report_cache_ttl = Duration::from_secs(
            get("REPORT_CACHE_TTL_SECS")
                .unwrap_or_else(|| "60".to_string())
                .parse::<u64>()
                .context("REPORT_CACHE_TTL_SECS must be a whole number of seconds")?,
        );

        Ok(Config {
            gemini_api_key: require("GEMINI_API_KEY")?,
            extraction_models,
            log_store,
            service_account_json,
            spreadsheet,
            worksheet: get("LOG_WORKSHEET").unwrap_or_else(|| "Exercises".to_string()),
            report_cache_ttl,
            port: get("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
        .collect()
}
