//! Service-account authorisation for Google APIs.
//!
//! A signed JWT assertion is exchanged for a bearer token, which is cached
//! until shortly before it expires. `reset` forgets the cached token.

use std::sync::Mutex;

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::StoreError;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;
/// Tokens are refreshed this many seconds before Google says they expire.
const EXPIRY_MARGIN_SECS: i64 = 60;

pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive.readonly",
];

/// The fields of a service-account key file that signing needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        serde_json::from_str(json)
            .map_err(|e| StoreError::Auth(format!("invalid service account key: {e}")))
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    TOKEN_LIFETIME_SECS
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: i64,
}

/// Lazily obtains and caches a bearer token for one service account.
pub struct TokenProvider {
    client: Client,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(client: Client, key: ServiceAccountKey) -> Result<Self, StoreError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| StoreError::Auth(format!("invalid private key: {e}")))?;
        Ok(Self {
            client,
            key,
            encoding_key,
            cached: Mutex::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Returns a valid bearer token, fetching a new one when needed.
    pub async fn access_token(&self) -> Result<String, StoreError> {
        let now = Utc::now().timestamp();
        if let Some(token) = self.cached_token() {
            if token.expires_at - EXPIRY_MARGIN_SECS > now {
                return Ok(token.value);
            }
        }

        let assertion = self.sign_assertion(now)?;
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Auth(format!("token exchange returned {status}: {body}")));
        }

        let token: TokenResponse = response.json().await?;
        debug!("Obtained access token valid for {}s", token.expires_in);

        let cached = CachedToken {
            value: token.access_token,
            expires_at: now + token.expires_in,
        };
        *self.lock() = Some(cached.clone());
        Ok(cached.value)
    }

    /// Forgets the cached token; the next call re-authorises.
    pub fn reset(&self) {
        if self.lock().take().is_some() {
            info!("Discarded cached access token for {}", self.key.client_email);
        }
    }

    fn cached_token(&self) -> Option<CachedToken> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<CachedToken>> {
        self.cached.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn sign_assertion(&self, now: i64) -> Result<String, StoreError> {
        let claims = build_claims(&self.key, now);
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| StoreError::Auth(format!("failed to sign assertion: {e}")))
    }
}

fn build_claims(key: &ServiceAccountKey, now: i64) -> Claims<'_> {
    Claims {
        iss: &key.client_email,
        scope: SCOPES.join(" "),
        aud: &key.token_uri,
        iat: now,
        exp: now + TOKEN_LIFETIME_SECS,
    }
}
