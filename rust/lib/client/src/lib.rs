//! QRBar code store client.
//!
//! [`CodeStore`] is the boundary between the session logic and the remote
//! store of created codes. [`HttpCodeStore`] implements it over the store's
//! JSON API:
//!
//! - `GET    /api/codes`      : list records
//! - `GET    /api/codes/{id}` : fetch one record
//! - `POST   /api/codes`      : create a record
//! - `PUT    /api/codes/{id}` : partial update
//! - `DELETE /api/codes/{id}` : delete a record
//! - `GET    /api/choices`    : format catalog data
//!
//! # Usage
//!
//! ```ignore
//! use qrbar_client::{CodeStore, HttpCodeStore};
//!
//! let store = HttpCodeStore::new("http://localhost:8000");
//! let codes = store.list().await?;
//! ```
//!
//! No call is retried. Callers decide what a failure means for their state.

pub mod model;


pub use model::{
    Choice, ChoiceSet, CodeId, CodePatch, CodeRecord, CodeType, DecodeError, NewCode,
    UnknownCodeType, WireCodeRecord,
};

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

// ── Error ───────────────────────────────────────────────────────────

/// Failure of any store call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP {status}: {message}")]
    Server { status: u16, message: String },

    #[error("network: {0}")]
    Network(#[from] reqwest::Error),

    #[error("decode: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Server { status: 404, .. })
    }
}

impl From<DecodeError> for ApiError {
    fn from(err: DecodeError) -> Self {
        ApiError::Decode(err.to_string())
    }
}

// ── CodeStore ───────────────────────────────────────────────────────

/// Create/list/delete access to the remote store of codes.
///
/// Every call is independently failable and never retried.
#[async_trait::async_trait]
pub trait CodeStore: Send + Sync + 'static {
    /// All records, in the order the store returns them. Records that fail
    /// to decode are left out; one bad row does not hide the rest.
    async fn list(&self) -> Result<Vec<CodeRecord>, ApiError>;

    /// A single record by id.
    async fn get(&self, id: CodeId) -> Result<CodeRecord, ApiError>;

    /// Persist a new record. The store assigns id and timestamps.
    async fn create(&self, code: &NewCode) -> Result<CodeRecord, ApiError>;

    /// Apply a partial update.
    async fn update(&self, id: CodeId, patch: &CodePatch) -> Result<CodeRecord, ApiError>;

    /// Remove a record. Deleting an id that no longer exists succeeds.
    async fn delete(&self, id: CodeId) -> Result<(), ApiError>;

    /// Catalog of code types and sub-formats.
    async fn fetch_choices(&self) -> Result<ChoiceSet, ApiError>;
}

// ── HttpCodeStore ───────────────────────────────────────────────────

/// [`CodeStore`] over HTTP + JSON.
pub struct HttpCodeStore {
    http: reqwest::Client,
    base_url: String,
}

impl HttpCodeStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Use a pre-configured `reqwest::Client` (proxies, headers, TLS).
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn codes_url(&self) -> String {
        format!("{}/api/codes", self.base_url)
    }

    fn code_url(&self, id: CodeId) -> String {
        format!("{}/api/codes/{}", self.base_url, id)
    }

    fn choices_url(&self) -> String {
        format!("{}/api/choices", self.base_url)
    }

    /// Map a non-success status to `ApiError::Server`.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = resp.status();
        if !status.is_success() {
            let code = status.as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Server { status: code, message: body });
        }
        Ok(resp)
    }

    /// Check status, then decode the JSON body.
    async fn parse<R: DeserializeOwned>(resp: reqwest::Response) -> Result<R, ApiError> {
        let resp = Self::check(resp).await?;
        resp.json::<R>()
            .await
            .map_err(|e| ApiError::Decode(format!("response body: {}", e)))
    }

    async fn parse_record(resp: reqwest::Response) -> Result<CodeRecord, ApiError> {
        let wire: WireCodeRecord = Self::parse(resp).await?;
        Ok(CodeRecord::try_from(wire)?)
    }
}

#[async_trait::async_trait]
impl CodeStore for HttpCodeStore {
    async fn list(&self) -> Result<Vec<CodeRecord>, ApiError> {
        let resp = self.http.get(self.codes_url()).send().await?;
        let wire: Vec<WireCodeRecord> = Self::parse(resp).await?;
        let total = wire.len();
        let records: Vec<CodeRecord> = wire
            .into_iter()
            .filter_map(|w| match CodeRecord::try_from(w) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(error = %err, "skipping undecodable code record");
                    None
                }
            })
            .collect();
        debug!(count = records.len(), skipped = total - records.len(), "listed codes");
        Ok(records)
    }

    async fn get(&self, id: CodeId) -> Result<CodeRecord, ApiError> {
        let resp = self.http.get(self.code_url(id)).send().await?;
        Self::parse_record(resp).await
    }

    async fn create(&self, code: &NewCode) -> Result<CodeRecord, ApiError> {
        let resp = self.http.post(self.codes_url()).json(code).send().await?;
        Self::parse_record(resp).await
    }

    async fn update(&self, id: CodeId, patch: &CodePatch) -> Result<CodeRecord, ApiError> {
        let resp = self.http.put(self.code_url(id)).json(patch).send().await?;
        Self::parse_record(resp).await
    }

    async fn delete(&self, id: CodeId) -> Result<(), ApiError> {
        let resp = self.http.delete(self.code_url(id)).send().await?;
        match Self::check(resp).await {
            Ok(_) => Ok(()),
            Err(err) if err.is_not_found() => {
                debug!(%id, "delete target already gone");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn fetch_choices(&self) -> Result<ChoiceSet, ApiError> {
        let resp = self.http.get(self.choices_url()).send().await?;
        Self::parse(resp).await
    }
}
