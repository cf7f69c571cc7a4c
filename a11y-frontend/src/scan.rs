//! Client for the scanning backend
//!
//! Requests are addressed by their frontend path (`/api/scan`, `/api/scan/:id`)
//! and resolved through the [`RewriteTable`], so the page talks to the backend
//! exactly the way a browser going through the proxy would.

use std::fmt;

use reqwest::StatusCode;
use serde::{
    de::{self, DeserializeOwned, Deserializer},
    Deserialize, Serialize,
};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::rewrite::RewriteTable;

/// Body of a scan submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    pub url: String,
}

/// The part of the backend's answer to a submission that the page uses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScanCreated {
    #[serde(deserialize_with = "integral_id")]
    pub id: i64,
}

/// Accepts a JSON integer, or a float with no fractional part such as `42.0`.
fn integral_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let number = serde_json::Number::deserialize(deserializer)?;

    if let Some(id) = number.as_i64() {
        return Ok(id);
    }

    match number.as_f64() {
        Some(id) if id.fract() == 0.0 && id >= i64::MIN as f64 && id < i64::MAX as f64 => {
            Ok(id as i64)
        }
        _ => Err(de::Error::custom(format!(
            "scan id {number} is not an integer"
        ))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScanStatus::Pending => "pending",
            ScanStatus::Processing => "processing",
            ScanStatus::Completed => "completed",
            ScanStatus::Failed => "failed",
            ScanStatus::Unknown => "unknown",
        };

        f.write_str(label)
    }
}

/// A scan as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScanRecord {
    pub id: i64,
    pub url: String,
    pub status: ScanStatus,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub report_path: Option<String>,
}

/// Why a backend call produced no usable answer.
///
/// The `Display` output is what the page shows the user, so a rejected
/// request renders as the backend's response body and nothing else.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("{body}")]
    Rejected { status: StatusCode, body: String },

    #[error("{0}")]
    Transport(#[source] reqwest::Error),

    #[error("{0}")]
    Decode(#[source] serde_json::Error),

    #[error("no backend route for {0}")]
    Unroutable(String),
}

#[derive(Debug, Clone)]
pub struct ScanClient {
    http: reqwest::Client,
    rewrites: RewriteTable,
}

impl ScanClient {
    pub fn new(http: reqwest::Client, rewrites: RewriteTable) -> Self {
        Self { http, rewrites }
    }

    /// Submit `url` for scanning.
    #[instrument(skip(self))]
    pub async fn create(&self, url: &str) -> Result<ScanCreated, SubmitError> {
        let target = self.route("/api/scan")?;
        debug!(%target, "submitting scan");

        let response = self
            .http
            .post(target)
            .json(&ScanRequest {
                url: url.to_owned(),
            })
            .send()
            .await
            .map_err(SubmitError::Transport)?;

        decode(response).await
    }

    /// Look up a previously submitted scan.
    #[instrument(skip(self))]
    pub async fn fetch(&self, id: i64) -> Result<ScanRecord, SubmitError> {
        let target = self.route(&format!("/api/scan/{id}"))?;
        debug!(%target, "fetching scan");

        let response = self
            .http
            .get(target)
            .send()
            .await
            .map_err(SubmitError::Transport)?;

        decode(response).await
    }

    fn route(&self, path: &str) -> Result<url::Url, SubmitError> {
        self.rewrites
            .resolve(path, None)
            .ok_or_else(|| SubmitError::Unroutable(path.to_owned()))
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, SubmitError> {
    let status = response.status();
    let body = response.text().await.map_err(SubmitError::Transport)?;

    if !status.is_success() {
        debug!(%status, "backend rejected the request");
        return Err(SubmitError::Rejected { status, body });
    }

    serde_json::from_str(&body).map_err(SubmitError::Decode)
}
