//! Remote collector client.
//!
//! Uploads are fire-and-forget: the collector endpoint is response-opaque,
//! so "upload succeeded" means "the request was dispatched without a
//! transport error", never a server-confirmed write. The reconciliation
//! fetch is how true remote state is observed later. Do not "upgrade" this
//! to response-verified success — that would change retry behavior.

mod wire;

pub use wire::{RemoteEntry, UploadDocument};

use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::ObservationRecord;

/// Fragment that marks a never-configured endpoint template.
pub const ENDPOINT_PLACEHOLDER_FRAGMENT: &str = "/s/.../exec";

const UPLOAD_CONTENT_TYPE: &str = "text/plain;charset=utf-8";

/// Configuration-readiness check: a usable endpoint is non-empty and is not
/// the unconfigured placeholder. Failing this is a silent no-op for both
/// operations, not an error.
#[must_use]
pub fn endpoint_ready(endpoint: &str) -> bool {
    let endpoint = endpoint.trim();
    !endpoint.is_empty() && !endpoint.contains(ENDPOINT_PLACEHOLDER_FRAGMENT)
}

/// Outcome of an upload attempt that did not error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadDispatch {
    /// The request left the device without a transport error
    Dispatched,
    /// Endpoint unset or placeholder; nothing was sent
    NotConfigured,
}

/// Trait seam for the collector, so orchestration can be tested against
/// scripted transports.
#[allow(async_fn_in_trait)]
pub trait Collector {
    /// Serialize and dispatch one record to the collector.
    async fn upload(&self, endpoint: &str, record: &ObservationRecord) -> Result<UploadDispatch>;

    /// Fetch the full remote dataset. Empty when the endpoint is not
    /// configured.
    async fn fetch_all(&self, endpoint: &str) -> Result<Vec<RemoteEntry>>;
}

/// HTTP client for the collector endpoint
#[derive(Clone, Default)]
pub struct CollectorClient {
    http: reqwest::Client,
}

impl CollectorClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Collector for CollectorClient {
    async fn upload(&self, endpoint: &str, record: &ObservationRecord) -> Result<UploadDispatch> {
        if !endpoint_ready(endpoint) {
            tracing::debug!("collector endpoint not configured, skipping upload");
            return Ok(UploadDispatch::NotConfigured);
        }

        let body = serde_json::to_string(&UploadDocument::from_record(record))?;
        self.http
            .post(endpoint)
            .header(CONTENT_TYPE, UPLOAD_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        // The response status and body are deliberately not inspected.
        tracing::debug!("dispatched record {} to collector", record.id);
        Ok(UploadDispatch::Dispatched)
    }

    async fn fetch_all(&self, endpoint: &str) -> Result<Vec<RemoteEntry>> {
        if !endpoint_ready(endpoint) {
            tracing::debug!("collector endpoint not configured, skipping fetch");
            return Ok(Vec::new());
        }

        let response = self.http.get(endpoint).send().await?.error_for_status()?;
        let payload: Value = response.json().await?;

        parse_snapshot(&payload)
    }
}

/// Interpret the fetch payload: an array of rows, or a recognized error
/// document the collector emits instead.
fn parse_snapshot(payload: &Value) -> Result<Vec<RemoteEntry>> {
    match payload {
        Value::Array(rows) => Ok(rows.iter().filter_map(RemoteEntry::from_value).collect()),
        Value::Object(fields) => {
            if fields.get("status").and_then(Value::as_str) == Some("error") {
                let message = fields
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("collector reported an error")
                    .to_string();
                return Err(Error::InvalidResponseShape(message));
            }
            Err(Error::InvalidResponseShape(
                "expected a JSON array of records".to_string(),
            ))
        }
        _ => Err(Error::InvalidResponseShape(
            "expected a JSON array of records".to_string(),
        )),
    }
}
