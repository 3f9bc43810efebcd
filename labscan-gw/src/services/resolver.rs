//! Location resolver client
//!
//! Submits scanned barcodes to the upstream resolver, which owns the storage
//! hierarchy and renders the authoritative verdict. The scan pipeline talks
//! to it through the `LocationResolver` trait so tests can script replies.

use async_trait::async_trait;
use labscan_common::location::LocationComponent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Validation endpoint path, fixed by the resolver's REST surface
const VALIDATE_PATH: &str = "/rest/storage/barcode/validate";
const USER_AGENT: &str = concat!("labscan/", env!("CARGO_PKG_VERSION"));

/// Resolver client errors
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Resolver error {0}: {1}")]
    Status(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Validation request body
#[derive(Debug, Serialize)]
struct ValidateRequest<'a> {
    barcode: &'a str,
}

/// One hierarchy node in the resolver's response
///
/// Rooms and devices carry code and name, shelves and racks a label,
/// positions a coordinate. All fields are optional on the wire.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WireComponent {
    pub id: Option<i64>,
    pub code: Option<String>,
    pub name: Option<String>,
    pub label: Option<String>,
    pub coordinate: Option<String>,
}

impl WireComponent {
    /// Best human-readable text for this node, falling back to its code
    pub fn display(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or(self.label.as_deref())
            .or(self.coordinate.as_deref())
            .or(self.code.as_deref())
    }
}

/// Resolver verdict for one barcode
///
/// Sample barcodes come back with fields beyond this contract; those are
/// captured in `extra` and passed through to sample consumers untouched.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolverReply {
    pub valid: bool,
    pub barcode_type: Option<String>,
    pub room: Option<WireComponent>,
    pub device: Option<WireComponent>,
    pub shelf: Option<WireComponent>,
    pub rack: Option<WireComponent>,
    pub position: Option<WireComponent>,
    pub first_missing_level: Option<String>,
    pub valid_components: Option<BTreeMap<String, LocationComponent>>,
    pub has_additional_invalid_levels: bool,
    pub error_message: Option<String>,
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ResolverReply {
    /// Human-readable path through the storage hierarchy, top down.
    ///
    /// Only a valid location has a path; anything else is the empty string.
    pub fn hierarchical_path(&self) -> String {
        if !self.valid {
            return String::new();
        }
        [
            &self.room,
            &self.device,
            &self.shelf,
            &self.rack,
            &self.position,
        ]
        .iter()
        .filter_map(|level| level.as_ref().and_then(|c| c.display()))
        .collect::<Vec<_>>()
        .join(" > ")
    }
}

/// Seam between the scan pipeline and the upstream resolver
#[async_trait]
pub trait LocationResolver: Send + Sync {
    /// Submit one barcode for authoritative validation
    async fn resolve(&self, barcode: &str) -> Result<ResolverReply, ResolverError>;
}

/// HTTP client for the resolver's validation endpoint
pub struct HttpResolver {
    http_client: reqwest::Client,
    validate_url: String,
}

impl HttpResolver {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ResolverError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ResolverError::Network(e.to_string()))?;

        let validate_url = format!("{}{}", base_url.trim_end_matches('/'), VALIDATE_PATH);

        Ok(Self {
            http_client,
            validate_url,
        })
    }
}

#[async_trait]
impl LocationResolver for HttpResolver {
    async fn resolve(&self, barcode: &str) -> Result<ResolverReply, ResolverError> {
        tracing::debug!(barcode = %barcode, "Submitting barcode to resolver");

        let response = self
            .http_client
            .post(&self.validate_url)
            .json(&ValidateRequest { barcode })
            .send()
            .await
            .map_err(|e| ResolverError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ResolverError::Status(status.as_u16(), error_text));
        }

        let reply: ResolverReply = response
            .json()
            .await
            .map_err(|e| ResolverError::Parse(e.to_string()))?;

        tracing::debug!(
            valid = reply.valid,
            barcode_type = ?reply.barcode_type,
            "Resolver verdict received"
        );

        Ok(reply)
    }
}
