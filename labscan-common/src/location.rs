//! Storage location component and validation result types
//!
//! These are the session-facing shapes: what a validation produced, which
//! hierarchy levels matched, and where the hierarchy broke off. The wire
//! types for the resolver protocol live with the resolver client.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resolver-assigned classification of a scanned barcode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BarcodeType {
    /// A storage location barcode
    Location,
    /// A sample accession barcode
    Sample,
    /// Classification unavailable (transport failure or unrecognized type)
    Unknown,
}

impl BarcodeType {
    /// Map the resolver's `barcodeType` string to a classification.
    ///
    /// Anything other than the two known values, including an absent field,
    /// is Unknown and handled like a location.
    pub fn classify(wire: Option<&str>) -> Self {
        match wire {
            Some("location") => BarcodeType::Location,
            Some("sample") => BarcodeType::Sample,
            _ => BarcodeType::Unknown,
        }
    }
}

impl std::fmt::Display for BarcodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BarcodeType::Location => write!(f, "location"),
            BarcodeType::Sample => write!(f, "sample"),
            BarcodeType::Unknown => write!(f, "unknown"),
        }
    }
}

impl Default for BarcodeType {
    fn default() -> Self {
        BarcodeType::Unknown
    }
}

/// One matched hierarchy component as reported by the resolver
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationComponent {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub code: Option<String>,
}

/// Outcome of validating one scanned barcode
///
/// Matched components and the first missing level are carried verbatim from
/// the resolver; partial matches keep whatever prefix of the hierarchy the
/// resolver recognized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the resolver confirmed a complete, valid location
    pub success: bool,
    /// Resolver classification of the barcode
    pub barcode_type: BarcodeType,
    /// Hierarchy levels the resolver matched, keyed by lowercase level name
    pub matched_components: BTreeMap<String, LocationComponent>,
    /// Lowercase name of the first hierarchy level that failed to match
    pub first_missing_level: Option<String>,
    /// Whether levels below the first missing one were also invalid
    pub has_additional_invalid_levels: bool,
    /// Operator-facing error text; None when the validation succeeded
    pub error_message: Option<String>,
}

impl ValidationResult {
    /// Result for a validation that never produced a resolver verdict
    /// (network failure, non-success status, or an error-only body).
    pub fn transport_failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            barcode_type: BarcodeType::Unknown,
            error_message: Some(message.into()),
            ..Self::default()
        }
    }
}
