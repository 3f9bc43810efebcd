//! Barcode validation orchestration
//!
//! Turns resolver replies into session-facing outcomes. The local format
//! parse is diagnostic only: every accepted barcode goes to the resolver
//! verbatim, and the resolver's verdict is carried back untouched. Transport
//! failures surface as failed validations rather than errors, so a dead
//! resolver degrades to red feedback instead of breaking the scan loop.

use crate::services::resolver::{LocationResolver, ResolverReply};
use labscan_common::barcode;
use labscan_common::location::{BarcodeType, ValidationResult};
use serde_json::Value;
use std::sync::Arc;

/// Session-facing outcome of one validation
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    /// The barcode was (or was treated as) a location barcode
    Location {
        result: ValidationResult,
        /// Hierarchical display path; empty unless the location is valid
        path: String,
    },
    /// The resolver classified the barcode as a sample
    Sample {
        /// Resolver response body, passed through for sample consumers
        data: Value,
    },
}

/// Validates accepted barcodes against the resolver
pub struct ScanValidator {
    resolver: Arc<dyn LocationResolver>,
}

impl ScanValidator {
    pub fn new(resolver: Arc<dyn LocationResolver>) -> Self {
        Self { resolver }
    }

    /// Validate one accepted barcode.
    ///
    /// Always returns an outcome; resolver failures become location results
    /// with `success = false` and the transport error as the message.
    pub async fn validate(&self, barcode: &str) -> ScanOutcome {
        if let Err(reason) = barcode::parse(barcode) {
            tracing::debug!(
                barcode = %barcode,
                reason = %reason,
                hint = barcode::FORMAT_HINT,
                "Barcode failed local format check; submitting anyway"
            );
        }

        match self.resolver.resolve(barcode).await {
            Ok(reply) => Self::interpret(reply),
            Err(err) => {
                tracing::warn!(barcode = %barcode, error = %err, "Resolver request failed");
                ScanOutcome::Location {
                    result: ValidationResult::transport_failure(err.to_string()),
                    path: String::new(),
                }
            }
        }
    }

    fn interpret(reply: ResolverReply) -> ScanOutcome {
        // An error-only body with no classification is a failed request,
        // not a verdict about the barcode
        if reply.barcode_type.is_none() {
            if let Some(error) = reply.error {
                return ScanOutcome::Location {
                    result: ValidationResult::transport_failure(error),
                    path: String::new(),
                };
            }
        }

        match BarcodeType::classify(reply.barcode_type.as_deref()) {
            BarcodeType::Sample => {
                let data = serde_json::to_value(&reply).unwrap_or(Value::Null);
                ScanOutcome::Sample { data }
            }
            barcode_type => {
                let path = reply.hierarchical_path();
                let result = ValidationResult {
                    success: reply.valid,
                    barcode_type,
                    matched_components: reply.valid_components.unwrap_or_default(),
                    first_missing_level: reply.first_missing_level,
                    has_additional_invalid_levels: reply.has_additional_invalid_levels,
                    // A valid verdict never carries an error, whatever the wire says
                    error_message: if reply.valid { None } else { reply.error_message },
                };
                ScanOutcome::Location { result, path }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::resolver::ResolverError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct ScriptedResolver {
        reply: Mutex<Option<Result<ResolverReply, ResolverError>>>,
    }

    impl ScriptedResolver {
        fn replying(reply: Result<ResolverReply, ResolverError>) -> Arc<Self> {
            Arc::new(Self {
                reply: Mutex::new(Some(reply)),
            })
        }
    }

    #[async_trait]
    impl LocationResolver for ScriptedResolver {
        async fn resolve(&self, _barcode: &str) -> Result<ResolverReply, ResolverError> {
            self.reply
                .lock()
                .unwrap()
                .take()
                .expect("resolver called more than scripted")
        }
    }

    fn reply_from(value: serde_json::Value) -> ResolverReply {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_valid_location_outcome() {
        let reply = reply_from(json!({
            "valid": true,
            "barcodeType": "location",
            "room": { "id": 1, "code": "LAB1", "name": "Main Lab" },
            "device": { "id": 4, "code": "FRZ01", "name": "Freezer 1" },
            "validComponents": {
                "room": { "id": 1, "name": "Main Lab", "code": "LAB1" },
                "device": { "id": 4, "name": "Freezer 1", "code": "FRZ01" }
            }
        }));
        let validator = ScanValidator::new(ScriptedResolver::replying(Ok(reply)));

        match validator.validate("LAB1-FRZ01").await {
            ScanOutcome::Location { result, path } => {
                assert!(result.success);
                assert_eq!(result.barcode_type, BarcodeType::Location);
                assert_eq!(path, "Main Lab > Freezer 1");
                assert_eq!(result.matched_components.len(), 2);
                assert_eq!(result.error_message, None);
            }
            other => panic!("Expected location outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_location_keeps_partial_match() {
        let reply = reply_from(json!({
            "valid": false,
            "barcodeType": "location",
            "validComponents": {
                "room": { "id": 1, "name": "Main Lab", "code": "LAB1" }
            },
            "firstMissingLevel": "device",
            "hasAdditionalInvalidLevels": true,
            "errorMessage": "Scanned code: LAB1-BAD (Room: Main Lab, Device: BAD). Device not found"
        }));
        let validator = ScanValidator::new(ScriptedResolver::replying(Ok(reply)));

        match validator.validate("LAB1-BAD").await {
            ScanOutcome::Location { result, path } => {
                assert!(!result.success);
                assert_eq!(path, "");
                assert_eq!(result.matched_components["room"].code.as_deref(), Some("LAB1"));
                assert_eq!(result.first_missing_level.as_deref(), Some("device"));
                assert!(result.has_additional_invalid_levels);
                assert!(result
                    .error_message
                    .as_deref()
                    .unwrap()
                    .contains("Device not found"));
            }
            other => panic!("Expected location outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_valid_verdict_drops_stray_error_message() {
        let reply = reply_from(json!({
            "valid": true,
            "barcodeType": "location",
            "errorMessage": "leftover"
        }));
        let validator = ScanValidator::new(ScriptedResolver::replying(Ok(reply)));

        match validator.validate("LAB1-FRZ01").await {
            ScanOutcome::Location { result, .. } => {
                assert!(result.success);
                assert_eq!(result.error_message, None);
            }
            other => panic!("Expected location outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sample_outcome_carries_body() {
        let reply = reply_from(json!({
            "barcode": "25-00001",
            "valid": false,
            "barcodeType": "sample",
            "failedStep": "BARCODE_TYPE_MISMATCH",
            "errorMessage": "Scanned code: 25-00001. Scanned barcode appears to be a sample accession number, not a location barcode"
        }));
        let validator = ScanValidator::new(ScriptedResolver::replying(Ok(reply)));

        match validator.validate("25-00001").await {
            ScanOutcome::Sample { data } => {
                assert_eq!(data["barcodeType"], "sample");
                assert_eq!(data["valid"], false);
                assert_eq!(data["failedStep"], "BARCODE_TYPE_MISMATCH");
                assert!(data["errorMessage"]
                    .as_str()
                    .unwrap()
                    .contains("sample accession number"));
            }
            other => panic!("Expected sample outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_only_body_is_transport_failure() {
        let reply = reply_from(json!({ "error": "Storage module disabled" }));
        let validator = ScanValidator::new(ScriptedResolver::replying(Ok(reply)));

        match validator.validate("LAB1-FRZ01").await {
            ScanOutcome::Location { result, .. } => {
                assert!(!result.success);
                assert_eq!(result.barcode_type, BarcodeType::Unknown);
                assert_eq!(result.error_message.as_deref(), Some("Storage module disabled"));
                assert!(result.matched_components.is_empty());
            }
            other => panic!("Expected location outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_network_error_is_transport_failure() {
        let validator = ScanValidator::new(ScriptedResolver::replying(Err(
            ResolverError::Network("connection refused".to_string()),
        )));

        match validator.validate("LAB1-FRZ01").await {
            ScanOutcome::Location { result, path } => {
                assert!(!result.success);
                assert_eq!(path, "");
                assert_eq!(result.barcode_type, BarcodeType::Unknown);
                assert_eq!(
                    result.error_message.as_deref(),
                    Some("Network error: connection refused")
                );
            }
            other => panic!("Expected location outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unclassified_reply_treated_as_location() {
        let reply = reply_from(json!({
            "valid": false,
            "errorMessage": "Room not found"
        }));
        let validator = ScanValidator::new(ScriptedResolver::replying(Ok(reply)));

        match validator.validate("NOPE-NOPE").await {
            ScanOutcome::Location { result, .. } => {
                assert!(!result.success);
                assert_eq!(result.barcode_type, BarcodeType::Unknown);
                assert_eq!(result.error_message.as_deref(), Some("Room not found"));
            }
            other => panic!("Expected location outcome, got {:?}", other),
        }
    }
}
