//! Shared fixtures for labscan-gw integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use labscan_common::events::{EventBus, ScanEvent};
use labscan_gw::services::{LocationResolver, ResolverError, ResolverReply, ScanTimings};
use labscan_gw::AppState;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted resolver for tests
///
/// Replies are queued per barcode and served in order, each after its
/// scripted delay. Barcodes with no scripted reply fall back to a valid
/// two-level location.
pub struct StubResolver {
    calls: AtomicUsize,
    replies: Mutex<HashMap<String, VecDeque<(Duration, Result<ResolverReply, ResolverError>)>>>,
}

impl StubResolver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            replies: Mutex::new(HashMap::new()),
        })
    }

    /// Queue a reply for `barcode`, served after `delay`
    pub fn push(&self, barcode: &str, delay: Duration, reply: Result<ResolverReply, ResolverError>) {
        self.replies
            .lock()
            .unwrap()
            .entry(barcode.to_string())
            .or_default()
            .push_back((delay, reply));
    }

    /// Total resolve calls observed
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationResolver for StubResolver {
    async fn resolve(&self, barcode: &str) -> Result<ResolverReply, ResolverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .replies
            .lock()
            .unwrap()
            .get_mut(barcode)
            .and_then(|queue| queue.pop_front());
        match next {
            Some((delay, reply)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                reply
            }
            None => Ok(valid_location_reply()),
        }
    }
}

/// Reply for a fully valid two-level location (LAB1-FRZ01)
pub fn valid_location_reply() -> ResolverReply {
    serde_json::from_value(json!({
        "valid": true,
        "barcodeType": "location",
        "room": { "id": 1, "code": "LAB1", "name": "Main Lab" },
        "device": { "id": 4, "code": "FRZ01", "name": "Freezer 1" },
        "validComponents": {
            "room": { "id": 1, "name": "Main Lab", "code": "LAB1" },
            "device": { "id": 4, "name": "Freezer 1", "code": "FRZ01" }
        }
    }))
    .unwrap()
}

/// Reply for a location whose device level failed to match
pub fn invalid_location_reply(message: &str) -> ResolverReply {
    serde_json::from_value(json!({
        "valid": false,
        "barcodeType": "location",
        "failedStep": "LOCATION_EXISTENCE",
        "validComponents": {
            "room": { "id": 1, "name": "Main Lab", "code": "LAB1" }
        },
        "firstMissingLevel": "device",
        "errorMessage": message
    }))
    .unwrap()
}

/// Reply for a barcode the resolver could not even parse as a location
pub fn format_error_reply(barcode: &str) -> ResolverReply {
    serde_json::from_value(json!({
        "barcode": barcode,
        "valid": false,
        "barcodeType": "location",
        "failedStep": "FORMAT_VALIDATION",
        "errorMessage": format!("Scanned code: {}. Invalid barcode format.", barcode)
    }))
    .unwrap()
}

/// Reply classifying the barcode as a sample accession number
pub fn sample_reply(barcode: &str) -> ResolverReply {
    serde_json::from_value(json!({
        "barcode": barcode,
        "valid": false,
        "barcodeType": "sample",
        "failedStep": "BARCODE_TYPE_MISMATCH",
        "errorMessage": format!(
            "Scanned code: {}. Scanned barcode appears to be a sample accession number, not a location barcode",
            barcode
        )
    }))
    .unwrap()
}

/// Default pipeline timings (500ms window, 2s success clear, 3s banner)
pub fn test_timings() -> ScanTimings {
    ScanTimings::default()
}

/// Timings with a custom debounce window
pub fn timings_with_cooldown(cooldown: Duration) -> ScanTimings {
    ScanTimings {
        cooldown,
        ..ScanTimings::default()
    }
}

/// App state wired to a scripted resolver
pub fn test_state(resolver: Arc<StubResolver>, timings: ScanTimings) -> AppState {
    AppState::new(EventBus::new(100), resolver, timings)
}

/// Wait for the next event of the given type, skipping others
pub async fn next_event_of(
    rx: &mut tokio::sync::broadcast::Receiver<ScanEvent>,
    event_type: &str,
) -> ScanEvent {
    tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            match rx.recv().await {
                Ok(event) if event.event_type() == event_type => return event,
                Ok(_) => continue,
                Err(e) => panic!("Event stream closed: {}", e),
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("Timed out waiting for {}", event_type))
}
