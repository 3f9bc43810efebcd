//! Event types for the labscan event system
//!
//! Provides shared event definitions and EventBus for labscan services.

use crate::location::ValidationResult;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Visual feedback state for a scan session's bound input
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackState {
    /// No validation outcome displayed
    Ready,
    /// Last validation succeeded; clears automatically
    Success,
    /// Last validation failed; persists until the operator edits or clears
    Error,
}

impl std::fmt::Display for FeedbackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedbackState::Ready => write!(f, "ready"),
            FeedbackState::Success => write!(f, "success"),
            FeedbackState::Error => write!(f, "error"),
        }
    }
}

impl Default for FeedbackState {
    fn default() -> Self {
        FeedbackState::Ready
    }
}

/// How the accepted input most likely arrived
///
/// Classification is advisory: it comes from inter-keystroke timing and
/// never changes how a barcode is processed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScanOrigin {
    /// Input arrived in a rapid burst, consistent with a hardware scanner
    Scanner,
    /// Input arrived at human typing speed, or with no timing data
    Manual,
}

impl std::fmt::Display for ScanOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanOrigin::Scanner => write!(f, "scanner"),
            ScanOrigin::Manual => write!(f, "manual"),
        }
    }
}

/// Labscan event types
///
/// Events are broadcast via EventBus and can be serialized for SSE transmission.
/// All events carry the session UUID they belong to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ScanEvent {
    /// A scan passed the debounce gate and entered validation
    ///
    /// Triggers:
    /// - SSE: Update session activity display
    /// - Validation: Submission to the resolver follows immediately
    ScanAccepted {
        /// Session that accepted the scan
        session_id: Uuid,
        /// Trimmed barcode text
        barcode: String,
        /// Timing-based input classification
        origin: ScanOrigin,
        /// Monotonic per-session submission number
        sequence: u64,
        /// When the scan was accepted
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A different barcode arrived inside the debounce window
    ///
    /// The pending warning banner self-clears after the configured delay;
    /// see WarningCleared.
    DebounceWarning {
        /// Session that rejected the scan
        session_id: Uuid,
        /// Trimmed barcode text that was rejected
        barcode: String,
        /// Time remaining in the debounce window
        remaining_ms: u64,
        /// Operator-facing warning text
        message: String,
        /// When the warning was raised
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A debounce warning banner cleared itself
    WarningCleared {
        /// Session whose warning cleared
        session_id: Uuid,
        /// When the banner cleared
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Validation of an accepted barcode began
    ///
    /// The local format check is diagnostic only: the barcode is submitted
    /// to the resolver regardless of `format_valid`.
    ValidationStarted {
        /// Session performing the validation
        session_id: Uuid,
        /// Barcode being validated
        barcode: String,
        /// Submission number this validation belongs to
        sequence: u64,
        /// Whether the barcode parsed as a location code locally
        format_valid: bool,
        /// When validation started
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The resolver confirmed a complete, valid storage location
    ///
    /// Triggers:
    /// - SSE: Show the resolved hierarchical path
    /// - Feedback: Success state with delayed input clear
    LocationValidated {
        /// Session that validated the location
        session_id: Uuid,
        /// Barcode that was validated
        barcode: String,
        /// Human-readable hierarchical path ("Room > Device > ...")
        path: String,
        /// Full validation result as returned to the session
        result: ValidationResult,
        /// When validation completed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Validation completed without a valid location
    ///
    /// Covers resolver rejections and transport failures alike; the result
    /// distinguishes them via its error message and matched components.
    ValidationFailed {
        /// Session whose validation failed
        session_id: Uuid,
        /// Barcode that failed validation
        barcode: String,
        /// Full validation result as returned to the session
        result: ValidationResult,
        /// When validation completed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The resolver classified the barcode as a sample, not a location
    ///
    /// Sample scans bypass location feedback entirely.
    SampleScanned {
        /// Session that scanned the sample
        session_id: Uuid,
        /// Sample barcode
        barcode: String,
        /// Raw resolver response body for downstream consumers
        data: serde_json::Value,
        /// When the sample scan resolved
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The session's visual feedback state changed
    FeedbackChanged {
        /// Session whose feedback changed
        session_id: Uuid,
        /// Feedback state before the change
        old_state: FeedbackState,
        /// Feedback state after the change
        new_state: FeedbackState,
        /// Message accompanying the new state, if any
        message: Option<String>,
        /// When the state changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The session's bound input value was cleared
    ///
    /// Emitted both for the delayed clear after a success and for an
    /// explicit clear request.
    InputCleared {
        /// Session whose input cleared
        session_id: Uuid,
        /// When the input cleared
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A scan session was closed and removed
    SessionClosed {
        /// Session that closed
        session_id: Uuid,
        /// When the session closed
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl ScanEvent {
    /// Get event type as string for filtering
    pub fn event_type(&self) -> &str {
        match self {
            ScanEvent::ScanAccepted { .. } => "ScanAccepted",
            ScanEvent::DebounceWarning { .. } => "DebounceWarning",
            ScanEvent::WarningCleared { .. } => "WarningCleared",
            ScanEvent::ValidationStarted { .. } => "ValidationStarted",
            ScanEvent::LocationValidated { .. } => "LocationValidated",
            ScanEvent::ValidationFailed { .. } => "ValidationFailed",
            ScanEvent::SampleScanned { .. } => "SampleScanned",
            ScanEvent::FeedbackChanged { .. } => "FeedbackChanged",
            ScanEvent::InputCleared { .. } => "InputCleared",
            ScanEvent::SessionClosed { .. } => "SessionClosed",
        }
    }

    /// Get the session this event belongs to
    pub fn session_id(&self) -> Uuid {
        match self {
            ScanEvent::ScanAccepted { session_id, .. }
            | ScanEvent::DebounceWarning { session_id, .. }
            | ScanEvent::WarningCleared { session_id, .. }
            | ScanEvent::ValidationStarted { session_id, .. }
            | ScanEvent::LocationValidated { session_id, .. }
            | ScanEvent::ValidationFailed { session_id, .. }
            | ScanEvent::SampleScanned { session_id, .. }
            | ScanEvent::FeedbackChanged { session_id, .. }
            | ScanEvent::InputCleared { session_id, .. }
            | ScanEvent::SessionClosed { session_id, .. } => *session_id,
        }
    }
}

/// Central event distribution bus for application-wide events
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use labscan_common::events::{EventBus, ScanEvent};
/// use std::sync::Arc;
///
/// let event_bus = Arc::new(EventBus::new(1000));
///
/// // Subscribe to events
/// let mut rx = event_bus.subscribe();
///
/// // Emit an event
/// event_bus.emit(ScanEvent::InputCleared {
///     session_id: uuid::Uuid::new_v4(),
///     timestamp: chrono::Utc::now(),
/// }).ok();
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ScanEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Returns a receiver that will receive all events emitted after subscription.
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: ScanEvent,
    ) -> Result<usize, broadcast::error::SendError<ScanEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Useful for non-critical events where it's acceptable if no component
    /// is currently listening.
    ///
    /// # Examples
    ///
    /// ```
    /// use labscan_common::events::{EventBus, ScanEvent};
    ///
    /// let event_bus = EventBus::new(100);
    ///
    /// // Banner clears are OK to drop if no one is listening
    /// event_bus.emit_lossy(ScanEvent::WarningCleared {
    ///     session_id: uuid::Uuid::new_v4(),
    ///     timestamp: chrono::Utc::now(),
    /// });
    /// ```
    pub fn emit_lossy(&self, event: ScanEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    ///
    /// Useful for debugging and monitoring
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
