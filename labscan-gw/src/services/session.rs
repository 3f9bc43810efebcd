//! Scan session lifecycle
//!
//! A session owns one bound input: the debounce gate in front of it, the
//! visual feedback attached to it, the warning banner, and the timers that
//! clear both. Validation runs on a spawned task so the submit path never
//! waits on the resolver; a per-session sequence number ties each outcome
//! back to the submission it belongs to, and outcomes from superseded
//! submissions are dropped instead of applied out of order.

use crate::services::debounce::{self, ScanDebouncer, ScanDecision};
use crate::services::feedback::FeedbackMachine;
use crate::services::validator::{ScanOutcome, ScanValidator};
use labscan_common::config::ScanConfig;
use labscan_common::events::{EventBus, FeedbackState, ScanEvent, ScanOrigin};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Timing knobs for the scan pipeline, resolved from config once at startup
#[derive(Debug, Clone, Copy)]
pub struct ScanTimings {
    /// Debounce window between accepted scans
    pub cooldown: Duration,
    /// Delay before a success clears the bound input
    pub success_clear: Duration,
    /// Delay before a warning banner clears itself
    pub warning_clear: Duration,
    /// Inter-keystroke gap at or below which input looks scanner-fed
    pub burst_gap: Duration,
}

impl From<&ScanConfig> for ScanTimings {
    fn from(config: &ScanConfig) -> Self {
        Self {
            cooldown: Duration::from_millis(config.cooldown_ms),
            success_clear: Duration::from_millis(config.success_clear_ms),
            warning_clear: Duration::from_millis(config.warning_clear_ms),
            burst_gap: Duration::from_millis(config.burst_gap_ms),
        }
    }
}

impl Default for ScanTimings {
    fn default() -> Self {
        Self::from(&ScanConfig::default())
    }
}

/// Immediate decision returned to the scan submitter
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Scan passed the debounce gate and entered validation
    Accepted { barcode: String, sequence: u64 },
    /// Duplicate of the last scan or empty input; nothing happened
    Ignored,
    /// A different barcode arrived inside the debounce window
    Warned { remaining_ms: u64, message: String },
}

/// Point-in-time view of a session for API consumers
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub value: String,
    pub feedback: FeedbackState,
    pub message: Option<String>,
    pub warning: Option<String>,
    pub last_barcode: Option<String>,
}

/// Inter-keystroke timing tracker for scan-origin classification
///
/// Classification is advisory only. Input counts as scanner-fed when every
/// observed gap fit inside the burst threshold; a single slow gap, or no
/// timing data at all, means manual.
#[derive(Debug, Default)]
struct InputTracker {
    last_change: Option<Instant>,
    gap_count: u32,
    rapid_gaps: u32,
}

impl InputTracker {
    fn record(&mut self, now: Instant, burst_gap: Duration) {
        if let Some(last) = self.last_change {
            let gap = now.saturating_duration_since(last);
            self.gap_count += 1;
            if gap <= burst_gap {
                self.rapid_gaps += 1;
            }
        }
        self.last_change = Some(now);
    }

    fn origin(&self) -> ScanOrigin {
        if self.gap_count > 0 && self.rapid_gaps == self.gap_count {
            ScanOrigin::Scanner
        } else {
            ScanOrigin::Manual
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

struct SessionInner {
    debouncer: ScanDebouncer,
    feedback: FeedbackMachine,
    value: String,
    input: InputTracker,
    warning: Option<String>,
    clear_task: Option<JoinHandle<()>>,
    warning_task: Option<JoinHandle<()>>,
}

struct SessionShared {
    id: Uuid,
    timings: ScanTimings,
    event_bus: EventBus,
    validator: Arc<ScanValidator>,
    inner: Mutex<SessionInner>,
    /// Bumped on every accepted scan, always under the inner lock
    sequence: AtomicU64,
}

/// One scan session, cheap to clone and share
#[derive(Clone)]
pub struct ScanSession {
    shared: Arc<SessionShared>,
}

impl ScanSession {
    pub fn new(
        id: Uuid,
        timings: ScanTimings,
        event_bus: EventBus,
        validator: Arc<ScanValidator>,
    ) -> Self {
        Self {
            shared: Arc::new(SessionShared {
                id,
                timings,
                event_bus,
                validator,
                inner: Mutex::new(SessionInner {
                    debouncer: ScanDebouncer::new(timings.cooldown),
                    feedback: FeedbackMachine::default(),
                    value: String::new(),
                    input: InputTracker::default(),
                    warning: None,
                    clear_task: None,
                    warning_task: None,
                }),
                sequence: AtomicU64::new(0),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    /// Record an input edit without submitting it.
    ///
    /// Edits feed the origin classifier, cancel a pending auto-clear, and
    /// dismiss any lingering feedback so the operator types against a clean
    /// state.
    pub async fn input(&self, text: &str) {
        let now = Instant::now();
        let mut inner = self.shared.inner.lock().await;

        inner.input.record(now, self.shared.timings.burst_gap);
        inner.value = text.to_string();

        if let Some(task) = inner.clear_task.take() {
            task.abort();
        }
        if inner.feedback.state() != FeedbackState::Ready {
            let old_state = inner.feedback.clear();
            self.shared.event_bus.emit_lossy(ScanEvent::FeedbackChanged {
                session_id: self.shared.id,
                old_state,
                new_state: FeedbackState::Ready,
                message: None,
                timestamp: chrono::Utc::now(),
            });
        }
    }

    /// Submit a scan attempt and return the debounce decision.
    ///
    /// On acceptance, validation continues on a background task; its outcome
    /// arrives via the event bus.
    pub async fn submit(&self, raw_text: &str) -> SubmitOutcome {
        let now = Instant::now();
        let mut inner = self.shared.inner.lock().await;

        let text = raw_text.trim();
        if !text.is_empty() {
            inner.value = text.to_string();
        }

        match inner.debouncer.process(raw_text, now) {
            ScanDecision::Accepted(barcode) => {
                let origin = inner.input.origin();
                inner.input.reset();

                // A new acceptance supersedes any outcome still in flight
                let sequence = self.shared.sequence.fetch_add(1, Ordering::SeqCst) + 1;
                if let Some(task) = inner.clear_task.take() {
                    task.abort();
                }

                let format_valid = labscan_common::barcode::parse(&barcode).is_ok();
                self.shared.event_bus.emit_lossy(ScanEvent::ScanAccepted {
                    session_id: self.shared.id,
                    barcode: barcode.clone(),
                    origin,
                    sequence,
                    timestamp: chrono::Utc::now(),
                });
                self.shared.event_bus.emit_lossy(ScanEvent::ValidationStarted {
                    session_id: self.shared.id,
                    barcode: barcode.clone(),
                    sequence,
                    format_valid,
                    timestamp: chrono::Utc::now(),
                });
                drop(inner);

                tracing::info!(
                    session_id = %self.shared.id,
                    barcode = %barcode,
                    sequence,
                    origin = %origin,
                    "Scan accepted"
                );

                let session = self.clone();
                let submitted = barcode.clone();
                tokio::spawn(async move {
                    let outcome = session.shared.validator.validate(&submitted).await;
                    session.apply_outcome(sequence, submitted, outcome).await;
                });

                SubmitOutcome::Accepted { barcode, sequence }
            }
            ScanDecision::Ignored => {
                tracing::debug!(session_id = %self.shared.id, "Scan ignored by debounce");
                SubmitOutcome::Ignored
            }
            ScanDecision::TooSoon { remaining } => {
                let message = debounce::warning_message(remaining);
                let remaining_ms = remaining.as_millis() as u64;
                inner.warning = Some(message.clone());

                if let Some(task) = inner.warning_task.take() {
                    task.abort();
                }
                let session = self.clone();
                inner.warning_task = Some(tokio::spawn(async move {
                    tokio::time::sleep(session.shared.timings.warning_clear).await;
                    session.clear_warning().await;
                }));

                self.shared.event_bus.emit_lossy(ScanEvent::DebounceWarning {
                    session_id: self.shared.id,
                    barcode: text.to_string(),
                    remaining_ms,
                    message: message.clone(),
                    timestamp: chrono::Utc::now(),
                });

                tracing::debug!(
                    session_id = %self.shared.id,
                    remaining_ms,
                    "Scan rejected inside debounce window"
                );

                SubmitOutcome::Warned {
                    remaining_ms,
                    message,
                }
            }
        }
    }

    /// Clear the bound input and all scan state on operator request.
    pub async fn clear(&self) {
        let mut inner = self.shared.inner.lock().await;

        if let Some(task) = inner.clear_task.take() {
            task.abort();
        }
        if let Some(task) = inner.warning_task.take() {
            task.abort();
        }

        inner.debouncer.reset();
        inner.input.reset();
        inner.value.clear();

        if inner.warning.take().is_some() {
            self.shared.event_bus.emit_lossy(ScanEvent::WarningCleared {
                session_id: self.shared.id,
                timestamp: chrono::Utc::now(),
            });
        }
        if inner.feedback.state() != FeedbackState::Ready {
            let old_state = inner.feedback.clear();
            self.shared.event_bus.emit_lossy(ScanEvent::FeedbackChanged {
                session_id: self.shared.id,
                old_state,
                new_state: FeedbackState::Ready,
                message: None,
                timestamp: chrono::Utc::now(),
            });
        }
        self.shared.event_bus.emit_lossy(ScanEvent::InputCleared {
            session_id: self.shared.id,
            timestamp: chrono::Utc::now(),
        });
    }

    /// Point-in-time view of the session
    pub async fn snapshot(&self) -> SessionSnapshot {
        let inner = self.shared.inner.lock().await;
        SessionSnapshot {
            session_id: self.shared.id,
            value: inner.value.clone(),
            feedback: inner.feedback.state(),
            message: inner.feedback.message().map(str::to_string),
            warning: inner.warning.clone(),
            last_barcode: inner.debouncer.last_barcode().map(str::to_string),
        }
    }

    /// Abort outstanding timers; called when the session is closed.
    pub async fn shutdown(&self) {
        let mut inner = self.shared.inner.lock().await;
        if let Some(task) = inner.clear_task.take() {
            task.abort();
        }
        if let Some(task) = inner.warning_task.take() {
            task.abort();
        }
    }

    async fn apply_outcome(&self, sequence: u64, barcode: String, outcome: ScanOutcome) {
        let mut inner = self.shared.inner.lock().await;

        // submit() bumps the sequence under this same lock, so the check
        // cannot race a concurrent acceptance
        let latest = self.shared.sequence.load(Ordering::SeqCst);
        if sequence != latest {
            tracing::warn!(
                session_id = %self.shared.id,
                sequence,
                latest,
                "Dropping validation outcome from superseded scan"
            );
            return;
        }

        match outcome {
            ScanOutcome::Sample { data } => {
                // Sample scans never touch location feedback
                tracing::info!(session_id = %self.shared.id, barcode = %barcode, "Sample barcode scanned");
                self.shared.event_bus.emit_lossy(ScanEvent::SampleScanned {
                    session_id: self.shared.id,
                    barcode,
                    data,
                    timestamp: chrono::Utc::now(),
                });
            }
            ScanOutcome::Location { result, path } => {
                let success = result.success;
                let old_state = inner.feedback.apply(&result);
                let new_state = inner.feedback.state();
                let message = inner.feedback.message().map(str::to_string);

                if success {
                    tracing::info!(
                        session_id = %self.shared.id,
                        barcode = %barcode,
                        path = %path,
                        "Location validated"
                    );
                    self.shared.event_bus.emit_lossy(ScanEvent::LocationValidated {
                        session_id: self.shared.id,
                        barcode,
                        path,
                        result,
                        timestamp: chrono::Utc::now(),
                    });

                    // One-shot timer: give the operator a moment to see the
                    // green state, then clear the input for the next scan
                    if let Some(task) = inner.clear_task.take() {
                        task.abort();
                    }
                    let session = self.clone();
                    inner.clear_task = Some(tokio::spawn(async move {
                        tokio::time::sleep(session.shared.timings.success_clear).await;
                        session.auto_clear().await;
                    }));
                } else {
                    tracing::info!(
                        session_id = %self.shared.id,
                        barcode = %barcode,
                        error = message.as_deref().unwrap_or(""),
                        "Location validation failed"
                    );
                    self.shared.event_bus.emit_lossy(ScanEvent::ValidationFailed {
                        session_id: self.shared.id,
                        barcode,
                        result,
                        timestamp: chrono::Utc::now(),
                    });
                }

                self.shared.event_bus.emit_lossy(ScanEvent::FeedbackChanged {
                    session_id: self.shared.id,
                    old_state,
                    new_state,
                    message,
                    timestamp: chrono::Utc::now(),
                });
            }
        }
    }

    /// Delayed clear after a successful validation.
    ///
    /// Clears the input and feedback but leaves the debounce window alone:
    /// the same label scanned right after the clear is still a duplicate.
    async fn auto_clear(&self) {
        let mut inner = self.shared.inner.lock().await;
        inner.clear_task = None;
        inner.value.clear();
        inner.input.reset();

        let old_state = inner.feedback.clear();
        if old_state != FeedbackState::Ready {
            self.shared.event_bus.emit_lossy(ScanEvent::FeedbackChanged {
                session_id: self.shared.id,
                old_state,
                new_state: FeedbackState::Ready,
                message: None,
                timestamp: chrono::Utc::now(),
            });
        }
        self.shared.event_bus.emit_lossy(ScanEvent::InputCleared {
            session_id: self.shared.id,
            timestamp: chrono::Utc::now(),
        });
    }

    async fn clear_warning(&self) {
        let mut inner = self.shared.inner.lock().await;
        inner.warning_task = None;
        if inner.warning.take().is_some() {
            self.shared.event_bus.emit_lossy(ScanEvent::WarningCleared {
                session_id: self.shared.id,
                timestamp: chrono::Utc::now(),
            });
        }
    }
}
