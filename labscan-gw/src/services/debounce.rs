//! Scan debouncing
//!
//! A hardware scanner held over a label fires the same barcode several times
//! per second. The debouncer admits the first read and suppresses repeats
//! inside a cooldown window; a different barcode inside the window is rejected
//! with the time remaining, so the operator can be warned instead of silently
//! losing the scan.
//!
//! Time is passed in by the caller, which keeps every decision deterministic
//! under test.

use std::time::{Duration, Instant};

/// Default cooldown between accepted scans
pub const DEFAULT_COOLDOWN_MS: u64 = 500;

/// Decision for one scan attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanDecision {
    /// Scan passed the gate; carries the trimmed barcode text
    Accepted(String),
    /// Duplicate of the last accepted barcode inside the window, or empty input
    Ignored,
    /// A different barcode arrived inside the window
    TooSoon {
        /// Time left until the window reopens
        remaining: Duration,
    },
}

#[derive(Debug, Clone)]
struct LastScan {
    barcode: String,
    at: Instant,
}

/// Debounce gate in front of barcode validation
///
/// Holds at most one remembered scan: the barcode and the instant it was
/// accepted, always set together or not at all.
#[derive(Debug, Clone)]
pub struct ScanDebouncer {
    last: Option<LastScan>,
    cooldown: Duration,
}

impl Default for ScanDebouncer {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_COOLDOWN_MS))
    }
}

impl ScanDebouncer {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            last: None,
            cooldown,
        }
    }

    /// Gate one scan attempt observed at `now`.
    ///
    /// Empty or whitespace-only input is ignored without touching the window.
    /// A rejected scan never updates the remembered state, so the window keeps
    /// running from the scan that opened it.
    pub fn process(&mut self, raw_text: &str, now: Instant) -> ScanDecision {
        let text = raw_text.trim();
        if text.is_empty() {
            return ScanDecision::Ignored;
        }

        if let Some(last) = &self.last {
            let elapsed = now.saturating_duration_since(last.at);
            if elapsed < self.cooldown {
                if last.barcode == text {
                    return ScanDecision::Ignored;
                }
                return ScanDecision::TooSoon {
                    remaining: self.cooldown - elapsed,
                };
            }
        }

        self.last = Some(LastScan {
            barcode: text.to_string(),
            at: now,
        });
        ScanDecision::Accepted(text.to_string())
    }

    /// Forget the remembered scan, reopening the window immediately
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Barcode of the last accepted scan, if any
    pub fn last_barcode(&self) -> Option<&str> {
        self.last.as_ref().map(|l| l.barcode.as_str())
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }
}

/// Operator-facing text for a scan rejected inside the debounce window.
///
/// Remaining time is reported in whole seconds, rounded up so the banner
/// never claims zero wait while the window is still open.
pub fn warning_message(remaining: Duration) -> String {
    let remaining_ms = remaining.as_millis() as u64;
    let seconds = (remaining_ms + 999) / 1000;
    format!("Please wait {}s before scanning another barcode", seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debouncer_500ms() -> ScanDebouncer {
        ScanDebouncer::new(Duration::from_millis(500))
    }

    #[test]
    fn test_first_scan_accepted() {
        let mut debouncer = debouncer_500ms();
        let now = Instant::now();

        let decision = debouncer.process("LAB1-FRZ01", now);
        assert_eq!(decision, ScanDecision::Accepted("LAB1-FRZ01".to_string()));
        assert_eq!(debouncer.last_barcode(), Some("LAB1-FRZ01"));
    }

    #[test]
    fn test_duplicate_within_window_ignored() {
        let mut debouncer = debouncer_500ms();
        let t0 = Instant::now();

        debouncer.process("LAB1-FRZ01", t0);
        let decision = debouncer.process("LAB1-FRZ01", t0 + Duration::from_millis(100));
        assert_eq!(decision, ScanDecision::Ignored);
    }

    #[test]
    fn test_distinct_within_window_warns() {
        let mut debouncer = debouncer_500ms();
        let t0 = Instant::now();

        debouncer.process("LAB1-FRZ01", t0);
        let decision = debouncer.process("LAB2-FRZ02", t0 + Duration::from_millis(200));
        assert_eq!(
            decision,
            ScanDecision::TooSoon {
                remaining: Duration::from_millis(300),
            }
        );
        // The rejected scan must not displace the remembered one
        assert_eq!(debouncer.last_barcode(), Some("LAB1-FRZ01"));
    }

    #[test]
    fn test_rejected_scan_does_not_extend_window() {
        let mut debouncer = debouncer_500ms();
        let t0 = Instant::now();

        debouncer.process("A-B", t0);
        debouncer.process("C-D", t0 + Duration::from_millis(100));
        // Window still runs from t0, so the third attempt sees 300ms left
        let decision = debouncer.process("E-F", t0 + Duration::from_millis(200));
        assert_eq!(
            decision,
            ScanDecision::TooSoon {
                remaining: Duration::from_millis(300),
            }
        );
        // And the warned barcode is accepted once the original window lapses
        let decision = debouncer.process("C-D", t0 + Duration::from_millis(500));
        assert_eq!(decision, ScanDecision::Accepted("C-D".to_string()));
    }

    #[test]
    fn test_same_barcode_after_window_accepted_again() {
        let mut debouncer = debouncer_500ms();
        let t0 = Instant::now();

        debouncer.process("LAB1-FRZ01", t0);
        let decision = debouncer.process("LAB1-FRZ01", t0 + Duration::from_millis(500));
        assert_eq!(decision, ScanDecision::Accepted("LAB1-FRZ01".to_string()));

        // The accepted re-scan restarts the window
        let decision = debouncer.process("LAB2-FRZ02", t0 + Duration::from_millis(600));
        assert_eq!(
            decision,
            ScanDecision::TooSoon {
                remaining: Duration::from_millis(400),
            }
        );
    }

    #[test]
    fn test_empty_input_ignored_without_state_change() {
        let mut debouncer = debouncer_500ms();
        let t0 = Instant::now();

        assert_eq!(debouncer.process("", t0), ScanDecision::Ignored);
        assert_eq!(debouncer.process("   ", t0), ScanDecision::Ignored);
        assert_eq!(debouncer.last_barcode(), None);

        debouncer.process("A-B", t0);
        assert_eq!(
            debouncer.process("  ", t0 + Duration::from_millis(100)),
            ScanDecision::Ignored
        );
        assert_eq!(debouncer.last_barcode(), Some("A-B"));
    }

    #[test]
    fn test_whitespace_trimmed_before_comparison() {
        let mut debouncer = debouncer_500ms();
        let t0 = Instant::now();

        debouncer.process("LAB1-FRZ01", t0);
        let decision = debouncer.process("  LAB1-FRZ01  ", t0 + Duration::from_millis(100));
        assert_eq!(decision, ScanDecision::Ignored);
    }

    #[test]
    fn test_reset_reopens_window() {
        let mut debouncer = debouncer_500ms();
        let t0 = Instant::now();

        debouncer.process("A-B", t0);
        debouncer.reset();
        assert_eq!(debouncer.last_barcode(), None);

        let decision = debouncer.process("C-D", t0 + Duration::from_millis(10));
        assert_eq!(decision, ScanDecision::Accepted("C-D".to_string()));
    }

    #[test]
    fn test_warning_message_rounds_seconds_up() {
        assert_eq!(
            warning_message(Duration::from_millis(1)),
            "Please wait 1s before scanning another barcode"
        );
        assert_eq!(
            warning_message(Duration::from_millis(500)),
            "Please wait 1s before scanning another barcode"
        );
        assert_eq!(
            warning_message(Duration::from_millis(1000)),
            "Please wait 1s before scanning another barcode"
        );
        assert_eq!(
            warning_message(Duration::from_millis(1001)),
            "Please wait 2s before scanning another barcode"
        );
    }
}
