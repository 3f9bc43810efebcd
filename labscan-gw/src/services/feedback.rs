//! Visual feedback state machine
//!
//! Tracks what the bound input should display: ready, success, or error.
//! The machine itself is pure state; the timer that clears a success after
//! its display delay is owned by the session, which also cancels it when a
//! newer outcome arrives.

use labscan_common::events::FeedbackState;
use labscan_common::location::ValidationResult;

/// Feedback for one bound input
///
/// Success is transient and cleared on a timer. Error persists until the
/// operator edits the input or clears it.
#[derive(Debug, Clone, Default)]
pub struct FeedbackMachine {
    state: FeedbackState,
    message: Option<String>,
}

impl FeedbackMachine {
    pub fn state(&self) -> FeedbackState {
        self.state
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Apply a validation outcome; returns the state it replaced.
    pub fn apply(&mut self, result: &ValidationResult) -> FeedbackState {
        let old = self.state;
        self.state = if result.success {
            FeedbackState::Success
        } else {
            FeedbackState::Error
        };
        self.message = result.error_message.clone();
        old
    }

    /// Return to ready; returns the state it replaced.
    pub fn clear(&mut self) -> FeedbackState {
        let old = self.state;
        self.state = FeedbackState::Ready;
        self.message = None;
        old
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labscan_common::location::BarcodeType;

    fn success_result() -> ValidationResult {
        ValidationResult {
            success: true,
            barcode_type: BarcodeType::Location,
            ..ValidationResult::default()
        }
    }

    fn error_result(message: &str) -> ValidationResult {
        ValidationResult {
            success: false,
            barcode_type: BarcodeType::Location,
            error_message: Some(message.to_string()),
            ..ValidationResult::default()
        }
    }

    #[test]
    fn test_starts_ready() {
        let machine = FeedbackMachine::default();
        assert_eq!(machine.state(), FeedbackState::Ready);
        assert_eq!(machine.message(), None);
    }

    #[test]
    fn test_success_outcome() {
        let mut machine = FeedbackMachine::default();
        let old = machine.apply(&success_result());
        assert_eq!(old, FeedbackState::Ready);
        assert_eq!(machine.state(), FeedbackState::Success);
        assert_eq!(machine.message(), None);
    }

    #[test]
    fn test_error_outcome_keeps_message() {
        let mut machine = FeedbackMachine::default();
        machine.apply(&error_result("Device not found"));
        assert_eq!(machine.state(), FeedbackState::Error);
        assert_eq!(machine.message(), Some("Device not found"));
    }

    #[test]
    fn test_new_outcome_replaces_previous() {
        let mut machine = FeedbackMachine::default();
        machine.apply(&error_result("Device not found"));
        let old = machine.apply(&success_result());
        assert_eq!(old, FeedbackState::Error);
        assert_eq!(machine.state(), FeedbackState::Success);
        assert_eq!(machine.message(), None);
    }

    #[test]
    fn test_clear_returns_previous_state() {
        let mut machine = FeedbackMachine::default();
        machine.apply(&error_result("Device not found"));
        let old = machine.clear();
        assert_eq!(old, FeedbackState::Error);
        assert_eq!(machine.state(), FeedbackState::Ready);
        assert_eq!(machine.message(), None);
    }
}
