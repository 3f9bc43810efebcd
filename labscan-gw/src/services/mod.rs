//! Service modules for the scan pipeline

pub mod debounce;
pub mod feedback;
pub mod resolver;
pub mod session;
pub mod validator;

pub use debounce::{ScanDebouncer, ScanDecision, DEFAULT_COOLDOWN_MS};
pub use feedback::FeedbackMachine;
pub use resolver::{HttpResolver, LocationResolver, ResolverError, ResolverReply, WireComponent};
pub use session::{ScanSession, ScanTimings, SessionSnapshot, SubmitOutcome};
pub use validator::{ScanOutcome, ScanValidator};
