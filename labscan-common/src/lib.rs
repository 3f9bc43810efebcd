//! # Labscan Common Library
//!
//! Shared code for the labscan services including:
//! - Location barcode parsing and level naming
//! - Storage location component and validation result types
//! - Event types (ScanEvent enum) and EventBus
//! - Configuration loading
//! - Common error types

pub mod barcode;
pub mod config;
pub mod error;
pub mod events;
pub mod location;

pub use error::{Error, Result};
