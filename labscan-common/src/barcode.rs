//! Location barcode parsing and level naming
//!
//! Location barcodes are hyphen-separated component lists, positional from
//! the top of the storage hierarchy down: `ROOM-DEVICE[-SHELF[-RACK[-POSITION]]]`.
//! Parsing is purely local and diagnostic; authoritative validation happens
//! at the resolver.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum number of hyphen-separated components in a location barcode
pub const MIN_COMPONENTS: usize = 2;
/// Maximum number of hyphen-separated components in a location barcode
pub const MAX_COMPONENTS: usize = 5;

/// Operator-facing hint describing the accepted barcode shapes
pub const FORMAT_HINT: &str =
    "Invalid barcode format. Expected format: ROOM-DEVICE or ROOM-DEVICE-SHELF-RACK-POSITION";

/// Local barcode format errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Barcode is empty")]
    Empty,

    #[error("Barcode has no '-' separator")]
    MissingSeparator,

    #[error("Barcode has {0} components, maximum is 5")]
    TooManyComponents(usize),

    #[error("Barcode component {0} is empty")]
    EmptyComponent(usize),
}

/// A location barcode split into its hierarchy components
///
/// Components are positional: the first is always the room, the second the
/// device, and the optional remainder descends shelf, rack, position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedBarcode {
    pub room: String,
    pub device: String,
    pub shelf: Option<String>,
    pub rack: Option<String>,
    pub position: Option<String>,
}

impl ParsedBarcode {
    /// Hierarchy depth encoded by this barcode (2 through 5)
    pub fn level(&self) -> usize {
        MIN_COMPONENTS
            + [&self.shelf, &self.rack, &self.position]
                .iter()
                .filter(|c| c.is_some())
                .count()
    }

    /// Components in hierarchy order, top down
    pub fn components(&self) -> Vec<&str> {
        let mut parts = vec![self.room.as_str(), self.device.as_str()];
        parts.extend(self.shelf.as_deref());
        parts.extend(self.rack.as_deref());
        parts.extend(self.position.as_deref());
        parts
    }
}

impl std::fmt::Display for ParsedBarcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.components().join("-"))
    }
}

/// Parse a raw barcode string into its location components.
///
/// Whitespace is trimmed around the whole string and around each component.
/// Never panics; malformed input comes back as a `FormatError`.
pub fn parse(raw: &str) -> Result<ParsedBarcode, FormatError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(FormatError::Empty);
    }
    if !text.contains('-') {
        return Err(FormatError::MissingSeparator);
    }

    let parts: Vec<&str> = text.split('-').collect();
    if parts.len() > MAX_COMPONENTS {
        return Err(FormatError::TooManyComponents(parts.len()));
    }

    let mut components = Vec::with_capacity(parts.len());
    for (index, part) in parts.iter().enumerate() {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            return Err(FormatError::EmptyComponent(index + 1));
        }
        components.push(trimmed.to_string());
    }

    let mut iter = components.into_iter();
    let (room, device) = match (iter.next(), iter.next()) {
        (Some(room), Some(device)) => (room, device),
        // Unreachable: a string containing '-' splits into at least two parts
        _ => return Err(FormatError::MissingSeparator),
    };

    Ok(ParsedBarcode {
        room,
        device,
        shelf: iter.next(),
        rack: iter.next(),
        position: iter.next(),
    })
}

/// Human-readable name of the hierarchy level a component count encodes
pub fn level_name(level: usize) -> &'static str {
    match level {
        2 => "Device",
        3 => "Shelf",
        4 => "Rack",
        5 => "Position",
        _ => "Unknown",
    }
}
