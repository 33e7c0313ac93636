//! Status line parsing
//!
//! Parses the comma-separated `STST` line returned by a status request into
//! an ordered field view. Field semantics beyond zero/nonzero stay with the
//! caller; this layer only relays what the device said.

use super::{ProtocolError, STATUS_TAG};

/// Index of the literal protocol tag (`"STST"`)
pub const FIELD_TAG: usize = 0;

/// Index of the frequency/offset field, relayed as an opaque string
pub const FIELD_FREQUENCY: usize = 1;

/// Index of the bypass relay state field (`"0"` / nonzero)
pub const FIELD_BYPASS: usize = 3;

/// Index of the forced-TX state field (`"0"` / nonzero)
pub const FIELD_FORCE_TX: usize = 5;

/// Parsed view of one status line.
///
/// Fields 2 and 4 exist in the wire format but are not consumed here; they
/// pass through untouched via [`StatusResponse::fields`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusResponse {
    fields: Vec<String>,
}

impl StatusResponse {
    /// Parse a response line.
    ///
    /// The line must start with the `STST` tag; anything else is a
    /// [`ProtocolError::BadResponse`] and is not split into fields at all.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        if !line.starts_with(STATUS_TAG) {
            tracing::error!(line = %line, "bad response to status request");
            return Err(ProtocolError::BadResponse(line.to_string()));
        }
        Ok(Self {
            fields: line.split(',').map(str::to_string).collect(),
        })
    }

    /// All fields in wire order
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Get one field by index, if present
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// The frequency/offset field as the device sent it
    pub fn frequency(&self) -> Option<&str> {
        self.field(FIELD_FREQUENCY)
    }

    /// Whether the bypass relay reports engaged (field nonzero)
    pub fn bypass_active(&self) -> Option<bool> {
        self.field(FIELD_BYPASS).map(|f| f != "0")
    }

    /// Whether forced transmit mode reports active (field nonzero)
    pub fn force_tx_active(&self) -> Option<bool> {
        self.field(FIELD_FORCE_TX).map(|f| f != "0")
    }
}
