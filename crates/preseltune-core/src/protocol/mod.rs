//! Serial Protocol Communication
//!
//! Implements the newline-terminated ASCII protocol spoken by the RF
//! front-end: command encoding, status parsing, transport management, and
//! device discovery.

pub mod commands;
mod commander;
mod error;
pub mod serial;
mod status;
mod transport;

#[cfg(test)]
pub(crate) mod mock;

pub use commander::{Commander, ConnectionConfig};
pub use commands::{encode_command, Command};
pub use error::ProtocolError;
pub use serial::{clear_buffers, find_device, list_ports, open_port, probe_device, PortInfo};
pub use status::{StatusResponse, FIELD_BYPASS, FIELD_FORCE_TX, FIELD_FREQUENCY, FIELD_TAG};
pub use transport::Transport;

/// Default baud rate for front-end communication
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default read timeout for command responses in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 3000;

/// Read timeout used while probing candidate ports during discovery
pub const PROBE_TIMEOUT_MS: u64 = 2000;

/// Leading tag of every well-formed status line
pub const STATUS_TAG: &str = "STST";

/// Prefix of unsolicited fault lines pushed by the device
pub const FAULT_PREFIX: &str = "ERROR";
