//! # PreselTune Core Library
//!
//! Core functionality for the PreselTune RF front-end control software.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - ASCII command encoding for the front-end serial protocol
//! - Status-response parsing (frequency, bypass relay, forced-TX state)
//! - A lazily-opened serial transport with bounded read timeouts
//! - Device auto-discovery among host serial ports
//!
//! ## Supported hardware
//!
//! Stepper-tuned preselector front-ends speaking the `ST` command family
//! (status tag `STST`) at 9600 baud.
//!
//! ## Example
//!
//! ```rust,ignore
//! use preseltune_core::protocol::{Commander, ConnectionConfig, find_device};
//!
//! // Locate the device among the host's serial ports
//! let port = find_device().expect("no front-end found");
//!
//! // Poll it
//! let mut commander = Commander::new(ConnectionConfig::for_port(port));
//! if let Some(status) = commander.get_status()? {
//!     println!("frequency: {} MHz", status.frequency().unwrap_or("?"));
//! }
//! ```

pub mod protocol;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::protocol::{
        find_device, list_ports, Command, Commander, ConnectionConfig, PortInfo, ProtocolError,
        StatusResponse,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
