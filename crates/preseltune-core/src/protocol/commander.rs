//! Commander
//!
//! The public face of the communication layer. One commander owns one
//! transport; callers issue one request at a time and decide themselves what
//! a status field or a raised fault means. Control operations are
//! fire-and-forget: the device acknowledges nothing, and its state is
//! observed through the next status poll.

use std::time::Duration;

use super::commands::{encode_command, Command};
use super::status::StatusResponse;
use super::transport::Transport;
use super::{ProtocolError, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT_MS, FAULT_PREFIX};

/// Connection configuration
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Serial port name
    pub port_name: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Response timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ConnectionConfig {
    /// Config for a given port with the default baud rate and timeout
    pub fn for_port(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            ..Default::default()
        }
    }
}

/// Front-end commander over a single, lazily-opened serial connection.
pub struct Commander {
    transport: Transport,
    config: ConnectionConfig,
}

impl Commander {
    /// Create a commander. The port is not opened until the first operation.
    pub fn new(config: ConnectionConfig) -> Self {
        let transport = Transport::new(
            config.port_name.clone(),
            config.baud_rate,
            Duration::from_millis(config.timeout_ms),
        );
        Self { transport, config }
    }

    /// Wrap an existing transport (tests only)
    #[cfg(test)]
    pub(crate) fn with_transport(transport: Transport) -> Self {
        let config = ConnectionConfig::for_port(transport.port_name());
        Self { transport, config }
    }

    /// The configuration this commander was built with
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// The port this commander is bound to
    pub fn port_name(&self) -> &str {
        self.transport.port_name()
    }

    /// Whether the serial handle is currently open
    pub fn is_connected(&self) -> bool {
        self.transport.is_open()
    }

    /// Bind to a different port.
    ///
    /// Closes any open handle; the new port is opened lazily by the next
    /// operation.
    pub fn select_port(&mut self, port_name: impl Into<String>) {
        let port_name = port_name.into();
        tracing::info!(port = %port_name, "switching serial port");
        self.config.port_name = port_name.clone();
        self.transport = Transport::new(
            port_name,
            self.config.baud_rate,
            Duration::from_millis(self.config.timeout_ms),
        );
    }

    /// Engage or release the bypass relay. Fire-and-forget.
    pub fn set_bypass(&mut self, on: bool) -> Result<(), ProtocolError> {
        let command = if on {
            Command::BypassOn
        } else {
            Command::BypassOff
        };
        self.send(command, "")
    }

    /// Force transmit mode on or off. Fire-and-forget.
    pub fn set_force_tx(&mut self, on: bool) -> Result<(), ProtocolError> {
        let command = if on {
            Command::ModeTxOn
        } else {
            Command::ModeTxOff
        };
        self.send(command, "")
    }

    /// Re-home the filter stepper. Fire-and-forget.
    pub fn reset_filter(&mut self) -> Result<(), ProtocolError> {
        self.send(Command::FilterStepReset, "")
    }

    /// Step the filter frequency by `delta` ∈ {-10, -1, 1, 10}.
    ///
    /// Anything else is a caller contract violation and is rejected before
    /// any encoding happens. The logical direction maps through the inverted
    /// wire opcodes (see [`Command::prefix`]): `step_filter(1)` transmits
    /// `ST-1`, `step_filter(-10)` transmits `ST+10`.
    pub fn step_filter(&mut self, delta: i32) -> Result<(), ProtocolError> {
        let (command, magnitude) = match delta {
            1 | 10 => (Command::FilterStepUp, delta),
            -1 | -10 => (Command::FilterStepDown, -delta),
            _ => return Err(ProtocolError::InvalidStep(delta)),
        };
        self.send(command, &magnitude.to_string())
    }

    /// Poll the device for a status line.
    ///
    /// Returns `Ok(None)` when nothing arrived in the timeout window: a
    /// failed poll, not a crash. A line that does not start with the status
    /// tag raises [`ProtocolError::BadResponse`]; the connection itself
    /// stays valid.
    pub fn get_status(&mut self) -> Result<Option<StatusResponse>, ProtocolError> {
        self.send(Command::GetStatus, "")?;
        match self.transport.read_line()? {
            Some(line) => StatusResponse::parse(&line).map(Some),
            None => {
                tracing::debug!(port = %self.transport.port_name(), "status poll: no data");
                Ok(None)
            }
        }
    }

    /// Drain device-initiated fault notifications, without blocking.
    ///
    /// If no bytes are pending this does nothing, not even a read. A pending
    /// line starting with `ERROR` raises [`ProtocolError::DeviceFault`]
    /// carrying the raw text; other unsolicited lines are discarded.
    pub fn check_for_error(&mut self) -> Result<(), ProtocolError> {
        while let Some(line) = self.transport.read_line_if_pending()? {
            if line.starts_with(FAULT_PREFIX) {
                return Err(ProtocolError::DeviceFault(line));
            }
            tracing::debug!(line = %line, "discarding unsolicited line");
        }
        Ok(())
    }

    fn send(&mut self, command: Command, parameter: &str) -> Result<(), ProtocolError> {
        self.transport.ensure_open()?;
        self.transport.write_line(&encode_command(command, parameter))
    }
}
