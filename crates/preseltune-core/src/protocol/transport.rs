//! Serial transport
//!
//! Owns the single serial handle behind a [`Commander`](super::Commander)
//! and guarantees a usable byte stream: lazy open on first use, line-level
//! send/receive with a bounded read timeout, and non-blocking drain of
//! unsolicited data.

use serialport::SerialPort;
use std::io::{Read, Write};
use std::time::{Duration, Instant};

use super::serial::{clear_buffers, configure_port, open_port};
use super::ProtocolError;

/// Poll interval while waiting for response bytes
const POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Lazily-opened serial connection to the front-end.
///
/// Holds at most one open handle. A handle invalidated by an I/O fault is
/// dropped, so the next operation goes back through the same lazy-open path
/// instead of reusing a stale descriptor.
pub struct Transport {
    /// Serial port handle, opened on first use
    port: Option<Box<dyn SerialPort>>,
    /// Port name (e.g. "/dev/ttyUSB0" or "COM3")
    port_name: String,
    /// Baud rate used when opening
    baud_rate: u32,
    /// Read timeout for blocking line reads
    timeout: Duration,
    /// Cumulative bytes written / read
    tx_bytes: u64,
    rx_bytes: u64,
}

impl Transport {
    /// Create a transport bound to a port, without opening it
    pub fn new(port_name: impl Into<String>, baud_rate: u32, timeout: Duration) -> Self {
        Self {
            port: None,
            port_name: port_name.into(),
            baud_rate,
            timeout,
            tx_bytes: 0,
            rx_bytes: 0,
        }
    }

    /// Create a transport over an already-open port handle (tests only)
    #[cfg(test)]
    pub(crate) fn with_port(port_name: &str, port: Box<dyn SerialPort>) -> Self {
        Self {
            port: Some(port),
            port_name: port_name.to_string(),
            baud_rate: super::DEFAULT_BAUD_RATE,
            timeout: Duration::from_millis(50),
            tx_bytes: 0,
            rx_bytes: 0,
        }
    }

    /// The port this transport is bound to
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Whether a handle is currently open
    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    /// Cumulative (tx, rx) byte counters
    pub fn counters(&self) -> (u64, u64) {
        (self.tx_bytes, self.rx_bytes)
    }

    /// Open the port if no handle exists yet.
    ///
    /// Idempotent: safe to call before every operation. Two calls without an
    /// intervening close perform at most one physical open.
    pub fn ensure_open(&mut self) -> Result<(), ProtocolError> {
        if self.port.is_some() {
            return Ok(());
        }
        let mut port = open_port(&self.port_name, Some(self.baud_rate), self.timeout)?;
        configure_port(port.as_mut())?;
        clear_buffers(port.as_mut())?;
        tracing::info!(port = %self.port_name, baud_rate = self.baud_rate, "serial port opened");
        self.port = Some(port);
        Ok(())
    }

    /// Drop the handle, if any. The next operation reopens lazily.
    pub fn close(&mut self) {
        if self.port.take().is_some() {
            tracing::debug!(port = %self.port_name, "serial port closed");
        }
    }

    /// Write one command line and flush it out.
    ///
    /// Appends the `\n` terminator if the caller left it off. A successful
    /// write implies nothing about the device having acted on it.
    pub fn write_line(&mut self, line: &str) -> Result<(), ProtocolError> {
        self.ensure_open()?;
        let mut data = line.to_string();
        if !data.ends_with('\n') {
            data.push('\n');
        }
        tracing::debug!(command = %data.trim_end(), port = %self.port_name, "SEND");

        let port = self
            .port
            .as_mut()
            .ok_or_else(|| ProtocolError::SerialError("port not open".to_string()))?;
        let result = port
            .write_all(data.as_bytes())
            .and_then(|()| port.flush());
        match result {
            Ok(()) => {
                self.tx_bytes = self.tx_bytes.saturating_add(data.len() as u64);
                Ok(())
            }
            Err(e) => {
                tracing::error!(port = %self.port_name, error = %e, "write failed");
                self.port = None;
                Err(e.into())
            }
        }
    }

    /// Block up to the configured timeout for one terminator-delimited line.
    ///
    /// Returns `Ok(None)` when nothing arrived in the window; a timeout is
    /// "no data", not an error. A partial line (bytes but no terminator by
    /// the deadline) is returned as-is; the caller's tag validation rejects
    /// it if it is garbage. The trailing `\r\n`/`\n` is stripped and the
    /// bytes are decoded as UTF-8.
    pub fn read_line(&mut self) -> Result<Option<String>, ProtocolError> {
        let Some(port) = self.port.as_mut() else {
            return Ok(None);
        };
        match read_line_deadline(port.as_mut(), self.timeout) {
            Ok(Some(line)) => {
                self.rx_bytes = self.rx_bytes.saturating_add(line.len() as u64);
                tracing::debug!(message = %line, port = %self.port_name, "RECEIVED");
                Ok(Some(line))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                tracing::error!(port = %self.port_name, error = %e, "read failed");
                self.port = None;
                Err(e)
            }
        }
    }

    /// Check for already-buffered bytes without blocking
    pub fn has_pending_data(&self) -> bool {
        self.port
            .as_ref()
            .map(|port| port.bytes_to_read().unwrap_or(0) > 0)
            .unwrap_or(false)
    }

    /// Read one line from already-buffered bytes, never blocking.
    ///
    /// Returns `Ok(None)` when nothing is pending. Used to drain unsolicited
    /// fault lines the device pushes between polls.
    pub fn read_line_if_pending(&mut self) -> Result<Option<String>, ProtocolError> {
        if !self.has_pending_data() {
            return Ok(None);
        }
        let Some(port) = self.port.as_mut() else {
            return Ok(None);
        };
        match read_line_buffered(port.as_mut()) {
            Ok(line) => {
                self.rx_bytes = self.rx_bytes.saturating_add(line.len() as u64);
                tracing::debug!(message = %line, port = %self.port_name, "RECEIVED (unsolicited)");
                Ok(Some(line))
            }
            Err(e) => {
                tracing::error!(port = %self.port_name, error = %e, "drain failed");
                self.port = None;
                Err(e)
            }
        }
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.close();
    }
}

/// Accumulate bytes until a `\n` or the deadline, polling `bytes_to_read`
fn read_line_deadline(
    port: &mut dyn SerialPort,
    timeout: Duration,
) -> Result<Option<String>, ProtocolError> {
    let start = Instant::now();
    let mut buf: Vec<u8> = Vec::new();

    while start.elapsed() <= timeout {
        let available = port
            .bytes_to_read()
            .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
        if available == 0 {
            std::thread::sleep(POLL_INTERVAL);
            continue;
        }
        let mut byte = [0u8; 1];
        match port.read(&mut byte) {
            Ok(0) => break,
            Ok(_) => {
                if byte[0] == b'\n' {
                    return Ok(Some(decode_line(buf)));
                }
                buf.push(byte[0]);
            }
            Err(ref e)
                if e.kind() == std::io::ErrorKind::TimedOut
                    || e.kind() == std::io::ErrorKind::WouldBlock =>
            {
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }

    if buf.is_empty() {
        Ok(None)
    } else {
        // Deadline hit mid-line; hand back what arrived.
        Ok(Some(decode_line(buf)))
    }
}

/// Take one line out of the bytes already buffered by the OS, never sleeping
fn read_line_buffered(port: &mut dyn SerialPort) -> Result<String, ProtocolError> {
    let mut buf: Vec<u8> = Vec::new();
    loop {
        let available = port
            .bytes_to_read()
            .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
        if available == 0 {
            break;
        }
        let mut byte = [0u8; 1];
        match port.read(&mut byte) {
            Ok(0) => break,
            Ok(_) => {
                if byte[0] == b'\n' {
                    break;
                }
                buf.push(byte[0]);
            }
            Err(ref e)
                if e.kind() == std::io::ErrorKind::TimedOut
                    || e.kind() == std::io::ErrorKind::WouldBlock =>
            {
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(decode_line(buf))
}

fn decode_line(mut buf: Vec<u8>) -> String {
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    String::from_utf8_lossy(&buf).into_owned()
}
