//! Protocol errors

use thiserror::Error;

/// Errors that can occur during front-end communication.
///
/// Transport failures, protocol violations, and device-reported faults are
/// separate variants so callers can react differently to each: a transport
/// failure means the port should be re-selected, a bad response means the
/// wrong device is on the line, a device fault is the hardware talking.
///
/// A read timeout is deliberately NOT an error; operations that may time out
/// return `Ok(None)` instead.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The serial port could not be opened or configured
    #[error("serial port error: {0}")]
    SerialError(String),

    /// A read or write on an open port failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A response arrived but does not carry the expected status tag;
    /// carries the raw line
    #[error("bad response from device: {0:?}")]
    BadResponse(String),

    /// The device pushed an unsolicited fault line; carries the raw text
    #[error("device fault: {0}")]
    DeviceFault(String),

    /// `step_filter` was called with a delta outside {-10, -1, 1, 10}
    #[error("unsupported filter step: {0}")]
    InvalidStep(i32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = ProtocolError::SerialError("permission denied".into());
        assert_eq!(e.to_string(), "serial port error: permission denied");

        let e = ProtocolError::DeviceFault("ERROR overcurrent".into());
        assert_eq!(e.to_string(), "device fault: ERROR overcurrent");

        let e = ProtocolError::InvalidStep(7);
        assert_eq!(e.to_string(), "unsupported filter step: 7");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broken");
        let e: ProtocolError = io_err.into();
        assert!(matches!(e, ProtocolError::Io(_)));
    }
}
