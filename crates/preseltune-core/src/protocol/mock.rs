//! Scripted serial port for exercising the transport and commander without
//! hardware. Incoming bytes are pre-loaded; everything written is recorded
//! behind a shared handle so tests can assert exact wire traffic after the
//! port has been moved into a [`Transport`](super::Transport).

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serialport::{
    ClearBuffer, DataBits, Error, ErrorKind, FlowControl, Parity, SerialPort, StopBits,
};

pub(crate) struct MockPort {
    /// Bytes the "device" will produce, in order
    rx: VecDeque<u8>,
    /// Everything the host wrote, shared with the test
    written: Arc<Mutex<Vec<u8>>>,
    /// When set, every write fails with a broken pipe
    fail_writes: bool,
    timeout: Duration,
}

impl MockPort {
    pub(crate) fn new() -> Self {
        Self {
            rx: VecDeque::new(),
            written: Arc::new(Mutex::new(Vec::new())),
            fail_writes: false,
            timeout: Duration::from_millis(50),
        }
    }

    /// A port whose device answers with the given bytes
    pub(crate) fn with_response(bytes: &[u8]) -> Self {
        let mut port = Self::new();
        port.rx.extend(bytes);
        port
    }

    /// A port whose writes all fail at the OS level
    pub(crate) fn failing_writes() -> Self {
        let mut port = Self::new();
        port.fail_writes = true;
        port
    }

    /// Handle onto the written-bytes log, valid after the port is moved
    pub(crate) fn written(&self) -> Arc<Mutex<Vec<u8>>> {
        Arc::clone(&self.written)
    }
}

impl Read for MockPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.rx.is_empty() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "mock: no data"));
        }
        let n = buf.len().min(self.rx.len());
        for slot in buf[..n].iter_mut() {
            *slot = self.rx.pop_front().expect("length checked above");
        }
        Ok(n)
    }
}

impl Write for MockPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock: write fault"));
        }
        self.written.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock: flush fault"));
        }
        Ok(())
    }
}

impl SerialPort for MockPort {
    fn name(&self) -> Option<String> {
        Some("mock0".to_string())
    }

    fn baud_rate(&self) -> serialport::Result<u32> {
        Ok(super::DEFAULT_BAUD_RATE)
    }

    fn data_bits(&self) -> serialport::Result<DataBits> {
        Ok(DataBits::Eight)
    }

    fn flow_control(&self) -> serialport::Result<FlowControl> {
        Ok(FlowControl::None)
    }

    fn parity(&self) -> serialport::Result<Parity> {
        Ok(Parity::None)
    }

    fn stop_bits(&self) -> serialport::Result<StopBits> {
        Ok(StopBits::One)
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn set_baud_rate(&mut self, _baud_rate: u32) -> serialport::Result<()> {
        Ok(())
    }

    fn set_data_bits(&mut self, _data_bits: DataBits) -> serialport::Result<()> {
        Ok(())
    }

    fn set_flow_control(&mut self, _flow_control: FlowControl) -> serialport::Result<()> {
        Ok(())
    }

    fn set_parity(&mut self, _parity: Parity) -> serialport::Result<()> {
        Ok(())
    }

    fn set_stop_bits(&mut self, _stop_bits: StopBits) -> serialport::Result<()> {
        Ok(())
    }

    fn set_timeout(&mut self, timeout: Duration) -> serialport::Result<()> {
        self.timeout = timeout;
        Ok(())
    }

    fn write_request_to_send(&mut self, _level: bool) -> serialport::Result<()> {
        Ok(())
    }

    fn write_data_terminal_ready(&mut self, _level: bool) -> serialport::Result<()> {
        Ok(())
    }

    fn read_clear_to_send(&mut self) -> serialport::Result<bool> {
        Ok(false)
    }

    fn read_data_set_ready(&mut self) -> serialport::Result<bool> {
        Ok(false)
    }

    fn read_ring_indicator(&mut self) -> serialport::Result<bool> {
        Ok(false)
    }

    fn read_carrier_detect(&mut self) -> serialport::Result<bool> {
        Ok(false)
    }

    fn bytes_to_read(&self) -> serialport::Result<u32> {
        Ok(self.rx.len() as u32)
    }

    fn bytes_to_write(&self) -> serialport::Result<u32> {
        Ok(0)
    }

    fn clear(&self, _buffer_to_clear: ClearBuffer) -> serialport::Result<()> {
        // The mock never holds stale OS buffers.
        Ok(())
    }

    fn try_clone(&self) -> serialport::Result<Box<dyn SerialPort>> {
        Err(Error::new(ErrorKind::Unknown, "mock port cannot be cloned"))
    }

    fn set_break(&self) -> serialport::Result<()> {
        Ok(())
    }

    fn clear_break(&self) -> serialport::Result<()> {
        Ok(())
    }
}
