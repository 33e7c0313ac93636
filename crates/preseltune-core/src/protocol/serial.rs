//! Serial port handling
//!
//! Low-level port access plus device auto-discovery: enumerate candidate
//! ports, probe each one briefly for the front-end's status tag, and hand
//! the first confirmed match to the caller.

use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use std::collections::HashMap;
#[cfg(target_os = "linux")]
use std::fs;
use std::time::Duration;

use super::commands::{encode_command, Command};
use super::{ProtocolError, DEFAULT_BAUD_RATE, PROBE_TIMEOUT_MS, STATUS_TAG};

/// Information about an available serial port
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// Port name (e.g., "/dev/ttyUSB0" or "COM3")
    pub name: String,

    /// USB vendor ID (if USB device)
    pub vid: Option<u16>,

    /// USB product ID (if USB device)
    pub pid: Option<u16>,

    /// Manufacturer name (if available)
    pub manufacturer: Option<String>,

    /// Product name (if available)
    pub product: Option<String>,

    /// Serial number (if available)
    pub serial_number: Option<String>,
}

impl PortInfo {
    fn bare(name: String) -> Self {
        Self {
            name,
            vid: None,
            pid: None,
            manufacturer: None,
            product: None,
            serial_number: None,
        }
    }
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let mut port = Self::bare(info.port_name);
        if let SerialPortType::UsbPort(usb) = info.port_type {
            port.vid = Some(usb.vid);
            port.pid = Some(usb.pid);
            port.manufacturer = usb.manufacturer;
            port.product = usb.product;
            port.serial_number = usb.serial_number;
        }
        port
    }
}

/// Sort key giving USB-serial adapters priority over legacy nodes:
/// ttyACM* first, then ttyUSB* (each in numeric suffix order), then the rest
/// by name.
fn port_sort_key(name: &str) -> (u8, usize, String) {
    let basename = name.rsplit('/').next().unwrap_or(name);
    let numbered = |rest: &str| rest.parse::<usize>().unwrap_or(usize::MAX);
    match (
        basename.strip_prefix("ttyACM"),
        basename.strip_prefix("ttyUSB"),
    ) {
        (Some(rest), _) => (0, numbered(rest), basename.to_string()),
        (_, Some(rest)) => (1, numbered(rest), basename.to_string()),
        _ => (2, 0, basename.to_string()),
    }
}

/// List available serial ports in deterministic order.
///
/// Combines the serialport enumeration with a Linux `/dev` scan for
/// `ttyACM*`/`ttyUSB*` nodes the API sometimes misses. Only serial device
/// nodes are considered.
pub fn list_ports() -> Vec<PortInfo> {
    let mut map: HashMap<String, PortInfo> = HashMap::new();
    for info in serialport::available_ports().unwrap_or_default() {
        let port = PortInfo::from(info);
        map.entry(port.name.clone()).or_insert(port);
    }

    #[cfg(target_os = "linux")]
    if let Ok(entries) = fs::read_dir("/dev") {
        for entry in entries.flatten() {
            if let Some(fname) = entry.file_name().to_str() {
                if fname.starts_with("ttyACM") || fname.starts_with("ttyUSB") {
                    let full = format!("/dev/{}", fname);
                    map.entry(full.clone()).or_insert_with(|| PortInfo::bare(full));
                }
            }
        }
    }

    let mut ports: Vec<PortInfo> = map.into_values().collect();
    ports.sort_by_key(|p| port_sort_key(&p.name));
    ports
}

/// Open a serial port with the given read timeout
pub fn open_port(
    name: &str,
    baud_rate: Option<u32>,
    timeout: Duration,
) -> Result<Box<dyn SerialPort>, ProtocolError> {
    let baud = baud_rate.unwrap_or(DEFAULT_BAUD_RATE);
    serialport::new(name, baud)
        .timeout(timeout)
        .open()
        .map_err(|e| ProtocolError::SerialError(format!("{}: {}", name, e)))
}

/// Configure a serial port for front-end communication (standard 8N1)
pub fn configure_port(port: &mut dyn SerialPort) -> Result<(), ProtocolError> {
    port.set_data_bits(serialport::DataBits::Eight)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
    port.set_parity(serialport::Parity::None)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
    port.set_stop_bits(serialport::StopBits::One)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
    port.set_flow_control(serialport::FlowControl::None)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))
}

/// Clear the serial port buffers
pub fn clear_buffers(port: &mut dyn SerialPort) -> Result<(), ProtocolError> {
    port.clear(serialport::ClearBuffer::All)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))
}

/// Probe an open port for the front-end.
///
/// Sends a status request and reads up to 4 bytes within the port's own
/// timeout; the device is confirmed when they are exactly the status tag.
/// Any write failure, short read, or mismatch is simply "not our device".
pub fn probe_device(port: &mut dyn SerialPort) -> bool {
    use std::io::{Read, Write};

    let request = encode_command(Command::GetStatus, "");
    if let Err(e) = port
        .write_all(request.as_bytes())
        .and_then(|()| port.flush())
    {
        tracing::debug!(error = %e, "probe write failed");
        return false;
    }

    let mut tag = [0u8; 4];
    let mut filled = 0;
    while filled < tag.len() {
        match port.read(&mut tag[filled..]) {
            Ok(0) => return false,
            Ok(n) => filled += n,
            Err(_) => return false,
        }
    }
    &tag[..] == STATUS_TAG.as_bytes()
}

/// First port in `ports` that the probe confirms; the discovery policy.
fn find_first_responding<F>(ports: &[PortInfo], mut probe: F) -> Option<String>
where
    F: FnMut(&str) -> bool,
{
    ports
        .iter()
        .find(|port| probe(&port.name))
        .map(|port| port.name.clone())
}

/// Find the serial port the front-end is connected to.
///
/// Each candidate is opened briefly at 9600 baud with a short timeout,
/// probed, and released again whatever the outcome, so a confirmed port is
/// free for the commander to claim afterwards. Returns `None` when no port
/// answers, so callers can fall back to manual selection rather than
/// failing hard.
pub fn find_device() -> Option<String> {
    find_first_responding(&list_ports(), |name| {
        match serialport::new(name, DEFAULT_BAUD_RATE)
            .timeout(Duration::from_millis(PROBE_TIMEOUT_MS))
            .open()
        {
            Ok(mut port) => {
                let confirmed = probe_device(port.as_mut());
                if confirmed {
                    tracing::debug!(port = %name, "front-end found");
                }
                confirmed
                // port handle dropped here, releasing the device
            }
            Err(e) => {
                tracing::debug!(port = %name, error = %e, "probe open failed");
                false
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::mock::MockPort;
    use pretty_assertions::assert_eq;

    fn bare_ports(names: &[&str]) -> Vec<PortInfo> {
        names
            .iter()
            .map(|n| PortInfo::bare(n.to_string()))
            .collect()
    }

    #[test]
    fn test_port_sorting() {
        let mut ports = bare_ports(&[
            "/dev/ttyUSB1",
            "/dev/ttyACM1",
            "/dev/ttyUSB0",
            "/dev/ttyACM0",
            "/dev/someport",
            "/dev/ttyACM10",
        ]);
        ports.sort_by_key(|p| port_sort_key(&p.name));
        let ordered: Vec<String> = ports.into_iter().map(|p| p.name).collect();

        assert_eq!(
            ordered,
            vec![
                "/dev/ttyACM0",
                "/dev/ttyACM1",
                "/dev/ttyACM10",
                "/dev/ttyUSB0",
                "/dev/ttyUSB1",
                "/dev/someport",
            ]
        );
    }

    #[test]
    fn test_list_ports_does_not_panic() {
        for port in &list_ports() {
            println!("Found port: {} - {:?}", port.name, port.product);
        }
    }

    #[test]
    fn test_probe_confirms_on_status_tag() {
        let mut mock = MockPort::with_response(b"STST,433.500,0,0,0,0\r\n");
        let written = mock.written();
        assert!(probe_device(&mut mock));
        assert_eq!(*written.lock().unwrap(), b"ST?\n");
    }

    #[test]
    fn test_probe_rejects_other_talkers() {
        let mut mock = MockPort::with_response(b"GARBAGE\r\n");
        assert!(!probe_device(&mut mock));
    }

    #[test]
    fn test_probe_rejects_silence_and_short_reads() {
        let mut mock = MockPort::new();
        assert!(!probe_device(&mut mock));

        let mut mock = MockPort::with_response(b"STS");
        assert!(!probe_device(&mut mock));
    }

    #[test]
    fn test_probe_rejects_dead_port() {
        let mut mock = MockPort::failing_writes();
        assert!(!probe_device(&mut mock));
    }

    #[test]
    fn test_discovery_returns_first_match() {
        let ports = bare_ports(&["/dev/ttyACM0", "/dev/ttyUSB0", "/dev/ttyUSB1"]);
        let mut probed = Vec::new();
        let found = find_first_responding(&ports, |name| {
            probed.push(name.to_string());
            name == "/dev/ttyUSB0"
        });
        assert_eq!(found.as_deref(), Some("/dev/ttyUSB0"));
        // Stops at the first confirmation; ttyUSB1 is never touched.
        assert_eq!(probed, vec!["/dev/ttyACM0", "/dev/ttyUSB0"]);
    }

    #[test]
    fn test_discovery_not_found_is_none() {
        let ports = bare_ports(&["/dev/ttyACM0", "/dev/ttyUSB0"]);
        assert_eq!(find_first_responding(&ports, |_| false), None);
        assert_eq!(find_first_responding(&[], |_| true), None);
    }
}
