use std::time::Duration;

use serialport::SerialPortType;
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::SerialStream;

/// Baud rate the controller firmware transmits at.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default read timeout. A timeout is an idle tick, not an error.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Serial link settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Port path (`/dev/ttyACM0`, `COM3`, ...).
    pub port: String,
    /// Line speed.
    pub baud_rate: u32,
    /// Per-read timeout.
    pub read_timeout: Duration,
}

impl SerialConfig {
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }
}

/// Open a serial port (8N1, no flow control).
pub fn open(config: &SerialConfig) -> Result<SerialStream> {
    if config.baud_rate == 0 {
        return Err(TransportError::InvalidBaudRate(config.baud_rate));
    }

    let port = serialport::new(config.port.as_str(), config.baud_rate)
        .timeout(config.read_timeout)
        .open()
        .map_err(|source| TransportError::Open {
            port: config.port.clone(),
            source,
        })?;

    info!(port = %config.port, baud = config.baud_rate, "serial port opened");
    Ok(SerialStream::from_serial(port, config.port.clone()))
}

/// How a port is attached to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    Usb,
    Pci,
    Bluetooth,
    Unknown,
}

impl PortKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PortKind::Usb => "usb",
            PortKind::Pci => "pci",
            PortKind::Bluetooth => "bluetooth",
            PortKind::Unknown => "unknown",
        }
    }
}

/// A serial port visible to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    pub kind: PortKind,
    /// USB vendor/product id, when the port is a USB device.
    pub usb_id: Option<(u16, u16)>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

/// Enumerate serial ports.
pub fn available_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(TransportError::Enumerate)?;
    debug!(count = ports.len(), "enumerated serial ports");

    Ok(ports
        .into_iter()
        .map(|port| match port.port_type {
            SerialPortType::UsbPort(usb) => PortInfo {
                name: port.port_name,
                kind: PortKind::Usb,
                usb_id: Some((usb.vid, usb.pid)),
                manufacturer: usb.manufacturer,
                product: usb.product,
            },
            SerialPortType::PciPort => PortInfo::plain(port.port_name, PortKind::Pci),
            SerialPortType::BluetoothPort => PortInfo::plain(port.port_name, PortKind::Bluetooth),
            SerialPortType::Unknown => PortInfo::plain(port.port_name, PortKind::Unknown),
        })
        .collect())
}

impl PortInfo {
    fn plain(name: String, kind: PortKind) -> Self {
        Self {
            name,
            kind,
            usb_id: None,
            manufacturer: None,
            product: None,
        }
    }
}
