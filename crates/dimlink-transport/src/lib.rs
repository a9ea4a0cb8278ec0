//! Byte sources for the dimlink telemetry link.
//!
//! The decoder only needs an ordered stream of byte chunks. This crate
//! supplies them from:
//! - a serial port (USB CDC or UART adapter) via the `serialport` crate
//! - a capture file or stdin, for offline decoding and replay
//!
//! Everything above this layer works on the [`SerialStream`] type, which
//! implements [`std::io::Read`].

pub mod error;
pub mod serial;
pub mod stream;

pub use error::{Result, TransportError};
pub use serial::{available_ports, open, PortInfo, PortKind, SerialConfig, DEFAULT_BAUD_RATE};
pub use stream::SerialStream;
