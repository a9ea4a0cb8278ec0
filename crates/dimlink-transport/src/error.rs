use std::path::PathBuf;

/// Errors that can occur while opening or reading a byte source.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the serial port.
    #[error("failed to open {port}: {source}")]
    Open {
        port: String,
        source: serialport::Error,
    },

    /// Failed to open a capture file.
    #[error("failed to open capture {path}: {source}")]
    Capture {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to enumerate serial ports.
    #[error("failed to list serial ports: {0}")]
    Enumerate(serialport::Error),

    /// An I/O error occurred on the byte stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configured baud rate is not usable.
    #[error("invalid baud rate {0}")]
    InvalidBaudRate(u32),
}

pub type Result<T> = std::result::Result<T, TransportError>;
