use std::fs::File;
use std::io::Read;
use std::path::Path;

use serialport::SerialPort;

use crate::error::{Result, TransportError};

/// A connected byte source: implements `Read`.
///
/// This is the fundamental I/O type handed to the decoding session.
/// Live links wrap an open serial port; offline decoding wraps a capture
/// file or any other reader.
pub struct SerialStream {
    inner: SerialStreamInner,
    name: String,
}

enum SerialStreamInner {
    Serial(Box<dyn SerialPort>),
    Capture(Box<dyn Read + Send>),
}

impl Read for SerialStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            SerialStreamInner::Serial(port) => port.read(buf),
            SerialStreamInner::Capture(reader) => reader.read(buf),
        }
    }
}

impl SerialStream {
    pub(crate) fn from_serial(port: Box<dyn SerialPort>, name: impl Into<String>) -> Self {
        Self {
            inner: SerialStreamInner::Serial(port),
            name: name.into(),
        }
    }

    /// Wrap an arbitrary reader (replay buffers, pipes, test fixtures).
    pub fn from_reader(reader: impl Read + Send + 'static, name: impl Into<String>) -> Self {
        Self {
            inner: SerialStreamInner::Capture(Box::new(reader)),
            name: name.into(),
        }
    }

    /// Open a capture file of raw wire bytes. `-` reads stdin.
    pub fn open_capture(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str() == std::ffi::OsStr::new("-") {
            return Ok(Self::from_reader(std::io::stdin(), "stdin"));
        }
        let file = File::open(path).map_err(|source| TransportError::Capture {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(?path, "opened capture file");
        Ok(Self::from_reader(file, path.display().to_string()))
    }

    /// Port name or capture path this stream reads from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Discard bytes the OS has buffered but we have not read yet.
    ///
    /// Used when a session starts so the first decode does not chew through
    /// a backlog of stale frames.
    pub fn discard_input(&mut self) -> Result<()> {
        match &mut self.inner {
            SerialStreamInner::Serial(port) => port
                .clear(serialport::ClearBuffer::Input)
                .map_err(|err| TransportError::Io(err.into())),
            SerialStreamInner::Capture(_) => Ok(()),
        }
    }

    /// Close the stream, releasing the port.
    pub fn close(self) {
        tracing::debug!(name = %self.name, "closing stream");
        drop(self.inner);
    }
}

impl std::fmt::Debug for SerialStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.inner {
            SerialStreamInner::Serial(_) => "serial",
            SerialStreamInner::Capture(_) => "capture",
        };
        f.debug_struct("SerialStream")
            .field("type", &kind)
            .field("name", &self.name)
            .finish()
    }
}
