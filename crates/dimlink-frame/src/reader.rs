use std::io::{ErrorKind, Read};

use crate::codec::DecoderConfig;
use crate::decoder::{DecoderStats, FrameDecoder, FrameEvent};
use crate::error::{FrameError, Result};

const READ_CHUNK_SIZE: usize = 1024;

/// Reads frame events from any `Read` stream.
///
/// Each call performs at most one read and hands the chunk to the decoder.
/// Read timeouts are reported as an empty batch: on a serial line silence
/// is normal and liveness is tracked elsewhere.
pub struct FrameReader<T> {
    inner: T,
    decoder: FrameDecoder,
    chunk: Box<[u8]>,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, DecoderConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: DecoderConfig) -> Self {
        Self {
            inner,
            decoder: FrameDecoder::with_config(config),
            chunk: vec![0u8; READ_CHUNK_SIZE].into_boxed_slice(),
        }
    }

    /// Read one chunk and return the events it completed.
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_events(&mut self) -> Result<Vec<FrameEvent>> {
        loop {
            let read = match self.inner.read(&mut self.chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    return Ok(Vec::new())
                }
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                self.decoder.reset();
                return Err(FrameError::ConnectionClosed);
            }

            return Ok(self.decoder.feed(&self.chunk[..read]));
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Decoder counters.
    pub fn stats(&self) -> &DecoderStats {
        self.decoder.stats()
    }

    /// Current decoder configuration.
    pub fn config(&self) -> &DecoderConfig {
        self.decoder.config()
    }
}
