use bytes::{Buf, BytesMut};
use tracing::{debug, trace, warn};

use crate::codec::{
    DecoderConfig, Frame, END_MARKER, HEADER_SIZE, MIN_FRAME_SIZE, START_MARKER, TERMINATOR,
};
use crate::escape::{escape_byte, unescape, unescape_byte};

/// A well-framed unit that was nevertheless rejected, or a buffer reset.
///
/// None of these stop decoding. Bad trailers are not reported here; they are
/// skipped silently while resynchronizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeWarning {
    /// The frame came from a source other than the configured one. `id` is
    /// the raw byte as transmitted.
    #[error("unexpected source id {id:#04x}")]
    UnexpectedSource { id: u8 },

    /// The payload length is not the configured telemetry layout size.
    #[error("payload length {actual} does not match expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    /// The working buffer hit its bound without yielding a frame and was cleared.
    #[error("working buffer overflow ({buffered} bytes, limit {limit}), buffer cleared")]
    BufferOverflow { buffered: usize, limit: usize },
}

/// Output of [`FrameDecoder::feed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    Frame(Frame),
    Warning(DecodeWarning),
}

impl FrameEvent {
    /// The frame, if this event carries one.
    pub fn into_frame(self) -> Option<Frame> {
        match self {
            FrameEvent::Frame(frame) => Some(frame),
            FrameEvent::Warning(_) => None,
        }
    }
}

/// Running counters for one decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    pub bytes_received: u64,
    pub frames: u64,
    pub unexpected_source: u64,
    pub length_mismatch: u64,
    pub overflows: u64,
    /// Bytes discarded while hunting for a start marker or skipping a bad trailer.
    pub resync_bytes: u64,
}

impl DecoderStats {
    /// Total warnings emitted.
    pub fn warnings(&self) -> u64 {
        self.unexpected_source + self.length_mismatch + self.overflows
    }
}

/// Stateful, resynchronizing frame decoder.
///
/// Owns the working buffer exclusively. Feed it chunks in arrival order;
/// chunk boundaries carry no meaning, so one-byte chunks and one large
/// chunk produce the same event sequence.
#[derive(Debug)]
pub struct FrameDecoder {
    buf: BytesMut,
    config: DecoderConfig,
    stats: DecoderStats,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    /// Create a decoder with default configuration.
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    /// Create a decoder with explicit configuration.
    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(config.buffer_limit()),
            config,
            stats: DecoderStats::default(),
        }
    }

    /// Append a chunk and decode as many frames as it completes.
    ///
    /// The chunk is appended in slices that fit the free room of the working
    /// buffer. When the buffer is full and the loop cannot consume anything,
    /// the next incoming byte overflows it: the buffer is cleared and a
    /// [`DecodeWarning::BufferOverflow`] is emitted before appending resumes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<FrameEvent> {
        let mut events = Vec::new();
        let limit = self.config.buffer_limit();
        let mut rest = chunk;
        self.stats.bytes_received += chunk.len() as u64;

        while !rest.is_empty() {
            let room = limit.saturating_sub(self.buf.len());
            if room == 0 {
                let buffered = self.buf.len();
                self.buf.clear();
                self.stats.overflows += 1;
                warn!(buffered, limit, "working buffer overflow, clearing");
                events.push(FrameEvent::Warning(DecodeWarning::BufferOverflow {
                    buffered,
                    limit,
                }));
                continue;
            }

            let take = room.min(rest.len());
            self.buf.extend_from_slice(&rest[..take]);
            rest = &rest[take..];
            self.drain(&mut events);
        }

        events
    }

    /// Run the framing loop until it needs more bytes.
    fn drain(&mut self, events: &mut Vec<FrameEvent>) {
        loop {
            if self.buf.len() < MIN_FRAME_SIZE {
                return;
            }

            let Some(start) = self.buf.iter().position(|&b| b == START_MARKER) else {
                trace!(dropped = self.buf.len(), "no start marker, discarding buffer");
                self.stats.resync_bytes += self.buf.len() as u64;
                self.buf.clear();
                return;
            };

            if start > 0 {
                debug!(dropped = start, "skipping bytes before start marker");
                self.stats.resync_bytes += start as u64;
                self.buf.advance(start);
                if self.buf.len() < MIN_FRAME_SIZE {
                    return;
                }
            }

            let payload_len = self.buf[1] as usize;
            let full_frame_size = MIN_FRAME_SIZE + payload_len;
            if self.buf.len() < full_frame_size {
                return;
            }

            if self.buf[full_frame_size - 2] != END_MARKER
                || self.buf[full_frame_size - 1] != TERMINATOR
            {
                // Skip only the presumed start marker so a real frame starting
                // inside this one is still found.
                trace!(payload_len, "bad trailer, resynchronizing");
                self.stats.resync_bytes += 1;
                self.buf.advance(1);
                continue;
            }

            let wire = self.buf.split_to(full_frame_size);
            events.push(self.accept(&wire, payload_len));
        }
    }

    /// Validate a trailer-checked frame.
    fn accept(&mut self, wire: &[u8], payload_len: usize) -> FrameEvent {
        // The id byte is always sent escaped, so a literal 0x00 is foreign.
        let raw_id = wire[2];
        if raw_id != escape_byte(self.config.source_id) {
            self.stats.unexpected_source += 1;
            warn!(
                source_id = unescape_byte(raw_id),
                raw = raw_id,
                "frame from unexpected source"
            );
            return FrameEvent::Warning(DecodeWarning::UnexpectedSource { id: raw_id });
        }

        let payload = unescape(&wire[HEADER_SIZE..HEADER_SIZE + payload_len]);
        if payload.len() != self.config.payload_len {
            self.stats.length_mismatch += 1;
            warn!(
                expected = self.config.payload_len,
                actual = payload.len(),
                "payload length mismatch"
            );
            return FrameEvent::Warning(DecodeWarning::LengthMismatch {
                expected: self.config.payload_len,
                actual: payload.len(),
            });
        }

        self.stats.frames += 1;
        let source_id = unescape_byte(raw_id);
        FrameEvent::Frame(Frame { source_id, payload })
    }

    /// Drop any partially buffered frame. Counters are kept.
    pub fn reset(&mut self) {
        if !self.buf.is_empty() {
            debug!(discarded = self.buf.len(), "discarding partial frame");
        }
        self.buf.clear();
    }

    /// Bytes currently held in the working buffer.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Counters since construction.
    pub fn stats(&self) -> &DecoderStats {
        &self.stats
    }

    /// Current decoder configuration.
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }
}
