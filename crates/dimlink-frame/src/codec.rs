use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::escape::{escape_byte, escape_into};

/// Frame start sentinel.
pub const START_MARKER: u8 = 0x02;

/// Frame end sentinel.
pub const END_MARKER: u8 = 0x03;

/// Must immediately follow [`END_MARKER`].
pub const TERMINATOR: u8 = 0x0A;

/// Header: start (1) + length (1) + source id (1) = 3 bytes.
pub const HEADER_SIZE: usize = 3;

/// Trailer: end marker (1) + terminator (1) = 2 bytes.
pub const TRAILER_SIZE: usize = 2;

/// Smallest possible frame (empty payload).
pub const MIN_FRAME_SIZE: usize = HEADER_SIZE + TRAILER_SIZE;

/// The length field is a single byte.
pub const MAX_PAYLOAD: usize = u8::MAX as usize;

/// Source id of the primary telemetry controller.
pub const PRIMARY_SOURCE_ID: u8 = 0;

const TELEMETRY_MOTORS: usize = 3;
const TELEMETRY_MOTOR_RECORD: usize = 17;
const TELEMETRY_DEVICE_RECORD: usize = 4;

/// Payload length of the standard telemetry layout: three motor records
/// followed by the device record. Must match
/// `dimlink_telemetry::PAYLOAD_SIZE`; `dimlink-session` tests check it.
pub const DEFAULT_PAYLOAD_LEN: usize =
    TELEMETRY_MOTORS * TELEMETRY_MOTOR_RECORD + TELEMETRY_DEVICE_RECORD;

/// Working buffer holds at most this many full frames.
pub const DEFAULT_OVERFLOW_FACTOR: usize = 3;

/// A validated frame from the primary source.
///
/// The payload has already been through escape substitution and has the
/// configured length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Decoded source id.
    pub source_id: u8,
    /// Interpreted payload bytes.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(source_id: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            source_id,
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame (header + payload + trailer).
    pub fn wire_size(&self) -> usize {
        MIN_FRAME_SIZE + self.payload.len()
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌───────┬─────────┬──────────┬──────────────────────┬───────┬───────┐
/// │ Start │ Length  │ Source   │ Payload              │ End   │ Term  │
/// │ 0x02  │ (1B)    │ (1B, esc)│ (Length bytes, esc)  │ 0x03  │ 0x0A  │
/// └───────┴─────────┴──────────┴──────────────────────┴───────┴───────┘
/// ```
///
/// The length byte is written as-is; source id and payload are escaped.
pub fn encode_frame(source_id: u8, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    encode_frame_with_trailer(source_id, payload, [END_MARKER, TERMINATOR], dst)
}

/// Encode a frame with an arbitrary trailer.
///
/// Only useful for fault injection: anything other than `[0x03, 0x0A]`
/// produces a frame the decoder will reject.
pub fn encode_frame_with_trailer(
    source_id: u8,
    payload: &[u8],
    trailer: [u8; TRAILER_SIZE],
    dst: &mut BytesMut,
) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    dst.reserve(MIN_FRAME_SIZE + payload.len());
    dst.put_u8(START_MARKER);
    dst.put_u8(payload.len() as u8);
    dst.put_u8(escape_byte(source_id));
    escape_into(payload, dst);
    dst.put_slice(&trailer);
    Ok(())
}

/// Configuration for the frame decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Only frames from this source id are accepted. Default: 0.
    pub source_id: u8,
    /// Expected interpreted payload length. Default: 55.
    pub payload_len: usize,
    /// Working buffer bound, in full frames. Default: 3.
    pub overflow_factor: usize,
}

impl DecoderConfig {
    /// Wire size of one expected frame.
    pub fn full_frame_size(&self) -> usize {
        MIN_FRAME_SIZE + self.payload_len
    }

    /// Maximum number of bytes the working buffer may hold.
    pub fn buffer_limit(&self) -> usize {
        self.overflow_factor.max(1) * self.full_frame_size()
    }

    /// Same configuration with a different expected payload length.
    pub fn with_payload_len(mut self, payload_len: usize) -> Self {
        self.payload_len = payload_len;
        self
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            source_id: PRIMARY_SOURCE_ID,
            payload_len: DEFAULT_PAYLOAD_LEN,
            overflow_factor: DEFAULT_OVERFLOW_FACTOR,
        }
    }
}
