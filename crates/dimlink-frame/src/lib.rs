//! Frame decoding for the dimlink serial telemetry link.
//!
//! The controller firmware streams fixed-layout telemetry frames:
//! - a `0x02` start marker
//! - a 1-byte payload length and a 1-byte source id
//! - the payload, where a transmitted `0x0F` stands for a literal `0`
//! - a `0x03 0x0A` trailer
//!
//! [`FrameDecoder`] accepts arbitrary chunks, resynchronizes on corruption
//! one byte at a time, and never buffers more than a few frames' worth of
//! bytes. Callers get validated, unescaped payloads.

pub mod codec;
pub mod decoder;
pub mod error;
pub mod escape;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_codec;

#[cfg(feature = "async")]
pub use async_codec::FrameCodec;
pub use codec::{
    encode_frame, encode_frame_with_trailer, DecoderConfig, Frame, DEFAULT_OVERFLOW_FACTOR,
    DEFAULT_PAYLOAD_LEN, END_MARKER, HEADER_SIZE, MAX_PAYLOAD, MIN_FRAME_SIZE, PRIMARY_SOURCE_ID,
    START_MARKER, TERMINATOR, TRAILER_SIZE,
};
pub use decoder::{DecodeWarning, DecoderStats, FrameDecoder, FrameEvent};
pub use error::{FrameError, Result};
pub use escape::{escape_byte, unescape, unescape_byte, ESCAPED_ZERO};
pub use reader::FrameReader;
pub use writer::FrameWriter;
