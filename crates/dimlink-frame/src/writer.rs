use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_frame, encode_frame_with_trailer, Frame, TRAILER_SIZE};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 512;

/// Writes complete frames to any `Write` stream.
///
/// The host never transmits telemetry; this exists for simulators, replay
/// fixtures and loopback tests.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Write a complete frame (blocking).
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.send(frame.source_id, frame.payload.as_ref())
    }

    /// Encode and send a payload from `source_id`.
    pub fn send(&mut self, source_id: u8, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_frame(source_id, payload, &mut self.buf)?;
        self.write_buffered()
    }

    /// Encode and send a payload with a deliberately chosen trailer.
    pub fn send_with_trailer(
        &mut self,
        source_id: u8,
        payload: &[u8],
        trailer: [u8; TRAILER_SIZE],
    ) -> Result<()> {
        self.buf.clear();
        encode_frame_with_trailer(source_id, payload, trailer, &mut self.buf)?;
        self.write_buffered()
    }

    /// Write bytes verbatim, outside any frame.
    pub fn send_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.buf.clear();
        self.buf.extend_from_slice(bytes);
        self.write_buffered()
    }

    fn write_buffered(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::codec::{DEFAULT_PAYLOAD_LEN, MAX_PAYLOAD};
    use crate::decoder::{FrameDecoder, FrameEvent};

    fn written(writer: FrameWriter<Cursor<Vec<u8>>>) -> Vec<u8> {
        writer.into_inner().into_inner()
    }

    #[test]
    fn write_single_frame() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send(0, &[0x22; DEFAULT_PAYLOAD_LEN]).unwrap();

        let wire = written(writer);
        let mut decoder = FrameDecoder::new();
        let events = decoder.feed(&wire);
        assert!(matches!(&events[..], [FrameEvent::Frame(f)] if f.payload[0] == 0x22));
    }

    #[test]
    fn write_frame_matches_send() {
        let frame = Frame::new(0, vec![0x33; DEFAULT_PAYLOAD_LEN]);

        let mut a = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        a.write_frame(&frame).unwrap();
        let mut b = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        b.send(0, &frame.payload).unwrap();

        assert_eq!(written(a), written(b));
    }

    #[test]
    fn corrupted_trailer_is_skipped_by_decoder() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer
            .send_with_trailer(0, &[0x44; DEFAULT_PAYLOAD_LEN], [0x03, 0x0B])
            .unwrap();
        writer.send_raw(&[0x99, 0x98]).unwrap();
        writer.send(0, &[0x45; DEFAULT_PAYLOAD_LEN]).unwrap();

        let mut decoder = FrameDecoder::new();
        let frames: Vec<_> = decoder
            .feed(&written(writer))
            .into_iter()
            .filter_map(FrameEvent::into_frame)
            .collect();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload[0], 0x45);
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        let err = writer.send(0, &vec![1u8; MAX_PAYLOAD + 1]).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
        assert!(written(writer).is_empty());
    }

    #[test]
    fn zero_length_write_is_connection_closed() {
        let mut writer = FrameWriter::new(ZeroWriter);
        let err = writer.send(0, b"x").unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
