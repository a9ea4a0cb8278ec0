//! Tokio flavour of [`Session`](crate::Session).

use std::io::ErrorKind;

use dimlink_frame::{DecoderStats, FrameDecoder, FrameError};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::info;

use crate::error::{Result, SessionError};
use crate::session::{Pipeline, SessionConfig, SessionEvent};
use crate::sink::SharedSink;

const READ_CHUNK_SIZE: usize = 1024;

/// A telemetry session over an async byte source.
///
/// Same decode and sink semantics as the blocking session; only the read
/// is awaited.
pub struct AsyncSession<R> {
    inner: R,
    decoder: FrameDecoder,
    pipeline: Pipeline,
    chunk: Box<[u8]>,
}

impl<R: AsyncRead + Unpin> AsyncSession<R> {
    pub fn new(inner: R) -> Self {
        Self::with_config(inner, SessionConfig::default())
    }

    pub fn with_config(inner: R, config: SessionConfig) -> Self {
        Self {
            inner,
            decoder: FrameDecoder::with_config(config.decoder_config()),
            pipeline: Pipeline::new(config.layout),
            chunk: vec![0u8; READ_CHUNK_SIZE].into_boxed_slice(),
        }
    }

    pub fn sink(&self) -> SharedSink {
        self.pipeline.sink().clone()
    }

    /// Await one read and process what it completed.
    ///
    /// Returns `Ok(None)` at end of stream, after resetting the sink.
    pub async fn next_events(&mut self) -> Result<Option<Vec<SessionEvent>>> {
        loop {
            match self.inner.read(&mut self.chunk).await {
                Ok(0) => {
                    self.decoder.reset();
                    self.pipeline.close();
                    info!(stats = ?self.decoder.stats(), "end of stream");
                    return Ok(None);
                }
                Ok(n) => {
                    let events = self.decoder.feed(&self.chunk[..n]);
                    return Ok(Some(self.pipeline.process(events)));
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.pipeline.close();
                    return Err(SessionError::Frame(FrameError::Io(err)));
                }
            }
        }
    }

    pub fn stats(&self) -> &DecoderStats {
        self.decoder.stats()
    }

    /// End the session: reset the sink and return the byte source.
    pub fn close(self) -> R {
        self.pipeline.close();
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use dimlink_frame::encode_frame;
    use dimlink_telemetry::{encode_snapshot, Mode, PayloadLayout, TelemetrySnapshot};
    use tokio::io::AsyncWriteExt;

    use super::*;

    #[tokio::test]
    async fn async_session_tracks_latest_snapshot() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let mut session = AsyncSession::new(rx);
        let sink = session.sink();

        let mut wire = BytesMut::new();
        for loop_state in [50i16, 100] {
            let mut snapshot = TelemetrySnapshot::default();
            snapshot.device.loop_state = loop_state;
            let payload = encode_snapshot(&snapshot, PayloadLayout::Standard);
            encode_frame(0, &payload, &mut wire).unwrap();
        }

        let writer = tokio::spawn(async move {
            // Small writes to exercise reassembly across reads.
            for piece in wire.chunks(7) {
                tx.write_all(piece).await.unwrap();
            }
        });

        let mut modes = Vec::new();
        while let Some(events) = session.next_events().await.unwrap() {
            for event in events {
                if let SessionEvent::Snapshot(snapshot) = event {
                    modes.push(snapshot.mode());
                    assert!(sink.is_receiving());
                }
            }
        }
        writer.await.unwrap();

        assert_eq!(modes, vec![Mode::Resetting, Mode::Idle]);
        assert_eq!(session.stats().frames, 2);
        assert!(sink.latest().is_none());
    }
}
