//! `tokio_util::codec` adapter over [`FrameDecoder`].

use std::collections::VecDeque;

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::codec::DecoderConfig;
use crate::decoder::{DecoderStats, FrameDecoder, FrameEvent};
use crate::error::FrameError;

/// Decoder for use with `FramedRead`.
///
/// Every byte `FramedRead` buffers is moved into the frame decoder at once,
/// so the read buffer is always empty between calls and end of stream never
/// reports leftover bytes. A partial frame at EOF is dropped silently.
#[derive(Debug, Default)]
pub struct FrameCodec {
    decoder: FrameDecoder,
    pending: VecDeque<FrameEvent>,
}

impl FrameCodec {
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            decoder: FrameDecoder::with_config(config),
            pending: VecDeque::new(),
        }
    }

    pub fn stats(&self) -> &DecoderStats {
        self.decoder.stats()
    }
}

impl Decoder for FrameCodec {
    type Item = FrameEvent;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if !src.is_empty() {
            let chunk = src.split();
            self.pending.extend(self.decoder.feed(&chunk));
        }
        Ok(self.pending.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;
    use tokio_util::codec::FramedRead;

    use super::*;
    use crate::codec::{encode_frame, DEFAULT_PAYLOAD_LEN};

    #[tokio::test]
    async fn framed_read_yields_every_frame() {
        let mut wire = BytesMut::new();
        for fill in [0x21u8, 0x22, 0x23, 0x24] {
            encode_frame(0, &[fill; DEFAULT_PAYLOAD_LEN], &mut wire).unwrap();
        }
        wire.extend_from_slice(&[0x02, 0x37]);

        let bytes = wire.to_vec();
        let mut framed = FramedRead::new(bytes.as_slice(), FrameCodec::default());
        let mut fills = Vec::new();
        while let Some(event) = framed.next().await {
            if let FrameEvent::Frame(frame) = event.unwrap() {
                fills.push(frame.payload[0]);
            }
        }

        assert_eq!(fills, vec![0x21, 0x22, 0x23, 0x24]);
        assert_eq!(framed.decoder().stats().frames, 4);
    }
}
