use std::io::Read;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dimlink_frame::{
    DecodeWarning, DecoderConfig, DecoderStats, FrameError, FrameEvent, FrameReader,
    DEFAULT_OVERFLOW_FACTOR, PRIMARY_SOURCE_ID,
};
use dimlink_telemetry::{decode_snapshot, PayloadError, PayloadLayout, TelemetrySnapshot};
use tracing::{debug, info, warn};

use crate::error::{Result, SessionError};
use crate::sink::SharedSink;

/// Per-session settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Device record layout the firmware sends. Default: standard.
    pub layout: PayloadLayout,
    /// Accepted source id. Default: 0.
    pub source_id: u8,
    /// Working buffer bound, in frames. Default: 3.
    pub overflow_factor: usize,
}

impl SessionConfig {
    /// Decoder settings matching this session's payload layout.
    pub fn decoder_config(&self) -> DecoderConfig {
        DecoderConfig {
            source_id: self.source_id,
            payload_len: self.layout.payload_len(),
            overflow_factor: self.overflow_factor,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            layout: PayloadLayout::Standard,
            source_id: PRIMARY_SOURCE_ID,
            overflow_factor: DEFAULT_OVERFLOW_FACTOR,
        }
    }
}

/// Why a non-fatal outcome happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionWarning {
    #[error(transparent)]
    Frame(#[from] DecodeWarning),

    #[error(transparent)]
    Payload(#[from] PayloadError),
}

/// One outcome of the read loop, in stream order.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Snapshot(TelemetrySnapshot),
    Warning(SessionWarning),
}

/// How a session loop ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The byte source reached EOF.
    EndOfStream,
    /// Stopped through a [`StopHandle`] or by the event callback.
    Stopped,
}

/// Requests a running session loop to exit after its current read.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Turns frame events into session events and publishes them.
///
/// Shared by the blocking and async loops.
#[derive(Debug, Clone)]
pub(crate) struct Pipeline {
    layout: PayloadLayout,
    sink: SharedSink,
}

impl Pipeline {
    pub(crate) fn new(layout: PayloadLayout) -> Self {
        Self {
            layout,
            sink: SharedSink::new(),
        }
    }

    pub(crate) fn sink(&self) -> &SharedSink {
        &self.sink
    }

    pub(crate) fn process(&self, events: Vec<FrameEvent>) -> Vec<SessionEvent> {
        let out: Vec<SessionEvent> = events
            .into_iter()
            .map(|event| match event {
                FrameEvent::Frame(frame) => match decode_snapshot(&frame.payload, self.layout) {
                    Ok(snapshot) => SessionEvent::Snapshot(snapshot),
                    Err(err) => {
                        warn!(%err, "frame payload did not decode");
                        SessionEvent::Warning(err.into())
                    }
                },
                FrameEvent::Warning(warning) => SessionEvent::Warning(warning.into()),
            })
            .collect();

        if !out.is_empty() {
            self.sink.update(|sink| {
                for event in &out {
                    sink.apply(event);
                }
            });
        }
        out
    }

    pub(crate) fn close(&self) {
        self.sink.update(|sink| sink.close());
    }
}

/// A blocking telemetry session over any `Read` byte source.
///
/// Owns the frame decoder; nothing else touches the working buffer. Events
/// reach the sink in the order their bytes arrived.
pub struct Session<T> {
    reader: FrameReader<T>,
    pipeline: Pipeline,
    stop: StopHandle,
}

impl<T: Read> Session<T> {
    /// Create a new session with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, SessionConfig::default())
    }

    /// Create a new session with explicit configuration.
    pub fn with_config(inner: T, config: SessionConfig) -> Self {
        Self {
            reader: FrameReader::with_config(inner, config.decoder_config()),
            pipeline: Pipeline::new(config.layout),
            stop: StopHandle::default(),
        }
    }

    /// Read handle for presentation code.
    pub fn sink(&self) -> SharedSink {
        self.pipeline.sink().clone()
    }

    /// Handle that ends [`Session::run`] from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Perform one read and process what it completed.
    ///
    /// Returns `Ok(None)` at end of stream; the sink is reset in that case.
    pub fn poll(&mut self) -> Result<Option<Vec<SessionEvent>>> {
        match self.reader.read_events() {
            Ok(events) => Ok(Some(self.pipeline.process(events))),
            Err(FrameError::ConnectionClosed) => {
                self.pipeline.close();
                Ok(None)
            }
            Err(err) => {
                self.pipeline.close();
                Err(SessionError::Frame(err))
            }
        }
    }

    /// Run the read loop until EOF, a stop request, or a transport failure.
    ///
    /// `on_event` sees every event after it has been applied to the sink and
    /// may return `ControlFlow::Break` to end the session. The sink is reset
    /// whenever the loop exits.
    pub fn run<F>(&mut self, mut on_event: F) -> Result<SessionEnd>
    where
        F: FnMut(&SessionEvent) -> ControlFlow<()>,
    {
        info!("session started");
        loop {
            if self.stop.is_stopped() {
                self.pipeline.close();
                info!("session stopped");
                return Ok(SessionEnd::Stopped);
            }

            let Some(events) = self.poll()? else {
                info!(stats = ?self.stats(), "end of stream");
                return Ok(SessionEnd::EndOfStream);
            };

            for event in &events {
                if on_event(event).is_break() {
                    debug!("event handler requested stop");
                    self.stop.stop();
                    break;
                }
            }
        }
    }

    /// Decoder counters.
    pub fn stats(&self) -> &DecoderStats {
        self.reader.stats()
    }

    /// Borrow the underlying byte source.
    pub fn get_ref(&self) -> &T {
        self.reader.get_ref()
    }

    /// End the session: reset the sink and return the byte source.
    pub fn close(self) -> T {
        self.pipeline.close();
        self.reader.into_inner()
    }
}

impl<T: Read> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("stats", self.reader.stats())
            .field("sink", &self.pipeline.sink().view())
            .field("stopped", &self.stop.is_stopped())
            .finish()
    }
}
