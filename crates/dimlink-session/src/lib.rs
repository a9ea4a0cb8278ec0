//! Session management for a dimlink telemetry link.
//!
//! A [`Session`] owns one byte source and one frame decoder, runs the read
//! loop, decodes each valid frame into a
//! [`TelemetrySnapshot`](dimlink_telemetry::TelemetrySnapshot) and
//! publishes it to a [`SharedSink`]. Presentation code holds a clone of the
//! sink and only ever reads from it.
//!
//! Sessions are built per connection. Nothing here is process-global.

#[cfg(feature = "async")]
pub mod async_session;
pub mod connector;
pub mod error;
pub mod session;
pub mod sink;

#[cfg(feature = "async")]
pub use async_session::AsyncSession;
pub use connector::{connect, open_capture};
pub use error::{Result, SessionError};
pub use session::{Session, SessionConfig, SessionEnd, SessionEvent, SessionWarning, StopHandle};
pub use sink::{SharedSink, SinkView, SnapshotSink};
