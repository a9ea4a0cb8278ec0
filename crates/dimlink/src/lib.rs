//! Serial telemetry decoder for dimlink motor controllers.
//!
//! The controller streams one frame per control cycle over a serial link.
//! This crate turns that byte stream into typed telemetry snapshots.
//!
//! # Crate Structure
//!
//! - [`transport`]: serial ports and capture files as byte sources
//! - [`frame`]: resynchronizing frame decoder and escape handling
//! - [`telemetry`]: payload layout, records and mode classification
//! - [`session`]: read loop and the latest-snapshot sink
//!
//! ```no_run
//! use std::ops::ControlFlow;
//!
//! use dimlink::session::{connect, SessionConfig, SessionEvent};
//! use dimlink::transport::SerialConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = connect(&SerialConfig::new("/dev/ttyACM0"), SessionConfig::default())?;
//! session.run(|event| {
//!     if let SessionEvent::Snapshot(snapshot) = event {
//!         println!("{}", snapshot.mode());
//!     }
//!     ControlFlow::Continue(())
//! })?;
//! # Ok(())
//! # }
//! ```

/// Re-export transport types.
pub mod transport {
    pub use dimlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use dimlink_frame::*;
}

/// Re-export telemetry types.
pub mod telemetry {
    pub use dimlink_telemetry::*;
}

/// Re-export session types.
pub mod session {
    pub use dimlink_session::*;
}
