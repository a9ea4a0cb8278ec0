use std::path::Path;

use dimlink_transport::{SerialConfig, SerialStream};
use tracing::debug;

use crate::error::Result;
use crate::session::{Session, SessionConfig};

/// Open a serial port and start a session on it.
///
/// Bytes the OS buffered before the port was opened are discarded, so the
/// first chunk the decoder sees is fresh.
pub fn connect(serial: &SerialConfig, config: SessionConfig) -> Result<Session<SerialStream>> {
    let mut stream = dimlink_transport::open(serial)?;
    stream.discard_input()?;
    debug!(port = %serial.port, "discarded serial backlog");
    Ok(Session::with_config(stream, config))
}

/// Start a session over a capture file. `-` reads stdin.
pub fn open_capture(
    path: impl AsRef<Path>,
    config: SessionConfig,
) -> Result<Session<SerialStream>> {
    let stream = SerialStream::open_capture(path)?;
    Ok(Session::with_config(stream, config))
}

#[cfg(test)]
mod tests {
    use std::ops::ControlFlow;

    use bytes::BytesMut;
    use dimlink_frame::encode_frame;
    use dimlink_telemetry::{encode_snapshot, PayloadLayout, TelemetrySnapshot};
    use dimlink_transport::TransportError;

    use super::*;
    use crate::error::SessionError;
    use crate::session::{SessionEnd, SessionEvent};

    #[test]
    fn capture_session_decodes_file() {
        let mut snapshot = TelemetrySnapshot::default();
        snapshot.device.loop_state = 1100;
        let mut wire = BytesMut::new();
        encode_frame(
            0,
            &encode_snapshot(&snapshot, PayloadLayout::Standard),
            &mut wire,
        )
        .unwrap();

        let path = std::env::temp_dir().join(format!(
            "dimlink-session-capture-{}.bin",
            std::process::id()
        ));
        std::fs::write(&path, &wire).unwrap();

        let mut session = open_capture(&path, SessionConfig::default()).unwrap();
        assert_eq!(session.get_ref().name(), path.display().to_string());
        let mut seen = Vec::new();
        let end = session
            .run(|event| {
                if let SessionEvent::Snapshot(s) = event {
                    seen.push(s.device.loop_state);
                }
                ControlFlow::Continue(())
            })
            .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(end, SessionEnd::EndOfStream);
        assert_eq!(seen, vec![1100]);
    }

    #[test]
    fn missing_capture_is_transport_error() {
        let err = open_capture("/nonexistent/dimlink.bin", SessionConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Transport(TransportError::Capture { .. })
        ));
    }

    #[test]
    fn zero_baud_is_rejected_before_open() {
        let serial = SerialConfig::new("/dev/null").with_baud_rate(0);
        let err = connect(&serial, SessionConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Transport(TransportError::InvalidBaudRate(0))
        ));
    }
}
