use std::fmt;
use std::io;

use dimlink_frame::FrameError;
use dimlink_session::SessionError;
use dimlink_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound | io::ErrorKind::BrokenPipe => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Capture { source, .. } | TransportError::Io(source) => {
            io_error(context, source)
        }
        TransportError::InvalidBaudRate(_) => CliError::usage(format!("{context}: {err}")),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::PayloadTooLarge { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::Transport(err) => transport_error(context, err),
        SessionError::Frame(err) => frame_error(context, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_not_found_is_transport_error() {
        let err = TransportError::Capture {
            path: "/missing.bin".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        let cli = transport_error("open failed", err);
        assert_eq!(cli.code, TRANSPORT_ERROR);
        assert!(cli.message.starts_with("open failed: "));
    }

    #[test]
    fn zero_baud_is_usage_error() {
        let cli = session_error(
            "connect failed",
            SessionError::Transport(TransportError::InvalidBaudRate(0)),
        );
        assert_eq!(cli.code, USAGE);
    }

    #[test]
    fn oversized_payload_is_data_invalid() {
        let cli = frame_error(
            "encode failed",
            FrameError::PayloadTooLarge {
                size: 300,
                max: 255,
            },
        );
        assert_eq!(cli.code, DATA_INVALID);
    }

    #[test]
    fn permission_denied_keeps_its_code() {
        let cli = io_error("open", io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(cli.code, PERMISSION_DENIED);
    }
}
