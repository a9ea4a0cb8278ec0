/// Errors that can occur while encoding frames or reading them off a stream.
///
/// Corrupt input is not an error: the decoder resynchronizes and reports
/// rejected frames as [`crate::DecodeWarning`] events instead.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload does not fit the 1-byte length field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended. Any partially buffered frame is dropped.
    #[error("connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
