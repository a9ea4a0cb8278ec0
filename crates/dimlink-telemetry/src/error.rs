/// Errors that can occur while decoding a telemetry payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// The payload is not the size of the configured layout.
    #[error("payload is {actual} bytes, layout needs {expected}")]
    Length { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, PayloadError>;
