/// Errors that end a session.
///
/// Corrupt or rejected frames never show up here; they are reported as
/// [`crate::SessionWarning`] events and the loop keeps going.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Opening or configuring the byte source failed.
    #[error("transport error: {0}")]
    Transport(#[from] dimlink_transport::TransportError),

    /// Reading from the byte source failed.
    #[error("frame error: {0}")]
    Frame(#[from] dimlink_frame::FrameError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
