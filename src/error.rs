//! Error types
//!
//! `HubError` covers the relay's own failure modes. `Error` wraps it together
//! with the I/O and transport errors raised by the server layer.

use crate::registry::CameraId;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Relay hub error
    #[error(transparent)]
    Hub(#[from] HubError),

    /// Socket or listener I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket transport error
    #[error("transport error: {0}")]
    Transport(#[from] axum::Error),
}

/// Errors raised by the relay hub
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HubError {
    /// A viewer asked for a camera with no registered stream producer
    #[error("no connected camera with id '{0}'")]
    UnknownCamera(CameraId),

    /// A relay write targeted a consumer whose stream already closed
    #[error("viewer for camera '{0}' is gone")]
    ConsumerGone(CameraId),

    /// No producer is registered for the camera
    #[error("camera '{0}' is not connected")]
    ProducerGone(CameraId),

    /// Camera identity was empty
    #[error("camera identity must not be empty")]
    InvalidIdentity,

    /// Channel kind in the socket path was neither `stream` nor `command`
    #[error("unknown channel kind '{0}'")]
    UnknownChannel(String),

    /// The coordinator task is no longer running
    #[error("relay hub is shut down")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_camera_message() {
        let err = HubError::UnknownCamera(CameraId::new("cam1").unwrap());
        assert_eq!(err.to_string(), "no connected camera with id 'cam1'");
    }

    #[test]
    fn test_hub_error_converts() {
        let err: Error = HubError::Closed.into();
        assert!(matches!(err, Error::Hub(HubError::Closed)));
        assert_eq!(err.to_string(), "relay hub is shut down");
    }
}
