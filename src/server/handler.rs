//! Application callbacks
//!
//! The hub interprets nothing on the command channel. Messages arriving there
//! are handed to a `HubHandler` implementation supplied by the application.

use std::future::Future;

use bytes::Bytes;

use crate::registry::{CameraId, ChannelKind};

/// Callbacks invoked from producer connection tasks
///
/// All methods have default implementations, so an application only
/// overrides what it needs. `on_command` runs on a per-connection task, one
/// message at a time; a slow handler holds back later commands on that
/// connection but never frames, pings or termination.
pub trait HubHandler: Send + Sync + 'static {
    /// A producer connection has been registered
    fn on_producer_connected(
        &self,
        _camera: &CameraId,
        _kind: ChannelKind,
    ) -> impl Future<Output = ()> + Send {
        async {}
    }

    /// A message arrived on a camera's command channel
    fn on_command(&self, camera: &CameraId, message: Bytes) -> impl Future<Output = ()> + Send {
        async move {
            tracing::info!(
                camera = %camera,
                size = message.len(),
                message = %String::from_utf8_lossy(&message),
                "Message from command channel received"
            );
        }
    }

    /// A producer connection has closed or was terminated
    fn on_producer_closed(
        &self,
        _camera: &CameraId,
        _kind: ChannelKind,
    ) -> impl Future<Output = ()> + Send {
        async {}
    }
}

/// Handler that only logs command messages
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHandler;

impl HubHandler for LoggingHandler {}
