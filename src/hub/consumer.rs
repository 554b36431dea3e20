//! Viewer side of a registered stream
//!
//! `ConsumerStream` yields framed multipart chunks and is used directly as
//! the HTTP response body. When the viewer goes away the body is dropped,
//! which reports the consumer closed to the hub.

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::Stream;
use tokio::sync::mpsc;

use crate::registry::{CameraId, ConnectionId};

use super::event::HubEvent;

/// Stream of multipart chunks for one viewer
///
/// Ends when the camera disconnects, the viewer is displaced, or the hub
/// shuts down.
#[derive(Debug)]
pub struct ConsumerStream {
    camera: CameraId,
    id: ConnectionId,
    chunks: mpsc::UnboundedReceiver<Bytes>,
    events: mpsc::UnboundedSender<HubEvent>,
}

impl ConsumerStream {
    pub(crate) fn new(
        camera: CameraId,
        id: ConnectionId,
        chunks: mpsc::UnboundedReceiver<Bytes>,
        events: mpsc::UnboundedSender<HubEvent>,
    ) -> Self {
        Self {
            camera,
            id,
            chunks,
            events,
        }
    }

    /// Camera being watched
    pub fn camera(&self) -> &CameraId {
        &self.camera
    }

    /// Stream id
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Next chunk, or `None` once the stream has ended
    pub async fn next_chunk(&mut self) -> Option<Bytes> {
        self.chunks.recv().await
    }
}

impl Stream for ConsumerStream {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.chunks.poll_recv(cx).map(|chunk| chunk.map(Ok))
    }
}

impl Drop for ConsumerStream {
    fn drop(&mut self) {
        let _ = self.events.send(HubEvent::ConsumerClosed {
            camera: self.camera.clone(),
            id: self.id,
        });
    }
}
