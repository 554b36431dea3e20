//! Producer side of a registered connection
//!
//! A connection task holds a `ProducerSession` to report inbound traffic and
//! a `ProducerSignals` to receive what it must send back. Dropping the
//! session reports the connection closed.

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::registry::{CameraId, ChannelKind, ConnectionId};
use crate::relay::ProducerSignal;

use super::event::{HubEvent, Inbound};

/// Reporting half of a producer connection
#[derive(Debug)]
pub struct ProducerSession {
    camera: CameraId,
    kind: ChannelKind,
    id: ConnectionId,
    events: mpsc::UnboundedSender<HubEvent>,
}

impl ProducerSession {
    pub(crate) fn new(
        camera: CameraId,
        kind: ChannelKind,
        id: ConnectionId,
        events: mpsc::UnboundedSender<HubEvent>,
    ) -> Self {
        Self {
            camera,
            kind,
            id,
            events,
        }
    }

    /// Camera this connection belongs to
    pub fn camera(&self) -> &CameraId {
        &self.camera
    }

    /// Channel kind of this connection
    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// Connection id
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Report an inbound frame
    ///
    /// On a `command` channel this only counts as activity.
    pub fn frame(&self, data: Bytes) {
        self.post(Inbound::Frame(data));
    }

    /// Report an inbound message that carries no frame
    pub fn activity(&self) {
        self.post(Inbound::Activity);
    }

    /// Report a liveness probe answer
    pub fn pong(&self) {
        self.post(Inbound::Pong);
    }

    fn post(&self, inbound: Inbound) {
        // Hub gone means shutdown; the signals channel will close too
        let _ = self.events.send(HubEvent::ProducerInbound {
            camera: self.camera.clone(),
            kind: self.kind,
            id: self.id,
            inbound,
        });
    }
}

impl Drop for ProducerSession {
    fn drop(&mut self) {
        let _ = self.events.send(HubEvent::ProducerClosed {
            camera: self.camera.clone(),
            kind: self.kind,
            id: self.id,
        });
    }
}

/// Signals the hub wants sent to a producer
#[derive(Debug)]
pub struct ProducerSignals {
    rx: mpsc::UnboundedReceiver<ProducerSignal>,
}

impl ProducerSignals {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<ProducerSignal>) -> Self {
        Self { rx }
    }

    /// Next signal. `None` once the hub has dropped this connection.
    pub async fn recv(&mut self) -> Option<ProducerSignal> {
        self.rx.recv().await
    }

    /// Next signal if one is already queued
    pub fn try_recv(&mut self) -> Option<ProducerSignal> {
        self.rx.try_recv().ok()
    }
}
