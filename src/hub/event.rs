//! Events posted to the hub coordinator
//!
//! Connection tasks never touch the registry. They describe what happened
//! on their transport and the coordinator applies it in arrival order.

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};

use crate::error::HubError;
use crate::registry::{CameraId, ChannelKind, ConnectionId};
use crate::relay::ProducerSignal;
use crate::stats::HubStats;

use super::state::StreamPhase;

/// Inbound traffic on a producer connection
#[derive(Debug)]
pub(crate) enum Inbound {
    /// A frame on a `stream` channel
    Frame(Bytes),
    /// Any other application message
    Activity,
    /// Answer to a liveness probe
    Pong,
}

#[derive(Debug)]
pub(crate) enum HubEvent {
    ProducerConnected {
        camera: CameraId,
        kind: ChannelKind,
        id: ConnectionId,
        signals: mpsc::UnboundedSender<ProducerSignal>,
    },
    ProducerInbound {
        camera: CameraId,
        kind: ChannelKind,
        id: ConnectionId,
        inbound: Inbound,
    },
    ProducerClosed {
        camera: CameraId,
        kind: ChannelKind,
        id: ConnectionId,
    },
    ConsumerRequested {
        camera: CameraId,
        id: ConnectionId,
        chunks: mpsc::UnboundedSender<Bytes>,
        reply: oneshot::Sender<Result<(), HubError>>,
    },
    ConsumerClosed {
        camera: CameraId,
        id: ConnectionId,
    },
    Phase {
        camera: CameraId,
        reply: oneshot::Sender<StreamPhase>,
    },
    Stats {
        reply: oneshot::Sender<HubStats>,
    },
    Sweep,
    Shutdown,
}
