//! Hub coordinator
//!
//! Owns the registry and applies every event in arrival order. This is the
//! only place registry entries are created or removed, so registry access is
//! serialised without locks.
//!
//! # Lifecycle per camera
//!
//! ```text
//!   NoProducer ──producer registers──► ProducerIdle ──viewer attaches──► Streaming
//!        ▲                               │     ▲                           │
//!        └────────producer closes────────┘     └──────viewer detaches──────┘
//!        ▲                                                                 │
//!        └──────────producer closes (viewer stream is ended too)───────────┘
//! ```

use std::ops::ControlFlow;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};

use crate::error::HubError;
use crate::registry::{
    CameraId, ChannelKind, ConnectionId, ConnectionRegistry, ConsumerEntry, ProducerEntry,
};
use crate::relay::{encode_part, ProducerSignal};
use crate::stats::{HubStats, RelayCounters};

use super::config::HubConfig;
use super::event::{HubEvent, Inbound};
use super::state::StreamPhase;

/// The coordinator state
pub(crate) struct Hub {
    pub(super) config: HubConfig,
    pub(super) registry: ConnectionRegistry,
    pub(super) counters: RelayCounters,
}

impl Hub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            config,
            registry: ConnectionRegistry::new(),
            counters: RelayCounters::new(),
        }
    }

    /// Run the coordinator until shutdown or until every sender is gone
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<HubEvent>) {
        // interval() panics on a zero period
        let period = self.config.sweep_interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tracing::info!(
            sweep_interval_secs = period.as_secs(),
            signaling = self.config.signaling,
            "Relay hub started"
        );

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        if self.handle(event).is_break() {
                            break;
                        }
                    }
                    None => {
                        self.shutdown();
                        break;
                    }
                },
                _ = ticker.tick() => {
                    self.sweep();
                }
            }
        }

        tracing::info!("Relay hub stopped");
    }

    /// Apply one event
    pub fn handle(&mut self, event: HubEvent) -> ControlFlow<()> {
        match event {
            HubEvent::ProducerConnected {
                camera,
                kind,
                id,
                signals,
            } => self.on_producer_connected(camera, kind, id, signals),
            HubEvent::ProducerInbound {
                camera,
                kind,
                id,
                inbound,
            } => self.on_producer_inbound(&camera, kind, id, inbound),
            HubEvent::ProducerClosed { camera, kind, id } => {
                self.on_producer_closed(&camera, kind, id)
            }
            HubEvent::ConsumerRequested {
                camera,
                id,
                chunks,
                reply,
            } => self.on_consumer_requested(camera, id, chunks, reply),
            HubEvent::ConsumerClosed { camera, id } => self.on_consumer_closed(&camera, id),
            HubEvent::Phase { camera, reply } => {
                let _ = reply.send(self.phase(&camera));
            }
            HubEvent::Stats { reply } => {
                let _ = reply.send(self.stats());
            }
            HubEvent::Sweep => {
                self.sweep();
            }
            HubEvent::Shutdown => {
                self.shutdown();
                return ControlFlow::Break(());
            }
        }

        ControlFlow::Continue(())
    }

    fn on_producer_connected(
        &mut self,
        camera: CameraId,
        kind: ChannelKind,
        id: ConnectionId,
        signals: mpsc::UnboundedSender<ProducerSignal>,
    ) {
        let entry = ProducerEntry::new(id, signals);
        entry.signal(ProducerSignal::Ack);

        if let Some(old) = self.registry.register_producer(camera.clone(), kind, entry) {
            tracing::info!(
                camera = %camera,
                kind = %kind,
                old = %old.id,
                new = %id,
                "Producer replaced, terminating previous connection"
            );
            old.signal(ProducerSignal::Terminate);
        } else {
            tracing::info!(camera = %camera, kind = %kind, connection = %id, "Producer registered");
        }

        // A viewer that outlived a replaced producer is still waiting
        if kind == ChannelKind::Stream
            && self.config.signaling
            && self.registry.lookup_consumer(&camera).is_some()
        {
            self.resume(&camera);
        }
    }

    fn on_producer_inbound(
        &mut self,
        camera: &CameraId,
        kind: ChannelKind,
        id: ConnectionId,
        inbound: Inbound,
    ) {
        let Some(entry) = self
            .registry
            .lookup_producer_mut(camera, kind)
            .filter(|entry| entry.id == id)
        else {
            tracing::trace!(camera = %camera, kind = %kind, connection = %id, "Message from stale connection");
            return;
        };

        match inbound {
            Inbound::Pong => entry.alive = true,
            Inbound::Activity => entry.touch(),
            Inbound::Frame(frame) => {
                entry.touch();
                if kind == ChannelKind::Stream {
                    self.relay(camera, frame);
                }
            }
        }
    }

    /// Relay one frame to the camera's viewer, then acknowledge it
    fn relay(&mut self, camera: &CameraId, frame: Bytes) {
        let delivered = match self.registry.lookup_consumer(camera) {
            Some(consumer) if consumer.is_open() => {
                consumer.write(encode_part(&self.config.boundary, &frame))
            }
            _ => false,
        };

        if delivered {
            self.counters.on_relayed(frame.len());
            tracing::trace!(camera = %camera, size = frame.len(), "Frame relayed");
        } else {
            self.counters.on_dropped();
            if let Some(gone) = self.registry.remove_consumer(camera) {
                tracing::info!(
                    camera = %camera,
                    viewer = %gone.id,
                    error = %HubError::ConsumerGone(camera.clone()),
                    "Dropping frame"
                );
            }
            if self.config.signaling {
                self.halt(camera);
            }
        }

        if let Some(producer) = self.registry.lookup_producer(camera, ChannelKind::Stream) {
            producer.signal(ProducerSignal::Ack);
        }
    }

    fn on_producer_closed(&mut self, camera: &CameraId, kind: ChannelKind, id: ConnectionId) {
        let Some(entry) = self.registry.remove_producer_if(camera, kind, id) else {
            tracing::debug!(camera = %camera, kind = %kind, connection = %id, "Close of replaced connection ignored");
            return;
        };

        tracing::info!(
            camera = %camera,
            kind = %kind,
            connection = %id,
            messages = entry.messages,
            connected_secs = entry.connected_at.elapsed().as_secs(),
            "Producer disconnected"
        );

        if kind == ChannelKind::Stream {
            // Dropping the entry drops the sender, which ends the response body
            if let Some(consumer) = self.registry.remove_consumer(camera) {
                tracing::info!(camera = %camera, viewer = %consumer.id, "Viewer stream ended");
            }
        }
    }

    fn on_consumer_requested(
        &mut self,
        camera: CameraId,
        id: ConnectionId,
        chunks: mpsc::UnboundedSender<Bytes>,
        reply: oneshot::Sender<Result<(), HubError>>,
    ) {
        if self
            .registry
            .lookup_producer(&camera, ChannelKind::Stream)
            .is_none()
        {
            tracing::warn!(camera = %camera, "Viewer requested unknown camera");
            let _ = reply.send(Err(HubError::UnknownCamera(camera)));
            return;
        }

        let entry = ConsumerEntry::new(id, chunks);
        if let Some(previous) = self.registry.register_consumer(camera.clone(), entry) {
            tracing::info!(camera = %camera, old = %previous.id, new = %id, "Viewer displaced");
        } else {
            tracing::info!(camera = %camera, viewer = %id, "Viewer attached");
        }

        if reply.send(Ok(())).is_err() {
            // Requester went away before the stream was handed over
            self.registry.remove_consumer_if(&camera, id);
            if self.config.signaling {
                self.halt(&camera);
            }
            return;
        }

        if self.config.signaling {
            self.resume(&camera);
        }
    }

    fn on_consumer_closed(&mut self, camera: &CameraId, id: ConnectionId) {
        let Some(entry) = self.registry.remove_consumer_if(camera, id) else {
            return;
        };

        tracing::info!(
            camera = %camera,
            viewer = %id,
            watched_secs = entry.attached_at.elapsed().as_secs(),
            "Viewer disconnected"
        );

        if self.config.signaling {
            self.halt(camera);
        }
    }

    /// Send START to the stream producer
    fn resume(&mut self, camera: &CameraId) {
        if let Some(producer) = self.registry.lookup_producer_mut(camera, ChannelKind::Stream) {
            producer.halted = false;
            producer.signal(ProducerSignal::Start);
            tracing::debug!(camera = %camera, connection = %producer.id, "START sent");
        }
    }

    /// Send STOP to the stream producer, once per detach
    ///
    /// A missing producer is not an error here: it already went away.
    fn halt(&mut self, camera: &CameraId) {
        match self.registry.lookup_producer_mut(camera, ChannelKind::Stream) {
            Some(producer) if !producer.halted => {
                producer.halted = true;
                producer.signal(ProducerSignal::Stop);
                tracing::debug!(camera = %camera, connection = %producer.id, "STOP sent");
            }
            Some(_) => {}
            None => {
                tracing::trace!(error = %HubError::ProducerGone(camera.clone()), "STOP skipped");
            }
        }
    }

    /// Current lifecycle phase of `camera`
    pub fn phase(&self, camera: &CameraId) -> StreamPhase {
        StreamPhase::from_occupancy(
            self.registry
                .lookup_producer(camera, ChannelKind::Stream)
                .is_some(),
            self.registry.lookup_consumer(camera).is_some(),
        )
    }

    /// Snapshot of the hub statistics
    pub fn stats(&self) -> HubStats {
        HubStats {
            stream_producers: self.registry.producer_count(ChannelKind::Stream),
            command_producers: self.registry.producer_count(ChannelKind::Command),
            consumers: self.registry.consumer_count(),
            frames_relayed: self.counters.frames_relayed,
            frames_dropped: self.counters.frames_dropped,
            bytes_relayed: self.counters.bytes_relayed,
            terminations: self.counters.terminations,
            uptime: self.counters.started_at.elapsed(),
        }
    }

    /// End every viewer stream and terminate every producer
    pub fn shutdown(&mut self) {
        let (producers, consumers) = self.registry.drain();

        for (_, _, producer) in &producers {
            producer.signal(ProducerSignal::Terminate);
        }

        tracing::info!(
            producers = producers.len(),
            viewers = consumers.len(),
            "Relay hub tearing down"
        );
    }
}
