//! Registry entry types
//!
//! Entries hold the coordinator's end of each connection: a sender for
//! signals to a producer, or a sender of framed chunks to a consumer.

use std::time::Instant;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::relay::ProducerSignal;

use super::key::ConnectionId;

/// A registered producer connection
#[derive(Debug)]
pub struct ProducerEntry {
    /// Connection id
    pub id: ConnectionId,

    /// Outbound signals, drained by the connection task
    signals: mpsc::UnboundedSender<ProducerSignal>,

    /// Liveness flag: cleared before each probe, set on any inbound traffic
    pub alive: bool,

    /// Whether the last control message sent was STOP
    pub halted: bool,

    /// Set once `Terminate` has been queued
    pub terminated: bool,

    /// Inbound messages seen on this connection
    pub messages: u64,

    /// When the connection registered
    pub connected_at: Instant,
}

impl ProducerEntry {
    /// Create a fresh, alive entry
    pub fn new(id: ConnectionId, signals: mpsc::UnboundedSender<ProducerSignal>) -> Self {
        Self {
            id,
            signals,
            alive: true,
            halted: false,
            terminated: false,
            messages: 0,
            connected_at: Instant::now(),
        }
    }

    /// Queue a signal for the connection
    ///
    /// Fire-and-forget. Returns false if the connection task has already gone.
    pub fn signal(&self, signal: ProducerSignal) -> bool {
        self.signals.send(signal).is_ok()
    }

    /// Queue `Terminate`, at most once per connection
    ///
    /// Returns false if the connection was already terminated.
    pub fn terminate(&mut self) -> bool {
        if self.terminated {
            return false;
        }
        self.terminated = true;
        self.signal(ProducerSignal::Terminate);
        true
    }

    /// Record inbound traffic
    pub fn touch(&mut self) {
        self.alive = true;
        self.messages += 1;
    }
}

/// A registered consumer (viewer) stream
#[derive(Debug)]
pub struct ConsumerEntry {
    /// Stream id
    pub id: ConnectionId,

    /// Framed chunks, drained by the HTTP response body
    chunks: mpsc::UnboundedSender<Bytes>,

    /// When the viewer attached
    pub attached_at: Instant,
}

impl ConsumerEntry {
    /// Create an entry writing into `chunks`
    pub fn new(id: ConnectionId, chunks: mpsc::UnboundedSender<Bytes>) -> Self {
        Self {
            id,
            chunks,
            attached_at: Instant::now(),
        }
    }

    /// Whether the viewer side is still reading
    pub fn is_open(&self) -> bool {
        !self.chunks.is_closed()
    }

    /// Queue a chunk for the viewer. Returns false if the viewer is gone.
    pub fn write(&self, chunk: Bytes) -> bool {
        self.chunks.send(chunk).is_ok()
    }
}
