//! Connection registry implementation
//!
//! Pure bookkeeping: two identity-keyed maps and no I/O. The registry is owned
//! by the hub coordinator, which is the only task that mutates it, so plain
//! `&mut self` access is all the synchronisation it needs.

use std::collections::HashMap;

use super::entry::{ConsumerEntry, ProducerEntry};
use super::key::{CameraId, ChannelKind, ConnectionId};

/// One slot per channel kind for a single camera
#[derive(Debug, Default)]
struct ProducerSlots {
    stream: Option<ProducerEntry>,
    command: Option<ProducerEntry>,
}

impl ProducerSlots {
    fn slot(&self, kind: ChannelKind) -> &Option<ProducerEntry> {
        match kind {
            ChannelKind::Stream => &self.stream,
            ChannelKind::Command => &self.command,
        }
    }

    fn slot_mut(&mut self, kind: ChannelKind) -> &mut Option<ProducerEntry> {
        match kind {
            ChannelKind::Stream => &mut self.stream,
            ChannelKind::Command => &mut self.command,
        }
    }

    fn is_empty(&self) -> bool {
        self.stream.is_none() && self.command.is_none()
    }
}

/// Registry of producer connections and pending consumers
///
/// Invariant: per camera, at most one producer of each kind and at most one
/// consumer. Registering over an existing entry replaces it and hands the old
/// entry back to the caller.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    producers: HashMap<CameraId, ProducerSlots>,
    consumers: HashMap<CameraId, ConsumerEntry>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a producer, returning the entry it replaced
    pub fn register_producer(
        &mut self,
        camera: CameraId,
        kind: ChannelKind,
        entry: ProducerEntry,
    ) -> Option<ProducerEntry> {
        self.producers
            .entry(camera)
            .or_default()
            .slot_mut(kind)
            .replace(entry)
    }

    /// Current producer connection for `(camera, kind)`
    pub fn lookup_producer(&self, camera: &CameraId, kind: ChannelKind) -> Option<&ProducerEntry> {
        self.producers
            .get(camera)
            .and_then(|slots| slots.slot(kind).as_ref())
    }

    /// Mutable access to the producer for `(camera, kind)`
    pub fn lookup_producer_mut(
        &mut self,
        camera: &CameraId,
        kind: ChannelKind,
    ) -> Option<&mut ProducerEntry> {
        self.producers
            .get_mut(camera)
            .and_then(|slots| slots.slot_mut(kind).as_mut())
    }

    /// Remove the producer for `(camera, kind)`. No-op if absent.
    pub fn remove_producer(&mut self, camera: &CameraId, kind: ChannelKind) -> Option<ProducerEntry> {
        let slots = self.producers.get_mut(camera)?;
        let removed = slots.slot_mut(kind).take();
        if slots.is_empty() {
            self.producers.remove(camera);
        }
        removed
    }

    /// Remove the producer only if it is still connection `id`
    ///
    /// A connection that was replaced must not evict its successor when it
    /// finally closes.
    pub fn remove_producer_if(
        &mut self,
        camera: &CameraId,
        kind: ChannelKind,
        id: ConnectionId,
    ) -> Option<ProducerEntry> {
        match self.lookup_producer(camera, kind) {
            Some(entry) if entry.id == id => self.remove_producer(camera, kind),
            _ => None,
        }
    }

    /// Register the pending consumer, returning the one it replaced
    pub fn register_consumer(&mut self, camera: CameraId, entry: ConsumerEntry) -> Option<ConsumerEntry> {
        self.consumers.insert(camera, entry)
    }

    /// Current consumer for `camera`
    pub fn lookup_consumer(&self, camera: &CameraId) -> Option<&ConsumerEntry> {
        self.consumers.get(camera)
    }

    /// Remove the consumer for `camera`. No-op if absent.
    pub fn remove_consumer(&mut self, camera: &CameraId) -> Option<ConsumerEntry> {
        self.consumers.remove(camera)
    }

    /// Remove the consumer only if it is still stream `id`
    pub fn remove_consumer_if(&mut self, camera: &CameraId, id: ConnectionId) -> Option<ConsumerEntry> {
        match self.consumers.get(camera) {
            Some(entry) if entry.id == id => self.consumers.remove(camera),
            _ => None,
        }
    }

    /// Iterate all producers mutably, for the liveness sweep
    pub fn producers_mut(&mut self) -> impl Iterator<Item = (&CameraId, ChannelKind, &mut ProducerEntry)> {
        self.producers.iter_mut().flat_map(|(camera, slots)| {
            let ProducerSlots { stream, command } = slots;
            stream
                .as_mut()
                .map(|entry| (camera, ChannelKind::Stream, entry))
                .into_iter()
                .chain(command.as_mut().map(|entry| (camera, ChannelKind::Command, entry)))
        })
    }

    /// Number of producers of `kind`
    pub fn producer_count(&self, kind: ChannelKind) -> usize {
        self.producers
            .values()
            .filter(|slots| slots.slot(kind).is_some())
            .count()
    }

    /// Number of registered consumers
    pub fn consumer_count(&self) -> usize {
        self.consumers.len()
    }

    /// Empty the registry, handing back every entry
    pub fn drain(&mut self) -> (Vec<(CameraId, ChannelKind, ProducerEntry)>, Vec<(CameraId, ConsumerEntry)>) {
        let producers = self
            .producers
            .drain()
            .flat_map(|(camera, slots)| {
                let stream = slots.stream.map(|e| (camera.clone(), ChannelKind::Stream, e));
                let command = slots.command.map(|e| (camera, ChannelKind::Command, e));
                stream.into_iter().chain(command)
            })
            .collect();
        let consumers = self.consumers.drain().collect();
        (producers, consumers)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use tokio::sync::mpsc;

    use super::*;

    fn cam(id: &str) -> CameraId {
        CameraId::new(id).unwrap()
    }

    fn producer(id: u64) -> ProducerEntry {
        let (tx, _rx) = mpsc::unbounded_channel();
        ProducerEntry::new(ConnectionId(id), tx)
    }

    fn consumer(id: u64) -> (ConsumerEntry, mpsc::UnboundedReceiver<Bytes>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ConsumerEntry::new(ConnectionId(id), tx), rx)
    }

    #[test]
    fn test_register_and_lookup_producer() {
        let mut registry = ConnectionRegistry::new();

        assert!(registry.lookup_producer(&cam("cam1"), ChannelKind::Stream).is_none());
        assert!(registry
            .register_producer(cam("cam1"), ChannelKind::Stream, producer(1))
            .is_none());

        let entry = registry.lookup_producer(&cam("cam1"), ChannelKind::Stream).unwrap();
        assert_eq!(entry.id, ConnectionId(1));
        assert!(registry.lookup_producer(&cam("cam1"), ChannelKind::Command).is_none());
    }

    #[test]
    fn test_register_producer_replaces() {
        let mut registry = ConnectionRegistry::new();

        registry.register_producer(cam("cam1"), ChannelKind::Stream, producer(1));
        let old = registry
            .register_producer(cam("cam1"), ChannelKind::Stream, producer(2))
            .unwrap();

        assert_eq!(old.id, ConnectionId(1));
        let current = registry.lookup_producer(&cam("cam1"), ChannelKind::Stream).unwrap();
        assert_eq!(current.id, ConnectionId(2));
        assert_eq!(registry.producer_count(ChannelKind::Stream), 1);
    }

    #[test]
    fn test_kinds_are_independent() {
        let mut registry = ConnectionRegistry::new();

        registry.register_producer(cam("cam1"), ChannelKind::Stream, producer(1));
        registry.register_producer(cam("cam1"), ChannelKind::Command, producer(2));
        assert_eq!(registry.producer_count(ChannelKind::Stream), 1);
        assert_eq!(registry.producer_count(ChannelKind::Command), 1);

        registry.remove_producer(&cam("cam1"), ChannelKind::Stream);
        assert!(registry.lookup_producer(&cam("cam1"), ChannelKind::Stream).is_none());
        assert!(registry.lookup_producer(&cam("cam1"), ChannelKind::Command).is_some());
    }

    #[test]
    fn test_remove_producer_if_ignores_stale_id() {
        let mut registry = ConnectionRegistry::new();

        registry.register_producer(cam("cam1"), ChannelKind::Stream, producer(1));
        registry.register_producer(cam("cam1"), ChannelKind::Stream, producer(2));

        assert!(registry
            .remove_producer_if(&cam("cam1"), ChannelKind::Stream, ConnectionId(1))
            .is_none());
        assert!(registry.lookup_producer(&cam("cam1"), ChannelKind::Stream).is_some());

        assert!(registry
            .remove_producer_if(&cam("cam1"), ChannelKind::Stream, ConnectionId(2))
            .is_some());
        assert!(registry.lookup_producer(&cam("cam1"), ChannelKind::Stream).is_none());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut registry = ConnectionRegistry::new();

        assert!(registry.remove_producer(&cam("ghost"), ChannelKind::Stream).is_none());
        assert!(registry.remove_consumer(&cam("ghost")).is_none());
    }

    #[test]
    fn test_consumer_replace_and_remove_if() {
        let mut registry = ConnectionRegistry::new();
        let (first, _rx1) = consumer(10);
        let (second, _rx2) = consumer(11);

        registry.register_consumer(cam("cam1"), first);
        let displaced = registry.register_consumer(cam("cam1"), second).unwrap();
        assert_eq!(displaced.id, ConnectionId(10));
        assert_eq!(registry.consumer_count(), 1);

        assert!(registry.remove_consumer_if(&cam("cam1"), ConnectionId(10)).is_none());
        assert!(registry.remove_consumer_if(&cam("cam1"), ConnectionId(11)).is_some());
        assert!(registry.lookup_consumer(&cam("cam1")).is_none());
    }

    #[test]
    fn test_producers_mut_visits_every_kind() {
        let mut registry = ConnectionRegistry::new();

        registry.register_producer(cam("a"), ChannelKind::Stream, producer(1));
        registry.register_producer(cam("a"), ChannelKind::Command, producer(2));
        registry.register_producer(cam("b"), ChannelKind::Stream, producer(3));

        for (_, _, entry) in registry.producers_mut() {
            entry.alive = false;
        }

        let mut ids: Vec<u64> = registry.producers_mut().map(|(_, _, e)| e.id.0).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(!registry.lookup_producer(&cam("a"), ChannelKind::Command).unwrap().alive);
    }

    #[test]
    fn test_drain_empties() {
        let mut registry = ConnectionRegistry::new();
        let (c, _rx) = consumer(5);

        registry.register_producer(cam("a"), ChannelKind::Stream, producer(1));
        registry.register_producer(cam("a"), ChannelKind::Command, producer(2));
        registry.register_consumer(cam("a"), c);

        let (producers, consumers) = registry.drain();
        assert_eq!(producers.len(), 2);
        assert_eq!(consumers.len(), 1);
        assert_eq!(registry.producer_count(ChannelKind::Stream), 0);
        assert_eq!(registry.consumer_count(), 0);
    }
}
