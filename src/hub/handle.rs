//! Cloneable handle to a running hub
//!
//! Everything outside the coordinator task talks to the hub through this
//! handle: the socket layer registers producers, the HTTP layer requests
//! viewer streams.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::HubError;
use crate::registry::{CameraId, ChannelKind, ConnectionId};
use crate::stats::HubStats;

use super::config::HubConfig;
use super::consumer::ConsumerStream;
use super::coordinator::Hub;
use super::event::HubEvent;
use super::producer::{ProducerSession, ProducerSignals};
use super::state::StreamPhase;

/// Handle to the hub coordinator
#[derive(Debug, Clone)]
pub struct HubHandle {
    events: mpsc::UnboundedSender<HubEvent>,
    next_id: Arc<AtomicU64>,
}

impl HubHandle {
    /// Start a coordinator task and return a handle to it
    pub fn spawn(config: HubConfig) -> (Self, JoinHandle<()>) {
        let (events, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(Hub::new(config).run(rx));

        let handle = Self {
            events,
            next_id: Arc::new(AtomicU64::new(1)),
        };
        (handle, task)
    }

    fn next_id(&self) -> ConnectionId {
        ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn post(&self, event: HubEvent) -> Result<(), HubError> {
        self.events.send(event).map_err(|_| HubError::Closed)
    }

    /// Register a producer connection
    ///
    /// Replaces any connection already registered for `(camera, kind)`. The
    /// acknowledgement token is queued on the returned signals immediately.
    pub fn register_producer(
        &self,
        camera: CameraId,
        kind: ChannelKind,
    ) -> Result<(ProducerSession, ProducerSignals), HubError> {
        let id = self.next_id();
        let (signals_tx, signals_rx) = mpsc::unbounded_channel();

        self.post(HubEvent::ProducerConnected {
            camera: camera.clone(),
            kind,
            id,
            signals: signals_tx,
        })?;

        let session = ProducerSession::new(camera, kind, id, self.events.clone());
        Ok((session, ProducerSignals::new(signals_rx)))
    }

    /// Attach a viewer to a camera's stream channel
    ///
    /// Fails fast with `UnknownCamera` if no stream producer is registered;
    /// the registry is left untouched in that case.
    pub async fn request_stream(&self, camera: CameraId) -> Result<ConsumerStream, HubError> {
        let id = self.next_id();
        let (chunks_tx, chunks_rx) = mpsc::unbounded_channel();
        let (reply_tx, reply_rx) = oneshot::channel();

        self.post(HubEvent::ConsumerRequested {
            camera: camera.clone(),
            id,
            chunks: chunks_tx,
            reply: reply_tx,
        })?;

        reply_rx.await.map_err(|_| HubError::Closed)??;

        Ok(ConsumerStream::new(camera, id, chunks_rx, self.events.clone()))
    }

    /// Lifecycle phase of a camera's stream channel
    pub async fn phase(&self, camera: &CameraId) -> Result<StreamPhase, HubError> {
        let (reply, rx) = oneshot::channel();
        self.post(HubEvent::Phase {
            camera: camera.clone(),
            reply,
        })?;
        rx.await.map_err(|_| HubError::Closed)
    }

    /// Statistics snapshot
    pub async fn stats(&self) -> Result<HubStats, HubError> {
        let (reply, rx) = oneshot::channel();
        self.post(HubEvent::Stats { reply })?;
        rx.await.map_err(|_| HubError::Closed)
    }

    /// Run a liveness sweep now, ahead of the timer
    pub fn sweep(&self) -> Result<(), HubError> {
        self.post(HubEvent::Sweep)
    }

    /// Tear down every connection and stop the coordinator
    pub fn shutdown(&self) {
        let _ = self.post(HubEvent::Shutdown);
    }

    /// Whether the coordinator has stopped
    pub fn is_closed(&self) -> bool {
        self.events.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::relay::ProducerSignal;

    fn cam(id: &str) -> CameraId {
        CameraId::new(id).unwrap()
    }

    #[tokio::test]
    async fn test_request_unknown_camera() {
        let (hub, _task) = HubHandle::spawn(HubConfig::default());

        let result = hub.request_stream(cam("nope")).await;

        assert!(matches!(result, Err(HubError::UnknownCamera(_))));
        assert_eq!(hub.stats().await.unwrap().consumers, 0);
    }

    #[tokio::test]
    async fn test_scenario_end_to_end() {
        let (hub, _task) = HubHandle::spawn(HubConfig::default());

        let (session, mut signals) = hub
            .register_producer(cam("cam1"), ChannelKind::Stream)
            .unwrap();
        assert_eq!(signals.recv().await, Some(ProducerSignal::Ack));

        let mut viewer = hub.request_stream(cam("cam1")).await.unwrap();
        assert_eq!(hub.phase(&cam("cam1")).await.unwrap(), StreamPhase::Streaming);

        session.frame(Bytes::from_static(&[0x01, 0x02, 0x03]));
        let chunk = viewer.next_chunk().await.unwrap();
        assert_eq!(
            &chunk[..],
            b"--MYBOUNDARY\r\nContent-Type: image/jpeg\r\nContent-Length: 3\r\n\r\n\x01\x02\x03\r\n"
        );
        assert_eq!(signals.recv().await, Some(ProducerSignal::Ack));

        drop(session);
        assert_eq!(viewer.next_chunk().await, None);
        assert_eq!(hub.phase(&cam("cam1")).await.unwrap(), StreamPhase::NoProducer);
    }

    #[tokio::test]
    async fn test_viewer_drop_signals_stop() {
        let (hub, _task) = HubHandle::spawn(HubConfig::default().signaling(true));

        let (_session, mut signals) = hub
            .register_producer(cam("cam1"), ChannelKind::Stream)
            .unwrap();
        let viewer = hub.request_stream(cam("cam1")).await.unwrap();
        drop(viewer);

        assert_eq!(signals.recv().await, Some(ProducerSignal::Ack));
        assert_eq!(signals.recv().await, Some(ProducerSignal::Start));
        assert_eq!(signals.recv().await, Some(ProducerSignal::Stop));
        assert_eq!(hub.phase(&cam("cam1")).await.unwrap(), StreamPhase::ProducerIdle);
    }

    #[tokio::test]
    async fn test_manual_sweeps_terminate_silent_producer() {
        let (hub, _task) = HubHandle::spawn(HubConfig::default());

        let (session, mut signals) = hub
            .register_producer(cam("cam1"), ChannelKind::Command)
            .unwrap();
        hub.sweep().unwrap();
        hub.sweep().unwrap();

        assert_eq!(signals.recv().await, Some(ProducerSignal::Ack));
        assert_eq!(signals.recv().await, Some(ProducerSignal::Ping));
        assert_eq!(signals.recv().await, Some(ProducerSignal::Terminate));

        // The connection task exits and drops its session
        drop(session);
        assert_eq!(signals.recv().await, None);
        assert_eq!(hub.stats().await.unwrap().command_producers, 0);
    }

    #[tokio::test]
    async fn test_shutdown_closes_everything() {
        let (hub, task) = HubHandle::spawn(HubConfig::default());

        let (_session, mut signals) = hub
            .register_producer(cam("cam1"), ChannelKind::Stream)
            .unwrap();
        let mut viewer = hub.request_stream(cam("cam1")).await.unwrap();

        hub.shutdown();
        task.await.unwrap();

        assert_eq!(viewer.next_chunk().await, None);
        assert_eq!(signals.recv().await, Some(ProducerSignal::Ack));
        assert_eq!(signals.recv().await, Some(ProducerSignal::Terminate));
        assert!(hub.is_closed());
        assert!(matches!(
            hub.request_stream(cam("cam1")).await,
            Err(HubError::Closed)
        ));
    }
}
