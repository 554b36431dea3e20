//! Producer WebSocket surface
//!
//! Cameras connect to `/{camera}/{kind}`. Each accepted socket gets a reader
//! task that forwards inbound traffic to the hub, and a writer task that
//! sends the hub's signals back out. Command messages go through a third
//! task that calls the application handler.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::Response;
use bytes::Bytes;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

use crate::error::{HubError, Result};
use crate::hub::{ProducerSession, ProducerSignals};
use crate::registry::{CameraId, ChannelKind};
use crate::relay::ProducerSignal;

use super::handler::HubHandler;
use super::listener::AppState;

/// Outbound messages queued for a producer before further ones are dropped
const WRITE_BACKLOG: usize = 32;

/// Validate the socket path, then upgrade
pub(super) async fn producer_upgrade<H: HubHandler>(
    ws: WebSocketUpgrade,
    Path((camera, kind)): Path<(String, String)>,
    State(state): State<Arc<AppState<H>>>,
) -> std::result::Result<Response, HubError> {
    let camera = CameraId::new(&camera)?;
    let kind: ChannelKind = kind.parse()?;

    tracing::debug!(camera = %camera, kind = %kind, "Producer upgrade requested");

    Ok(ws.on_upgrade(move |socket| serve_producer(socket, camera, kind, state)))
}

async fn serve_producer<H: HubHandler>(
    socket: WebSocket,
    camera: CameraId,
    kind: ChannelKind,
    state: Arc<AppState<H>>,
) {
    let (session, mut signals) = match state.hub.register_producer(camera.clone(), kind) {
        Ok(pair) => pair,
        Err(e) => {
            tracing::warn!(camera = %camera, kind = %kind, error = %e, "Producer rejected");
            return;
        }
    };

    state.handler.on_producer_connected(&camera, kind).await;

    let (sink, mut stream) = socket.split();
    let (outbound, writer) = spawn_writer(sink);
    let commands = match kind {
        ChannelKind::Command => Some(spawn_command_worker(
            Arc::clone(&state.handler),
            camera.clone(),
        )),
        ChannelKind::Stream => None,
    };

    let result = pump(
        &session,
        &mut signals,
        &outbound,
        commands.as_ref().map(|(queue, _)| queue),
        &mut stream,
    )
    .await;

    // Dropping both halves without a close handshake cuts the peer off,
    // even while a write to it is still pending
    writer.abort();
    drop(stream);

    if let Err(e) = result {
        tracing::warn!(
            camera = %camera,
            kind = %kind,
            connection = %session.id(),
            error = %e,
            "Error on producer socket"
        );
    }

    tracing::debug!(camera = %camera, kind = %kind, connection = %session.id(), "Producer socket closed");

    // Reports the close; registry cleanup happens on the hub
    drop(session);

    if let Some((queue, worker)) = commands {
        drop(queue);
        if let Err(e) = worker.await {
            tracing::error!(camera = %camera, error = %e, "Command handler task failed");
        }
    }
    state.handler.on_producer_closed(&camera, kind).await;
}

/// Spawn the task that owns the socket's write half
///
/// The queue is bounded. The reader side never waits on it, so a peer that
/// stops reading can stall only this task.
fn spawn_writer<S>(mut sink: S) -> (mpsc::Sender<Message>, JoinHandle<()>)
where
    S: Sink<Message> + Send + Unpin + 'static,
    S::Error: std::fmt::Display,
{
    let (tx, mut rx) = mpsc::channel::<Message>(WRITE_BACKLOG);

    let task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Err(e) = sink.send(message).await {
                tracing::debug!(error = %e, "Producer socket write failed");
                break;
            }
        }
    });

    (tx, task)
}

/// Spawn the task that hands command messages to the application, in order
fn spawn_command_worker<H: HubHandler>(
    handler: Arc<H>,
    camera: CameraId,
) -> (mpsc::UnboundedSender<Bytes>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Bytes>();

    let task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            handler.on_command(&camera, message).await;
        }
    });

    (tx, task)
}

/// Shuttle traffic until either side ends the connection
///
/// Nothing in this loop waits on the peer reading or on application code,
/// so a queued `Terminate` is always acted on.
async fn pump<S>(
    session: &ProducerSession,
    signals: &mut ProducerSignals,
    outbound: &mpsc::Sender<Message>,
    commands: Option<&mpsc::UnboundedSender<Bytes>>,
    stream: &mut S,
) -> Result<()>
where
    S: Stream<Item = std::result::Result<Message, axum::Error>> + Unpin,
{
    loop {
        tokio::select! {
            signal = signals.recv() => {
                let Some(signal) = signal else {
                    return Ok(());
                };
                let Some(message) = signal_message(signal) else {
                    return Ok(());
                };

                match outbound.try_send(message) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        if signal == ProducerSignal::Ack {
                            tracing::trace!(connection = %session.id(), "Write backlog full, ack dropped");
                        } else {
                            tracing::debug!(
                                camera = %session.camera(),
                                connection = %session.id(),
                                signal = ?signal,
                                "Write backlog full, signal dropped"
                            );
                        }
                    }
                    // Writer gave up on the socket
                    Err(TrySendError::Closed(_)) => return Ok(()),
                }
            }
            message = stream.next() => match message {
                Some(Ok(message)) => {
                    if !on_message(session, commands, message) {
                        return Ok(());
                    }
                }
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(()),
            }
        }
    }
}

/// Forward one inbound message. Returns false on a close frame.
fn on_message(
    session: &ProducerSession,
    commands: Option<&mpsc::UnboundedSender<Bytes>>,
    message: Message,
) -> bool {
    let payload = match message {
        Message::Binary(data) => data,
        Message::Text(text) => Bytes::copy_from_slice(text.as_str().as_bytes()),
        Message::Pong(_) => {
            session.pong();
            return true;
        }
        // Answered by the transport itself
        Message::Ping(_) => return true,
        Message::Close(_) => return false,
    };

    match session.kind() {
        ChannelKind::Stream => session.frame(payload),
        ChannelKind::Command => {
            session.activity();
            if let Some(commands) = commands {
                let _ = commands.send(payload);
            }
        }
    }

    true
}

/// Wire message for a signal. `None` means drop the connection.
fn signal_message(signal: ProducerSignal) -> Option<Message> {
    match signal {
        ProducerSignal::Terminate => None,
        ProducerSignal::Ping => Some(Message::Ping(Bytes::new())),
        other => other.token().map(|token| Message::Text(token.into())),
    }
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use std::time::Duration;

    use futures_util::stream;

    use super::*;
    use crate::hub::event::{HubEvent, Inbound};
    use crate::registry::ConnectionId;

    /// A peer that never reads: every write stays pending
    struct StalledSink;

    impl Sink<Message> for StalledSink {
        type Error = axum::Error;

        fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
            Poll::Pending
        }

        fn start_send(self: Pin<&mut Self>, _item: Message) -> std::result::Result<(), Self::Error> {
            Ok(())
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
            Poll::Pending
        }

        fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }
    }

    fn open_session(
        kind: ChannelKind,
    ) -> (
        ProducerSession,
        mpsc::UnboundedReceiver<HubEvent>,
        mpsc::UnboundedSender<ProducerSignal>,
        ProducerSignals,
    ) {
        let (events_tx, events) = mpsc::unbounded_channel();
        let session = ProducerSession::new(
            CameraId::new("cam1").unwrap(),
            kind,
            ConnectionId(1),
            events_tx,
        );
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        (session, events, signal_tx, ProducerSignals::new(signal_rx))
    }

    #[tokio::test]
    async fn test_stalled_peer_keeps_relaying_and_terminates() {
        const FRAMES: usize = WRITE_BACKLOG * 4;

        let (session, mut events, signal_tx, mut signals) = open_session(ChannelKind::Stream);
        let (outbound, writer) = spawn_writer(StalledSink);

        // Far more acks than the writer can hold
        for _ in 0..FRAMES {
            signal_tx.send(ProducerSignal::Ack).unwrap();
        }

        let mut inbound = stream::iter(
            (0..FRAMES).map(|i| Ok(Message::Binary(Bytes::from(vec![i as u8])))),
        )
        .chain(stream::pending());

        let task = tokio::spawn(async move {
            pump(&session, &mut signals, &outbound, None, &mut inbound)
                .await
                .is_ok()
        });

        let mut frames = 0;
        while frames < FRAMES {
            let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
                .await
                .expect("frames stopped flowing")
                .unwrap();
            match event {
                HubEvent::ProducerInbound {
                    inbound: Inbound::Frame(data),
                    ..
                } => {
                    assert_eq!(data, Bytes::from(vec![frames as u8]));
                    frames += 1;
                }
                other => panic!("unexpected event: {:?}", other),
            }
        }

        signal_tx.send(ProducerSignal::Terminate).unwrap();
        let finished = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("terminate was not acted on")
            .unwrap();
        assert!(finished);

        // The session was dropped with the pump task
        assert!(matches!(
            events.recv().await,
            Some(HubEvent::ProducerClosed { .. })
        ));
        writer.abort();
    }

    #[tokio::test]
    async fn test_command_messages_queued_in_order() {
        let (session, mut events, _signal_tx, _signals) = open_session(ChannelKind::Command);
        let (commands, mut queue) = mpsc::unbounded_channel();

        assert!(on_message(&session, Some(&commands), Message::Text("reboot".into())));
        assert!(on_message(
            &session,
            Some(&commands),
            Message::Binary(Bytes::from_static(b"zoom"))
        ));
        assert!(!on_message(&session, Some(&commands), Message::Close(None)));

        assert_eq!(queue.recv().await.unwrap(), Bytes::from_static(b"reboot"));
        assert_eq!(queue.recv().await.unwrap(), Bytes::from_static(b"zoom"));

        // Command traffic counts as activity, never as a frame
        for _ in 0..2 {
            assert!(matches!(
                events.recv().await,
                Some(HubEvent::ProducerInbound {
                    inbound: Inbound::Activity,
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_signal_messages() {
        assert_eq!(signal_message(ProducerSignal::Terminate), None);
        assert_eq!(
            signal_message(ProducerSignal::Ping),
            Some(Message::Ping(Bytes::new()))
        );
        assert_eq!(
            signal_message(ProducerSignal::Ack),
            Some(Message::Text("OK".into()))
        );
        assert_eq!(
            signal_message(ProducerSignal::Start),
            Some(Message::Text("START".into()))
        );
        assert_eq!(
            signal_message(ProducerSignal::Stop),
            Some(Message::Text("STOP".into()))
        );
    }
}
