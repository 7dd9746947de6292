//! WebSocket connection state machine.
//!
//! Each connection runs as one reader task plus one writer task. The
//! writer drains the session's outbound queue into the socket; the reader
//! classifies inbound frames and drives the [`RelayService`]. Whichever
//! side stops first ends the session.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use super::messages::{ClientMessage, ServerMessage};
use crate::config::RelayConfig;
use crate::domain::{Action, BroadcastOutcome, OutboundFrame, RoomId, SessionHandle, SessionId};
use crate::error::RelayError;
use crate::service::RelayService;

/// How long a closing connection waits for its writer to flush.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Lifecycle of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Socket accepted, not yet registered in the room.
    Connecting,
    /// Registered; inbound frames are processed.
    Joined,
    /// Deregistered. Terminal.
    Closed,
}

impl ConnectionState {
    /// Returns `true` if moving to `next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Connecting, Self::Joined)
                | (Self::Connecting, Self::Closed)
                | (Self::Joined, Self::Closed)
        )
    }
}

/// Per-connection settings taken from [`RelayConfig`].
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    /// Outbound queue capacity.
    pub queue_capacity: usize,
    /// Largest accepted inbound frame in bytes.
    pub max_message_bytes: usize,
    /// Whether dropped frames are reported back to their sender.
    pub notify_protocol_errors: bool,
}

impl From<&RelayConfig> for ConnectionSettings {
    fn from(config: &RelayConfig) -> Self {
        Self {
            queue_capacity: config.session_queue_capacity,
            max_message_bytes: config.max_message_bytes,
            notify_protocol_errors: config.notify_protocol_errors,
        }
    }
}

/// Whether the read loop keeps going after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading.
    Continue,
    /// The session is gone; stop reading.
    Close,
}

/// Protocol side of one session, independent of the socket.
#[derive(Debug)]
pub struct Connection {
    session_id: SessionId,
    room_id: RoomId,
    service: Arc<RelayService>,
    settings: ConnectionSettings,
    state: ConnectionState,
}

impl Connection {
    /// Creates a connection in the `Connecting` state.
    #[must_use]
    pub fn new(room_id: RoomId, service: Arc<RelayService>, settings: ConnectionSettings) -> Self {
        Self {
            session_id: SessionId::new(),
            room_id,
            service,
            settings,
            state: ConnectionState::Connecting,
        }
    }

    /// Returns the session id.
    #[must_use]
    pub const fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    fn transition(&mut self, next: ConnectionState) {
        if !self.state.can_transition_to(next) {
            return;
        }
        tracing::debug!(
            room_id = %self.room_id,
            session_id = %self.session_id,
            from = ?self.state,
            to = ?next,
            "connection state change"
        );
        self.state = next;
    }

    /// Registers the session; the room queues it a `reset` on `sender`.
    ///
    /// # Errors
    ///
    /// Propagates [`RelayService::join`] failures; the connection is then
    /// `Closed`.
    pub async fn join(&mut self, sender: mpsc::Sender<OutboundFrame>) -> Result<(), RelayError> {
        let handle = SessionHandle::new(self.session_id, self.room_id.clone(), sender);
        match self.service.join(handle).await {
            Ok(_) => {
                self.transition(ConnectionState::Joined);
                Ok(())
            }
            Err(err) => {
                self.transition(ConnectionState::Closed);
                Err(err)
            }
        }
    }

    /// Handles one inbound text frame.
    ///
    /// Protocol errors drop the frame and keep the session; losing room
    /// membership closes it.
    pub async fn dispatch(&mut self, text: &str) -> Flow {
        if self.state != ConnectionState::Joined {
            return Flow::Close;
        }
        let result = match ClientMessage::parse(text, self.settings.max_message_bytes) {
            Ok(message) => {
                let msg_type = message.type_str();
                self.apply(message).await.map(|outcome| (msg_type, outcome))
            }
            Err(err) => Err(err),
        };

        match result {
            Ok((msg_type, outcome)) => {
                self.log_outcome(msg_type, &outcome);
                Flow::Continue
            }
            Err(err) if err.is_protocol_error() => self.reject(err).await,
            Err(RelayError::SessionNotJoined(_) | RelayError::RoomNotFound(_)) => {
                tracing::debug!(
                    room_id = %self.room_id,
                    session_id = %self.session_id,
                    "session no longer registered"
                );
                Flow::Close
            }
            Err(err) => {
                tracing::error!(
                    room_id = %self.room_id,
                    session_id = %self.session_id,
                    error = %err,
                    "failed to relay message"
                );
                Flow::Continue
            }
        }
    }

    async fn apply(&self, message: ClientMessage) -> Result<BroadcastOutcome, RelayError> {
        let sid = self.session_id;
        match message {
            ClientMessage::Draw(cmd) => {
                let actions = vec![Action::Draw(cmd.into_segment(sid))];
                self.service.append(&self.room_id, sid, actions).await
            }
            ClientMessage::Shape(cmd) => {
                let username = cmd.username.clone();
                let actions = vec![
                    Action::Draw(cmd.into_segment(sid)),
                    Action::end_stroke(sid, username),
                ];
                self.service.append(&self.room_id, sid, actions).await
            }
            ClientMessage::EndStroke { username } => {
                let actions = vec![Action::end_stroke(sid, username)];
                self.service.append(&self.room_id, sid, actions).await
            }
            ClientMessage::Undo { .. } => self
                .service
                .undo(&self.room_id, sid)
                .await
                .map(|(_, outcome)| outcome),
        }
    }

    /// Drops an unusable frame and optionally tells the sender why.
    pub async fn reject(&mut self, err: RelayError) -> Flow {
        tracing::warn!(
            room_id = %self.room_id,
            session_id = %self.session_id,
            error = %err,
            "dropping client message"
        );
        if !self.settings.notify_protocol_errors {
            return Flow::Continue;
        }
        let frame = match ServerMessage::error(&err).encode() {
            Ok(frame) => frame,
            Err(encode_err) => {
                tracing::error!(error = %encode_err, "failed to encode error notice");
                return Flow::Continue;
            }
        };
        match self
            .service
            .send_to(&self.room_id, self.session_id, &frame)
            .await
        {
            Ok(()) => Flow::Continue,
            Err(_) => Flow::Close,
        }
    }

    /// Deregisters the session and enters `Closed`. Idempotent.
    pub async fn close(&mut self) {
        if self.state == ConnectionState::Closed {
            return;
        }
        self.service.leave(&self.room_id, self.session_id).await;
        self.transition(ConnectionState::Closed);
    }

    fn log_outcome(&self, msg_type: &str, outcome: &BroadcastOutcome) {
        tracing::trace!(
            room_id = %self.room_id,
            session_id = %self.session_id,
            msg_type,
            delivered = outcome.delivered,
            evicted = outcome.evicted.len(),
            "message relayed"
        );
    }
}

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Registers the session in `room_id` and sends it the room snapshot.
/// - Reads frames from the client and dispatches them.
/// - Forwards queued frames from the room to the client.
pub async fn run_connection(
    socket: WebSocket,
    room_id: RoomId,
    service: Arc<RelayService>,
    settings: ConnectionSettings,
) {
    let (ws_tx, mut ws_rx) = socket.split();
    let (frame_tx, frame_rx) = mpsc::channel(settings.queue_capacity.max(1));
    let mut writer = tokio::spawn(write_loop(ws_tx, frame_rx));

    let mut conn = Connection::new(room_id, service, settings);
    if let Err(err) = conn.join(frame_tx).await {
        tracing::error!(session_id = %conn.session_id(), error = %err, "join failed");
        writer.abort();
        return;
    }

    let mut writer_done = false;
    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                let flow = match msg {
                    Some(Ok(Message::Text(text))) => conn.dispatch(&text).await,
                    Some(Ok(Message::Binary(_))) => {
                        conn.reject(RelayError::MalformedMessage(
                            "binary frames are not supported".to_string(),
                        ))
                        .await
                    }
                    Some(Ok(Message::Close(_))) | None => Flow::Close,
                    Some(Ok(_)) => Flow::Continue,
                    Some(Err(err)) => {
                        tracing::debug!(session_id = %conn.session_id(), error = %err, "ws read error");
                        Flow::Close
                    }
                };
                if flow == Flow::Close {
                    break;
                }
            }
            _ = &mut writer => {
                // Evicted, or the socket refused a write.
                writer_done = true;
                break;
            }
        }
    }

    conn.close().await;

    // Leaving dropped the room's sender, so the writer flushes what is
    // queued and then closes the socket.
    if !writer_done && tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer).await.is_err() {
        writer.abort();
    }

    tracing::debug!(session_id = %conn.session_id(), "ws connection closed");
}

async fn write_loop(
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut frames: mpsc::Receiver<OutboundFrame>,
) {
    while let Some(frame) = frames.recv().await {
        if ws_tx.send(Message::text(frame.to_string())).await.is_err() {
            return;
        }
    }
    let _ = ws_tx.close().await;
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::RoomRegistry;

    fn settings(notify: bool) -> ConnectionSettings {
        ConnectionSettings {
            queue_capacity: 16,
            max_message_bytes: 1024,
            notify_protocol_errors: notify,
        }
    }

    fn room() -> RoomId {
        let Ok(id) = RoomId::new("r1") else {
            panic!("valid room id");
        };
        id
    }

    async fn joined(
        service: &Arc<RelayService>,
        notify: bool,
    ) -> (Connection, mpsc::Receiver<OutboundFrame>) {
        let (tx, mut rx) = mpsc::channel(16);
        let mut conn = Connection::new(room(), Arc::clone(service), settings(notify));
        assert!(conn.join(tx).await.is_ok());
        assert_eq!(conn.state(), ConnectionState::Joined);
        let Ok(first) = rx.try_recv() else {
            panic!("expected reset");
        };
        assert!(first.contains("\"reset\""));
        (conn, rx)
    }

    fn service() -> Arc<RelayService> {
        Arc::new(RelayService::new(Arc::new(RoomRegistry::new()), false))
    }

    fn next_type(rx: &mut mpsc::Receiver<OutboundFrame>) -> String {
        let Ok(frame) = rx.try_recv() else {
            panic!("expected a frame");
        };
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&frame) else {
            panic!("frame is not JSON");
        };
        value["type"].as_str().unwrap_or_default().to_string()
    }

    #[test]
    fn closed_is_terminal() {
        assert!(ConnectionState::Connecting.can_transition_to(ConnectionState::Joined));
        assert!(ConnectionState::Joined.can_transition_to(ConnectionState::Closed));
        assert!(!ConnectionState::Closed.can_transition_to(ConnectionState::Joined));
        assert!(!ConnectionState::Joined.can_transition_to(ConnectionState::Connecting));
    }

    #[tokio::test]
    async fn draw_is_relayed_without_self_echo() {
        let service = service();
        let (mut a, mut rx_a) = joined(&service, true).await;
        let (_b, mut rx_b) = joined(&service, true).await;

        let flow = a
            .dispatch(r#"{"type":"draw","x1":0,"y1":0,"x2":10,"y2":10,"color":"red"}"#)
            .await;
        assert_eq!(flow, Flow::Continue);
        assert_eq!(next_type(&mut rx_b), "draw");
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn shape_commits_a_whole_stroke() {
        let service = service();
        let (mut a, _rx_a) = joined(&service, true).await;
        let (_b, mut rx_b) = joined(&service, true).await;

        let _ = a
            .dispatch(r#"{"type":"rectangle","x1":0,"y1":0,"x2":4,"y2":4,"color":"blue"}"#)
            .await;
        assert_eq!(next_type(&mut rx_b), "draw");
        assert_eq!(next_type(&mut rx_b), "end_stroke");

        let Ok((_, log)) = service.detail(&room()).await else {
            panic!("room missing");
        };
        assert_eq!(log.len(), 2);

        let _ = a.dispatch(r#"{"type":"undo"}"#).await;
        let Ok((_, log)) = service.detail(&room()).await else {
            panic!("room missing");
        };
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn undo_resets_requester_too() {
        let service = service();
        let (mut a, mut rx_a) = joined(&service, true).await;
        let (_b, mut rx_b) = joined(&service, true).await;

        let _ = a.dispatch(r#"{"type":"undo"}"#).await;
        assert_eq!(next_type(&mut rx_a), "reset");
        assert_eq!(next_type(&mut rx_b), "reset");
    }

    #[tokio::test]
    async fn malformed_frame_is_dropped_and_reported() {
        let service = service();
        let (mut a, mut rx_a) = joined(&service, true).await;
        let (_b, mut rx_b) = joined(&service, true).await;

        assert_eq!(a.dispatch("{oops").await, Flow::Continue);
        assert_eq!(a.dispatch(r#"{"type":"paint"}"#).await, Flow::Continue);
        assert_eq!(next_type(&mut rx_a), "error");
        assert_eq!(next_type(&mut rx_a), "error");
        assert!(rx_b.try_recv().is_err());

        let _ = a.dispatch(r#"{"type":"end_stroke"}"#).await;
        assert_eq!(next_type(&mut rx_b), "end_stroke");
    }

    #[tokio::test]
    async fn every_protocol_error_keeps_the_session() {
        let service = service();
        let (mut a, mut rx_a) = joined(&service, true).await;
        let oversized = format!(r#"{{"type":"undo","username":"{}"}}"#, "x".repeat(2048));
        let cases = [
            ("{oops".to_string(), 1001),
            (r#"{"type":"paint"}"#.to_string(), 1002),
            (
                r#"{"type":"draw","x1":0,"y1":0,"x2":1,"y2":1,"color":"red","width":-1}"#
                    .to_string(),
                1003,
            ),
            (oversized, 1004),
        ];
        for (text, code) in cases {
            assert_eq!(a.dispatch(&text).await, Flow::Continue);
            let Ok(frame) = rx_a.try_recv() else {
                panic!("expected an error notice");
            };
            let Ok(value) = serde_json::from_str::<serde_json::Value>(&frame) else {
                panic!("frame is not JSON");
            };
            assert_eq!(value["type"], "error");
            assert_eq!(value["payload"]["code"], code);
        }
        assert_eq!(a.state(), ConnectionState::Joined);
        let Ok((_, log)) = service.detail(&room()).await else {
            panic!("room missing");
        };
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn silent_rejection_when_notices_disabled() {
        let service = service();
        let (mut a, mut rx_a) = joined(&service, false).await;
        assert_eq!(a.dispatch("not json").await, Flow::Continue);
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn closed_connection_stops_processing() {
        let service = service();
        let (mut a, _rx_a) = joined(&service, true).await;
        a.close().await;
        assert_eq!(a.state(), ConnectionState::Closed);
        a.close().await;
        assert_eq!(a.dispatch(r#"{"type":"undo"}"#).await, Flow::Close);
        let Ok((summary, _)) = service.detail(&room()).await else {
            panic!("room missing");
        };
        assert_eq!(summary.session_count, 0);
    }

    #[tokio::test]
    async fn evicted_session_is_told_to_close() {
        let service = service();
        let (mut a, rx_a) = joined(&service, true).await;
        let (mut b, _rx_b) = joined(&service, true).await;
        drop(rx_a);

        // b's broadcast evicts a, whose next frame finds it unregistered.
        let _ = b.dispatch(r#"{"type":"end_stroke"}"#).await;
        assert_eq!(a.dispatch(r#"{"type":"end_stroke"}"#).await, Flow::Close);
    }
}
