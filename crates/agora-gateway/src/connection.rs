use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket, close_code};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use agora_types::events::ClientEvent;

use crate::room::{Flow, Room};
use crate::session::{Identity, SessionStore};

/// How long an unauthenticated socket may take to send `Connect`.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Consecutive unanswered pings before the connection is dropped.
const MAX_MISSED_PONGS: u8 = 2;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HandshakeError {
    #[error("no Connect event within the handshake timeout")]
    Timeout,
    #[error("socket closed before authenticating")]
    Closed,
    #[error("session token is invalid, expired or revoked")]
    InvalidSession,
    #[error("expected a Connect event")]
    UnexpectedFrame,
}

/// Handle a WebSocket whose upgrade request already carried a valid session.
pub async fn handle_connection_authenticated(socket: WebSocket, room: Room, identity: Identity) {
    let (sender, receiver) = socket.split();
    debug!("{} authenticated at upgrade", identity.username);
    run_connection_loop(sender, receiver, room, identity.username).await;
}

/// Handle a WebSocket that must authenticate with a `Connect` event first.
/// Failing the handshake closes the socket without touching the room.
pub async fn handle_connection(socket: WebSocket, room: Room, sessions: SessionStore) {
    let (mut sender, mut receiver) = socket.split();

    let identity = match wait_for_connect(&mut receiver, &sessions).await {
        Ok(identity) => identity,
        Err(e) => {
            warn!("WebSocket client failed to authenticate: {}", e);
            let _ = sender
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::POLICY,
                    reason: "authentication required".into(),
                })))
                .await;
            return;
        }
    };

    debug!("{} authenticated with Connect", identity.username);
    run_connection_loop(sender, receiver, room, identity.username).await;
}

async fn run_connection_loop(
    mut sender: SplitSink<WebSocket, Message>,
    mut receiver: SplitStream<WebSocket>,
    room: Room,
    username: String,
) {
    // Ready and the history snapshot are the first frames in the outbox
    let (connection_id, mut outbox) = match room.join(&username) {
        Ok(joined) => joined,
        Err(e) => {
            warn!("Refusing connection for {:?}: {}", username, e);
            let _ = sender.send(Message::Close(None)).await;
            return;
        }
    };

    // Shared flag for heartbeat
    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received.clone();
    let heartbeat_interval = room.heartbeat_interval();

    // Forward queued frames -> client, with heartbeat
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(heartbeat_interval);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                frame = outbox.recv() => {
                    let Some(frame) = frame else { break };
                    if sender.send(Message::Text(frame)).await.is_err() {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= MAX_MISSED_PONGS {
                            warn!("Heartbeat timeout (missed {} pongs), dropping connection", missed_heartbeats);
                            break;
                        }
                    }
                    if sender.send(Message::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
            }
        }
        let _ = sender.close().await;
    });

    // Read frames from client. This never waits on event handling, so pongs
    // are seen even while a bot command is in flight.
    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<ClientEvent>();
    let username_recv = username.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => {
                        trace!("{} ({}) -> {}", username_recv, connection_id, event_name(&event));
                        if events_tx.send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(
                            "{} ({}) bad event: {} -- raw: {}",
                            username_recv,
                            connection_id,
                            e,
                            text.chars().take(200).collect::<String>()
                        );
                    }
                },
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Handle events one at a time, in arrival order
    let room_worker = room.clone();
    let username_worker = username.clone();
    let mut worker_task = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            if room_worker
                .handle_event(connection_id, &username_worker, event)
                .await
                == Flow::Close
            {
                break;
            }
        }
    });

    // The worker is not aborted when the socket goes away: it finishes the
    // events already queued and exits once the channel is drained.
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
        _ = &mut worker_task => {
            recv_task.abort();
            send_task.abort();
        }
    }

    room.leave(connection_id);
    info!("{} ({}) disconnected from gateway", username, connection_id);
}

async fn wait_for_connect(
    receiver: &mut SplitStream<WebSocket>,
    sessions: &SessionStore,
) -> Result<Identity, HandshakeError> {
    let handshake = async {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    return match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(ClientEvent::Connect { session_token }) => sessions
                            .resolve(&session_token)
                            .ok_or(HandshakeError::InvalidSession),
                        _ => Err(HandshakeError::UnexpectedFrame),
                    };
                }
                Message::Close(_) => return Err(HandshakeError::Closed),
                _ => {}
            }
        }
        Err(HandshakeError::Closed)
    };

    tokio::time::timeout(HANDSHAKE_TIMEOUT, handshake)
        .await
        .unwrap_or(Err(HandshakeError::Timeout))
}

fn event_name(event: &ClientEvent) -> &'static str {
    match event {
        ClientEvent::Connect { .. } => "Connect",
        ClientEvent::ChatMessage { .. } => "ChatMessage",
        ClientEvent::ReactToMessage { .. } => "ReactToMessage",
        ClientEvent::VoiceNote { .. } => "VoiceNote",
        ClientEvent::Image { .. } => "Image",
        ClientEvent::Disconnect => "Disconnect",
    }
}
