use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::ws::Utf8Bytes;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use agora_types::events::{ClientEvent, ServerEvent};
use agora_types::models::{
    BotReply, Message, MessageBody, MessageId, MessageIdGenerator, SYSTEM_AUTHOR,
};

use crate::bot;
use crate::commands::{self, BotCommand, Classified};
use crate::history::HistoryLog;
use crate::media::{self, DEFAULT_MAX_BLOB_BYTES};
use crate::registry::{self, ConnectionId, ConnectionRegistry, RegistryError};
use crate::services::ExternalServices;

#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Author name of bot replies
    pub bot_name: String,
    pub max_blob_bytes: usize,
    /// Ping period of every connection
    pub heartbeat_interval: Duration,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            bot_name: "AgoraBot".into(),
            max_blob_bytes: DEFAULT_MAX_BLOB_BYTES,
            heartbeat_interval: Duration::from_secs(15),
        }
    }
}

/// What the connection loop should do after an inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Close,
}

/// The chat room: ordered history, live connections and bot dispatch.
///
/// Every history append and its broadcast happen under the history lock, so
/// all connections observe one total order and a joining connection's
/// snapshot lines up exactly with the live events it receives afterwards.
/// Locks are never held across an await; external calls run before any
/// shared state is touched.
#[derive(Clone)]
pub struct Room {
    inner: Arc<RoomInner>,
}

struct RoomInner {
    history: Mutex<HistoryLog>,
    registry: ConnectionRegistry,
    ids: MessageIdGenerator,
    services: Arc<dyn ExternalServices>,
    config: RoomConfig,
}

impl Room {
    pub fn new(services: Arc<dyn ExternalServices>, config: RoomConfig) -> Self {
        Self {
            inner: Arc::new(RoomInner {
                history: Mutex::new(HistoryLog::new()),
                registry: ConnectionRegistry::new(),
                ids: MessageIdGenerator::new(),
                services,
                config,
            }),
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.inner.registry
    }

    pub fn bot_name(&self) -> &str {
        &self.inner.config.bot_name
    }

    pub fn heartbeat_interval(&self) -> Duration {
        self.inner.config.heartbeat_interval
    }

    pub fn history_len(&self) -> usize {
        self.history().len()
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.history().snapshot()
    }

    fn history(&self) -> MutexGuard<'_, HistoryLog> {
        self.inner
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Activate an authenticated connection.
    ///
    /// Queues `Ready` and the history snapshot on the new connection's outbox,
    /// registers it and announces the arrival. The returned receiver yields
    /// those frames first, then every later broadcast.
    pub fn join(
        &self,
        username: &str,
    ) -> Result<(ConnectionId, mpsc::UnboundedReceiver<Utf8Bytes>), RegistryError> {
        if username.trim().is_empty() {
            return Err(RegistryError::Unauthenticated);
        }

        let connection_id = Uuid::new_v4();
        let (outbox, rx) = mpsc::unbounded_channel();

        let mut history = self.history();
        let greeting = [
            ServerEvent::Ready {
                connection_id,
                username: username.to_string(),
            },
            ServerEvent::ChatHistory {
                messages: history.snapshot(),
            },
        ];
        for event in &greeting {
            if let Some(frame) = registry::encode(event) {
                let _ = outbox.send(frame);
            }
        }

        self.inner.registry.register(connection_id, username, outbox)?;
        let notice = self.system_notice(format!("{} joined the chat", username));
        self.publish_locked(&mut history, notice);

        info!(
            "{} joined as {} ({} online)",
            username,
            connection_id,
            self.inner.registry.count()
        );
        Ok((connection_id, rx))
    }

    /// Deactivate a connection and announce the departure. Calling this for
    /// an unknown or already removed connection does nothing.
    pub fn leave(&self, connection_id: ConnectionId) {
        let mut history = self.history();
        let Some(username) = self.inner.registry.deregister(connection_id) else {
            return;
        };
        let notice = self.system_notice(format!("{} left the chat", username));
        self.publish_locked(&mut history, notice);

        info!(
            "{} left ({}, {} online)",
            username,
            connection_id,
            self.inner.registry.count()
        );
    }

    /// Append a message to the history and broadcast it.
    pub fn publish(&self, message: Message) {
        let mut history = self.history();
        self.publish_locked(&mut history, message);
    }

    fn publish_locked(&self, history: &mut HistoryLog, message: Message) {
        debug!("Publishing {} {} by {}", message.kind(), message.id, message.author);
        let event = ServerEvent::for_message(message.clone());
        history.append(message);
        self.inner.registry.broadcast_all(&event);
    }

    /// Attach a reaction and broadcast the message's updated reaction list.
    /// Reactions to unknown messages are dropped.
    pub fn react(&self, username: &str, message_id: MessageId, reaction: &str) {
        if reaction.trim().is_empty() {
            return;
        }

        let mut history = self.history();
        match history.attach_reaction(&message_id, reaction) {
            Ok(reactions) => {
                let event = ServerEvent::Reaction {
                    message_id,
                    reactions: reactions.to_vec(),
                };
                self.inner.registry.broadcast_all(&event);
            }
            Err(e) => debug!("Dropping reaction from {}: {}", username, e),
        }
    }

    /// Send a transient notice to one connection.
    pub fn notify(&self, connection_id: ConnectionId, text: impl Into<String>) {
        self.inner
            .registry
            .send_to(connection_id, &ServerEvent::notice(text));
    }

    /// Process one inbound event from an active connection to completion.
    pub async fn handle_event(
        &self,
        connection_id: ConnectionId,
        username: &str,
        event: ClientEvent,
    ) -> Flow {
        match event {
            ClientEvent::Connect { .. } => {
                debug!("{} sent Connect on an active connection, ignoring", username);
            }

            ClientEvent::ChatMessage {
                text,
                timestamp,
                reply_to,
            } => {
                self.handle_chat(connection_id, username, text, timestamp, reply_to)
                    .await;
            }

            ClientEvent::ReactToMessage {
                message_id,
                reaction,
            } => {
                self.react(username, message_id, &reaction);
            }

            ClientEvent::VoiceNote { audio, timestamp } => {
                self.handle_media(connection_id, username, MessageBody::VoiceNote { audio }, timestamp);
            }

            ClientEvent::Image { image, timestamp } => {
                self.handle_media(connection_id, username, MessageBody::Image { image }, timestamp);
            }

            ClientEvent::Disconnect => return Flow::Close,
        }
        Flow::Continue
    }

    async fn handle_chat(
        &self,
        connection_id: ConnectionId,
        username: &str,
        text: String,
        timestamp: Option<String>,
        reply_to: Option<MessageId>,
    ) {
        if text.trim().is_empty() {
            return;
        }

        match commands::classify(&text) {
            Classified::Chat => {
                let message = Message::new(self.inner.ids.next_id(), username, MessageBody::Text {
                    text,
                })
                .with_client_timestamp(timestamp)
                .with_reply_to(reply_to);
                self.publish(message);
            }
            Classified::Invalid(err) => {
                debug!("{} sent an incomplete command: {}", username, err);
                self.notify(connection_id, err.to_string());
            }
            Classified::Bot(command) => {
                self.dispatch_bot(connection_id, username, command).await;
            }
        }
    }

    fn handle_media(
        &self,
        connection_id: ConnectionId,
        username: &str,
        body: MessageBody,
        timestamp: Option<String>,
    ) {
        let blob = match &body {
            MessageBody::VoiceNote { audio } => audio,
            MessageBody::Image { image } => image,
            _ => return,
        };

        match media::validate_blob(blob, self.inner.config.max_blob_bytes) {
            Ok(size) => {
                debug!("{} posted {} bytes of media", username, size);
                let message = Message::new(self.inner.ids.next_id(), username, body)
                    .with_client_timestamp(timestamp);
                self.publish(message);
            }
            Err(e) => {
                warn!("Rejected media from {}: {}", username, e);
                self.notify(connection_id, e.to_string());
            }
        }
    }

    /// Run a bot command in its own task and wait for it.
    ///
    /// The caller's event loop stays sequential, but if the connection goes
    /// away mid-call the task is detached rather than cancelled, and its
    /// result still reaches the rest of the room.
    async fn dispatch_bot(&self, connection_id: ConnectionId, username: &str, command: BotCommand) {
        info!(
            "{} -> .{} {:?}",
            username,
            command.name(),
            command.argument()
        );

        let room = self.clone();
        let requested_by = username.to_string();
        let job = tokio::spawn(async move {
            room.run_bot_command(connection_id, requested_by, command)
                .await
        });
        if let Err(e) = job.await {
            warn!("Bot command task failed: {}", e);
        }
    }

    async fn run_bot_command(
        &self,
        connection_id: ConnectionId,
        requested_by: String,
        command: BotCommand,
    ) {
        let outcome = bot::run(self.inner.services.as_ref(), &command).await;

        match outcome {
            Ok(content) => {
                let reply = BotReply {
                    command: command.name().to_string(),
                    argument: command.argument().to_string(),
                    requested_by,
                    content,
                };
                let message = Message::new(
                    self.inner.ids.next_id(),
                    self.inner.config.bot_name.clone(),
                    MessageBody::BotReply(reply),
                );
                self.publish(message);
            }
            Err(e) => {
                warn!(
                    ".{} for {} failed: {}",
                    command.name(),
                    requested_by,
                    e
                );
                self.notify(connection_id, bot::failure_text(&command, &e));
            }
        }
    }

    fn system_notice(&self, text: String) -> Message {
        Message::new(
            self.inner.ids.next_id(),
            SYSTEM_AUTHOR,
            MessageBody::SystemNotice { text },
        )
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use agora_types::models::BotContent;

    use super::*;
    use crate::bot::testing::{FakeServices, media};
    use crate::services::ServiceError;

    fn room_with(services: Arc<FakeServices>) -> Room {
        Room::new(services, RoomConfig::default())
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Utf8Bytes>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            events.push(serde_json::from_str(frame.as_str()).unwrap());
        }
        events
    }

    fn chat(text: &str) -> ClientEvent {
        ClientEvent::ChatMessage {
            text: text.to_string(),
            timestamp: None,
            reply_to: None,
        }
    }

    fn texts(events: &[ServerEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|event| match event {
                ServerEvent::ChatMessage { message } => match &message.body {
                    MessageBody::Text { text } => Some(text.clone()),
                    _ => None,
                },
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn join_sends_ready_then_history_then_notice() {
        let room = room_with(Arc::default());
        let (alice, mut alice_rx) = room.join("alice").unwrap();
        room.handle_event(alice, "alice", chat("first")).await;

        let (_, mut bob_rx) = room.join("bob").unwrap();
        let events = drain(&mut bob_rx);

        assert!(matches!(&events[0], ServerEvent::Ready { username, .. } if username == "bob"));
        match &events[1] {
            ServerEvent::ChatHistory { messages } => {
                // alice's join notice and her message
                assert_eq!(messages.len(), 2);
                assert_eq!(messages[1].body, MessageBody::Text {
                    text: "first".into()
                });
            }
            other => panic!("expected history, got {other:?}"),
        }
        match &events[2] {
            ServerEvent::ChatMessage { message } => {
                assert_eq!(message.author, SYSTEM_AUTHOR);
                assert_eq!(message.body, MessageBody::SystemNotice {
                    text: "bob joined the chat".into()
                });
            }
            other => panic!("expected join notice, got {other:?}"),
        }
        assert_eq!(events.len(), 3);

        // alice hears about bob too
        let alice_events = drain(&mut alice_rx);
        assert!(alice_events.iter().any(|e| matches!(
            e,
            ServerEvent::ChatMessage { message } if message.body == MessageBody::SystemNotice {
                text: "bob joined the chat".into()
            }
        )));
    }

    #[tokio::test]
    async fn unauthenticated_join_is_refused() {
        let room = room_with(Arc::default());
        assert_eq!(room.join("").err(), Some(RegistryError::Unauthenticated));
        assert_eq!(room.registry().count(), 0);
        assert_eq!(room.history_len(), 0);
    }

    #[tokio::test]
    async fn chat_reaches_everyone_with_author() {
        let room = room_with(Arc::default());
        let (a, mut a_rx) = room.join("A").unwrap();
        let (_, mut b_rx) = room.join("B").unwrap();
        drain(&mut a_rx);
        drain(&mut b_rx);

        room.handle_event(a, "A", ClientEvent::ChatMessage {
            text: "hello".into(),
            timestamp: Some("10:00".into()),
            reply_to: Some(MessageId::from("missing")),
        })
        .await;

        for rx in [&mut a_rx, &mut b_rx] {
            let events = drain(rx);
            assert_eq!(events.len(), 1);
            match &events[0] {
                ServerEvent::ChatMessage { message } => {
                    assert_eq!(message.author, "A");
                    assert_eq!(message.body, MessageBody::Text {
                        text: "hello".into()
                    });
                    assert_eq!(message.client_timestamp.as_deref(), Some("10:00"));
                    assert_eq!(message.reply_to, Some(MessageId::from("missing")));
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn failed_image_generation_notifies_only_the_requester() {
        let services = Arc::new(FakeServices::default());
        services
            .image
            .lock()
            .unwrap()
            .push_back(Err(ServiceError::Unavailable("503".into())));
        let room = room_with(services.clone());

        let (_, mut a_rx) = room.join("A").unwrap();
        let (b, mut b_rx) = room.join("B").unwrap();
        drain(&mut a_rx);
        drain(&mut b_rx);
        let before = room.history_len();

        room.handle_event(b, "B", chat(".image sunset")).await;

        let b_events = drain(&mut b_rx);
        assert_eq!(b_events.len(), 1);
        assert!(matches!(
            &b_events[0],
            ServerEvent::SystemNotice { text } if text == "Unable to generate image at this time."
        ));
        assert!(drain(&mut a_rx).is_empty());
        assert_eq!(room.history_len(), before);
        assert_eq!(services.calls(), ["generate_image:sunset"]);
    }

    #[tokio::test]
    async fn empty_command_argument_makes_no_calls() {
        let services = Arc::new(FakeServices::default());
        let room = room_with(services.clone());
        let (a, mut a_rx) = room.join("A").unwrap();
        drain(&mut a_rx);
        let before = room.history_len();

        room.handle_event(a, "A", chat(".ai  ")).await;

        let events = drain(&mut a_rx);
        assert!(matches!(
            &events[..],
            [ServerEvent::SystemNotice { text }] if text == "Please provide a question after .ai"
        ));
        assert!(services.calls().is_empty());
        assert_eq!(room.history_len(), before);
    }

    #[tokio::test]
    async fn successful_play_is_broadcast_as_bot_reply() {
        let services = Arc::new(FakeServices::default());
        services.search.lock().unwrap().push_back(Ok(media("Lofi Beats")));
        services
            .download
            .lock()
            .unwrap()
            .push_back(Ok("https://cdn.example/lofi.mp3".into()));
        let room = room_with(services.clone());

        let (a, mut a_rx) = room.join("A").unwrap();
        let (_, mut b_rx) = room.join("B").unwrap();
        drain(&mut a_rx);
        drain(&mut b_rx);

        room.handle_event(a, "A", chat(".play lofi beats")).await;

        assert_eq!(services.calls(), ["search_media:lofi beats", "download_audio:vid1"]);
        let events = drain(&mut b_rx);
        match &events[..] {
            [ServerEvent::ChatMessage { message }] => {
                assert_eq!(message.author, "AgoraBot");
                match &message.body {
                    MessageBody::BotReply(reply) => {
                        assert_eq!(reply.command, "play");
                        assert_eq!(reply.requested_by, "A");
                        assert_eq!(reply.content, BotContent::Audio {
                            title: "Lofi Beats".into(),
                            url: "https://cdn.example/lofi.mp3".into(),
                        });
                    }
                    other => panic!("unexpected body {other:?}"),
                }
            }
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[tokio::test]
    async fn reactions_update_known_messages_only() {
        let room = room_with(Arc::default());
        let (a, mut a_rx) = room.join("A").unwrap();
        room.handle_event(a, "A", chat("react to me")).await;
        let target = room.snapshot().last().unwrap().id.clone();
        drain(&mut a_rx);

        room.handle_event(a, "A", ClientEvent::ReactToMessage {
            message_id: target.clone(),
            reaction: "🔥".into(),
        })
        .await;
        let events = drain(&mut a_rx);
        assert!(matches!(
            &events[..],
            [ServerEvent::Reaction { message_id, reactions }]
                if *message_id == target && reactions == &["🔥".to_string()]
        ));

        let before = room.snapshot();
        room.handle_event(a, "A", ClientEvent::ReactToMessage {
            message_id: MessageId::from("ghost"),
            reaction: "🔥".into(),
        })
        .await;
        assert!(drain(&mut a_rx).is_empty());
        assert_eq!(room.snapshot(), before);
    }

    #[tokio::test]
    async fn invalid_media_is_rejected_privately() {
        let room = room_with(Arc::default());
        let (a, mut a_rx) = room.join("A").unwrap();
        let (_, mut b_rx) = room.join("B").unwrap();
        drain(&mut a_rx);
        drain(&mut b_rx);
        let before = room.history_len();

        room.handle_event(a, "A", ClientEvent::Image {
            image: "data:image/png;base64,@@@@".into(),
            timestamp: None,
        })
        .await;
        assert!(matches!(&drain(&mut a_rx)[..], [ServerEvent::SystemNotice { .. }]));
        assert!(drain(&mut b_rx).is_empty());
        assert_eq!(room.history_len(), before);

        room.handle_event(a, "A", ClientEvent::VoiceNote {
            audio: "data:audio/webm;base64,AAECAw==".into(),
            timestamp: None,
        })
        .await;
        assert!(matches!(&drain(&mut b_rx)[..], [ServerEvent::VoiceNote { message }] if message.author == "A"));
    }

    #[tokio::test]
    async fn leave_is_idempotent() {
        let room = room_with(Arc::default());
        let (a, _a_rx) = room.join("A").unwrap();
        let (_, mut b_rx) = room.join("B").unwrap();
        drain(&mut b_rx);

        room.leave(a);
        let after_first = room.history_len();
        room.leave(a);

        assert_eq!(room.history_len(), after_first);
        assert_eq!(room.registry().count(), 1);
        let events = drain(&mut b_rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            ServerEvent::ChatMessage { message }
                if message.body == MessageBody::SystemNotice { text: "A left the chat".into() }
        ));
    }

    #[tokio::test]
    async fn disconnect_event_closes() {
        let room = room_with(Arc::default());
        let (a, _rx) = room.join("A").unwrap();
        assert_eq!(room.handle_event(a, "A", ClientEvent::Disconnect).await, Flow::Close);
        assert_eq!(room.handle_event(a, "A", chat("still here")).await, Flow::Continue);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_senders_observe_one_order() {
        let room = room_with(Arc::default());
        let mut receivers = Vec::new();
        let mut senders = Vec::new();
        for i in 0..4 {
            let name = format!("user{i}");
            let (id, mut rx) = room.join(&name).unwrap();
            drain(&mut rx);
            receivers.push(rx);
            senders.push((id, name));
        }
        // join notices of later users landed in earlier queues; start clean
        for rx in receivers.iter_mut() {
            drain(rx);
        }

        let mut tasks = Vec::new();
        for (id, name) in senders {
            let room = room.clone();
            tasks.push(tokio::spawn(async move {
                for n in 0..50 {
                    room.handle_event(id, &name, chat(&format!("{name}-{n}"))).await;
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(10)).await;

        let observed: Vec<Vec<String>> = receivers.iter_mut().map(|rx| texts(&drain(rx))).collect();
        assert_eq!(observed[0].len(), 200);
        for other in &observed[1..] {
            assert_eq!(other, &observed[0]);
        }

        // each sender's own messages stay in send order
        for i in 0..4 {
            let own: Vec<&String> = observed[0]
                .iter()
                .filter(|t| t.starts_with(&format!("user{i}-")))
                .collect();
            let expected: Vec<String> = (0..50).map(|n| format!("user{i}-{n}")).collect();
            assert_eq!(own.len(), 50);
            assert!(own.iter().zip(&expected).all(|(a, b)| *a == b));
        }

        // the history matches the broadcast order
        let history: Vec<String> = room
            .snapshot()
            .into_iter()
            .filter_map(|m| match m.body {
                MessageBody::Text { text } => Some(text),
                _ => None,
            })
            .collect();
        assert_eq!(history, observed[0]);
    }

    #[tokio::test]
    async fn reply_outlives_a_requester_who_left() {
        let gate = Arc::new(tokio::sync::Notify::new());
        let services = Arc::new(FakeServices {
            gate: Some(gate.clone()),
            ..FakeServices::default()
        });
        services.chat.lock().unwrap().push_back(Ok("42".into()));
        let room = room_with(services.clone());

        let (a, mut a_rx) = room.join("A").unwrap();
        let (_, mut b_rx) = room.join("B").unwrap();
        drain(&mut a_rx);
        drain(&mut b_rx);

        // The connection worker is torn down while the call is pending
        let worker = {
            let room = room.clone();
            tokio::spawn(async move { room.handle_event(a, "A", chat(".ai meaning of life")).await })
        };
        while services.calls().is_empty() {
            tokio::task::yield_now().await;
        }
        worker.abort();
        room.leave(a);
        let after_leave = room.history_len();
        drain(&mut b_rx);

        gate.notify_one();
        tokio::time::timeout(Duration::from_secs(1), async {
            while room.history_len() == after_leave {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("bot reply never posted");

        assert_eq!(room.history_len(), after_leave + 1);
        match &drain(&mut b_rx)[..] {
            [ServerEvent::ChatMessage { message }] => match &message.body {
                MessageBody::BotReply(reply) => {
                    assert_eq!(reply.requested_by, "A");
                    assert_eq!(reply.content, BotContent::Answer { text: "42".into() });
                }
                other => panic!("unexpected body {other:?}"),
            },
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn joins_racing_appends_replay_without_gaps_or_duplicates() {
        let room = room_with(Arc::default());
        let (writer, _writer_rx) = room.join("writer").unwrap();

        let appender = {
            let room = room.clone();
            tokio::spawn(async move {
                for n in 0..300 {
                    room.handle_event(writer, "writer", chat(&format!("m{n}"))).await;
                    if n % 8 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            })
        };
        let joiners: Vec<_> = (0..8)
            .map(|i| {
                let room = room.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_micros(50 * i)).await;
                    room.join(&format!("late{i}")).unwrap().1
                })
            })
            .collect();

        let mut receivers = Vec::new();
        for joiner in joiners {
            receivers.push(joiner.await.unwrap());
        }
        appender.await.unwrap();

        // snapshot + live stream must reproduce the full history exactly
        let full: Vec<MessageId> = room.snapshot().into_iter().map(|m| m.id).collect();
        for rx in receivers.iter_mut() {
            let events = drain(rx);
            let mut seen: Vec<MessageId> = match &events[1] {
                ServerEvent::ChatHistory { messages } => {
                    messages.iter().map(|m| m.id.clone()).collect()
                }
                other => panic!("expected history, got {other:?}"),
            };
            for event in &events[2..] {
                if let ServerEvent::ChatMessage { message } = event {
                    seen.push(message.id.clone());
                }
            }
            assert_eq!(seen, full);
        }
    }
}
