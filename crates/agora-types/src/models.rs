use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Author of join/leave notices.
pub const SYSTEM_AUTHOR: &str = "System";

/// Identifier of a chat message.
///
/// Ids minted by the server look like `<instance>-<sequence>`. Ids arriving
/// from clients (reply and reaction targets) are kept verbatim and may point
/// at nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Mints message ids that cannot collide within a process: a random
/// instance tag combined with a monotonic counter.
#[derive(Debug)]
pub struct MessageIdGenerator {
    instance: u32,
    next: AtomicU64,
}

impl MessageIdGenerator {
    pub fn new() -> Self {
        Self {
            instance: (Uuid::new_v4().as_u128() & 0xffff_ffff) as u32,
            next: AtomicU64::new(1),
        }
    }

    pub fn next_id(&self) -> MessageId {
        let seq = self.next.fetch_add(1, Ordering::Relaxed);
        MessageId(format!("{:08x}-{:x}", self.instance, seq))
    }
}

impl Default for MessageIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    VoiceNote,
    Image,
    BotReply,
    SystemNotice,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::VoiceNote => "voice_note",
            Self::Image => "image",
            Self::BotReply => "bot_reply",
            Self::SystemNotice => "system_notice",
        };
        f.write_str(name)
    }
}

/// Content of a message; the shape depends on its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum MessageBody {
    Text { text: String },
    /// Base64 audio, usually a `data:` URL.
    VoiceNote { audio: String },
    /// Base64 image, usually a `data:` URL.
    Image { image: String },
    BotReply(BotReply),
    SystemNotice { text: String },
}

/// Result of a bot command, attributed to the user who asked for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotReply {
    pub command: String,
    pub argument: String,
    pub requested_by: String,
    pub content: BotContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BotContent {
    Answer { text: String },
    Audio { title: String, url: String },
    Video { title: String, url: String },
    Image { url: String },
    Lyrics {
        title: String,
        author: Option<String>,
        text: String,
    },
}

/// A chat history entry.
///
/// Everything but `reactions` is fixed once the message is in the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub author: String,
    pub body: MessageBody,
    pub timestamp: DateTime<Utc>,
    /// Display timestamp as sent by the client, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<MessageId>,
    #[serde(default)]
    pub reactions: Vec<String>,
}

impl Message {
    pub fn new(id: MessageId, author: impl Into<String>, body: MessageBody) -> Self {
        Self {
            id,
            author: author.into(),
            body,
            timestamp: Utc::now(),
            client_timestamp: None,
            reply_to: None,
            reactions: Vec::new(),
        }
    }

    pub fn with_client_timestamp(mut self, timestamp: Option<String>) -> Self {
        self.client_timestamp = timestamp;
        self
    }

    pub fn with_reply_to(mut self, reply_to: Option<MessageId>) -> Self {
        self.reply_to = reply_to;
        self
    }

    pub fn kind(&self) -> MessageKind {
        match self.body {
            MessageBody::Text { .. } => MessageKind::Text,
            MessageBody::VoiceNote { .. } => MessageKind::VoiceNote,
            MessageBody::Image { .. } => MessageKind::Image,
            MessageBody::BotReply(_) => MessageKind::BotReply,
            MessageBody::SystemNotice { .. } => MessageKind::SystemNotice,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn generated_ids_are_unique_and_share_instance() {
        let ids = MessageIdGenerator::new();
        let minted: Vec<MessageId> = (0..1000).map(|_| ids.next_id()).collect();
        let unique: HashSet<&MessageId> = minted.iter().collect();
        assert_eq!(unique.len(), minted.len());

        let instance = minted[0].as_str().split('-').next().unwrap();
        assert!(minted.iter().all(|id| id.as_str().starts_with(instance)));
    }

    #[test]
    fn message_serializes_kind_and_payload() {
        let msg = Message::new(MessageId::from("a-1"), "alice", MessageBody::Text {
            text: "hello".into(),
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["body"]["kind"], "text");
        assert_eq!(json["body"]["payload"]["text"], "hello");
        assert!(json.get("reply_to").is_none());
        assert_eq!(json["reactions"], serde_json::json!([]));
    }
}
