use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Message, MessageBody, MessageId};

/// Events sent FROM client TO server over the WebSocket gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientEvent {
    /// Authenticate the connection when the upgrade request carried no session
    Connect { session_token: String },

    /// Post a text message (or a bot command)
    ChatMessage {
        text: String,
        #[serde(default)]
        timestamp: Option<String>,
        #[serde(default)]
        reply_to: Option<MessageId>,
    },

    /// Attach a reaction to an existing message
    ReactToMessage {
        message_id: MessageId,
        reaction: String,
    },

    /// Post a recorded voice note
    VoiceNote {
        audio: String,
        #[serde(default)]
        timestamp: Option<String>,
    },

    /// Post an image
    Image {
        image: String,
        #[serde(default)]
        timestamp: Option<String>,
    },

    /// Leave the room
    Disconnect,
}

/// Events sent FROM server TO clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerEvent {
    /// Handshake accepted
    Ready { connection_id: Uuid, username: String },

    /// Full room history, sent once right after Ready
    ChatHistory { messages: Vec<Message> },

    /// A text message, bot reply or room notice was added to the history
    ChatMessage { message: Message },

    /// Reactions on a message changed; carries the full list
    Reaction {
        message_id: MessageId,
        reactions: Vec<String>,
    },

    /// A voice note was added to the history
    VoiceNote { message: Message },

    /// An image was added to the history
    Image { message: Message },

    /// Transient notice (validation and service errors)
    SystemNotice { text: String },
}

impl ServerEvent {
    /// The event announcing a freshly appended history entry.
    pub fn for_message(message: Message) -> Self {
        match message.body {
            MessageBody::VoiceNote { .. } => Self::VoiceNote { message },
            MessageBody::Image { .. } => Self::Image { message },
            _ => Self::ChatMessage { message },
        }
    }

    pub fn notice(text: impl Into<String>) -> Self {
        Self::SystemNotice { text: text.into() }
    }
}
