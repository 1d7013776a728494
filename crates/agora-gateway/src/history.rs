use std::collections::HashMap;

use agora_types::models::{Message, MessageId};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("message {0} not found")]
    NotFound(MessageId),
}

/// Append-only, insertion-ordered record of every message in the room.
///
/// Kept for the process lifetime and never pruned. The log itself is not
/// synchronized; the room guards it with the same lock that orders
/// broadcasts, so snapshots are always consistent with what was delivered.
#[derive(Debug, Default)]
pub struct HistoryLog {
    messages: Vec<Message>,
    index: HashMap<MessageId, usize>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) {
        self.index.insert(message.id.clone(), self.messages.len());
        self.messages.push(message);
    }

    /// Every message so far, in arrival order.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    /// Append `symbol` to a message's reactions and return the updated list.
    pub fn attach_reaction(
        &mut self,
        id: &MessageId,
        symbol: &str,
    ) -> Result<&[String], HistoryError> {
        let position = *self
            .index
            .get(id)
            .ok_or_else(|| HistoryError::NotFound(id.clone()))?;
        let message = &mut self.messages[position];
        message.reactions.push(symbol.to_string());
        Ok(&message.reactions)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
