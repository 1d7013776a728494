use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use axum::extract::ws::Utf8Bytes;
use tokio::sync::mpsc;
use tracing::{trace, warn};
use uuid::Uuid;

use agora_types::events::ServerEvent;

pub type ConnectionId = Uuid;

/// Per-connection outbound queue. Frames are serialized once and shared.
pub type Outbox = mpsc::UnboundedSender<Utf8Bytes>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("connection has no authenticated identity")]
    Unauthenticated,
}

struct ConnectionEntry {
    username: String,
    outbox: Outbox,
}

/// Live connections and the identity bound to each.
///
/// Delivery never blocks: every connection owns an unbounded queue drained by
/// its own socket task, so a stalled socket only backs up its own queue.
/// The lock is never held across an await.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<RwLock<HashMap<ConnectionId, ConnectionEntry>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection. An empty username means the handshake produced no
    /// identity; the caller must drop the link instead.
    pub fn register(
        &self,
        id: ConnectionId,
        username: &str,
        outbox: Outbox,
    ) -> Result<(), RegistryError> {
        if username.trim().is_empty() {
            return Err(RegistryError::Unauthenticated);
        }

        self.connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                id,
                ConnectionEntry {
                    username: username.to_string(),
                    outbox,
                },
            );
        Ok(())
    }

    /// Remove a connection. Returns the bound username if it was present;
    /// removing an absent id is a no-op.
    pub fn deregister(&self, id: ConnectionId) -> Option<String> {
        self.connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .map(|entry| entry.username)
    }

    /// Deliver an event to every registered connection. Returns how many
    /// queues accepted it; closed queues are skipped.
    pub fn broadcast_all(&self, event: &ServerEvent) -> usize {
        let Some(frame) = encode(event) else {
            return 0;
        };

        let connections = self
            .connections
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut delivered = 0;
        for (id, entry) in connections.iter() {
            if entry.outbox.send(frame.clone()).is_ok() {
                delivered += 1;
            } else {
                trace!("Skipping closed connection {} ({})", id, entry.username);
            }
        }
        delivered
    }

    /// Send an event to a single connection.
    pub fn send_to(&self, id: ConnectionId, event: &ServerEvent) -> bool {
        let connections = self
            .connections
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(entry) = connections.get(&id) else {
            return false;
        };
        match encode(event) {
            Some(frame) => entry.outbox.send(frame).is_ok(),
            None => false,
        }
    }

    pub fn count(&self) -> usize {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Serialize an event into a text frame.
pub fn encode(event: &ServerEvent) -> Option<Utf8Bytes> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Utf8Bytes::from(json)),
        Err(e) => {
            warn!("Failed to serialize outbound event: {}", e);
            None
        }
    }
}
