#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use agora_api::auth::AppState;
use agora_db::Database;
use agora_gateway::room::{Room, RoomConfig};
use agora_gateway::services::{ExternalServices, HttpServices, ServicesConfig};
use agora_gateway::session::SessionStore;
use agora_server::app;

pub const CHATROOM_PAGE: &str = "<html><body>agora chatroom</body></html>";

/// App state over an in-memory credential store and a scratch static dir.
/// External services are unconfigured, so bot commands fail fast.
pub fn test_state() -> AppState {
    let services = ServicesConfig {
        timeout: Duration::from_secs(2),
        ..ServicesConfig::default()
    };
    test_state_with(
        Arc::new(HttpServices::new(services).unwrap()),
        RoomConfig::default(),
    )
}

pub fn test_state_with(services: Arc<dyn ExternalServices>, config: RoomConfig) -> AppState {
    let static_dir = scratch_dir();
    std::fs::write(static_dir.join("chatroom.html"), CHATROOM_PAGE).unwrap();

    let db = Database::open_in_memory().unwrap();
    let room = Room::new(services, config);
    let sessions = SessionStore::new("test-secret", Duration::from_secs(3600));
    app::state(db, sessions, room, static_dir)
}

/// Serve the full router on an ephemeral port.
pub async fn spawn_server(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app::router(state);
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("agora-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
