use std::sync::Arc;

use tracing::info;

use agora_gateway::room::Room;
use agora_gateway::services::HttpServices;
use agora_gateway::session::SessionStore;
use agora_server::{app, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "agora=debug,agora_server=debug,agora_gateway=debug,agora_api=debug,tower_http=debug"
                    .into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    // Credential store; chat history lives only in memory
    let db = agora_db::Database::open(&config.db_path)?;

    let services = Arc::new(HttpServices::new(config.services.clone())?);
    let room = Room::new(services, config.room.clone());
    let sessions = SessionStore::new(&config.session_secret, config.session_ttl);

    let state = app::state(db, sessions, room, config.static_dir.clone());
    let router = app::router(state);

    info!("Agora listening on {}", config.addr);
    info!("Serving static files from {}", config.static_dir.display());

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
