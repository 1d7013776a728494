use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State, WebSocketUpgrade},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use agora_api::auth::{self, AppState, AppStateInner, SESSION_COOKIE};
use agora_api::middleware::require_session;
use agora_api::pages;
use agora_db::Database;
use agora_gateway::connection;
use agora_gateway::room::Room;
use agora_gateway::session::SessionStore;

pub fn state(db: Database, sessions: SessionStore, room: Room, static_dir: PathBuf) -> AppState {
    Arc::new(AppStateInner {
        db,
        sessions,
        room,
        static_dir,
    })
}

pub fn router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.static_dir);

    let public_routes = Router::new()
        .route("/", get(pages::index))
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/health", get(pages::health))
        .route("/gateway", get(ws_upgrade));

    let protected_routes = Router::new()
        .route("/chatroom", get(pages::chatroom))
        .route("/chatroom.html", get(pages::chatroom_file))
        .layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback_service(static_files)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[derive(Debug, Deserialize)]
struct GatewayQuery {
    token: Option<String>,
}

/// Sessions from the cookie or `?token=` are checked at upgrade time;
/// otherwise the socket must send `Connect` first.
async fn ws_upgrade(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<GatewayQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let identity = query
        .token
        .as_deref()
        .or_else(|| jar.get(SESSION_COOKIE).map(|c| c.value()))
        .and_then(|token| state.sessions.resolve(token));

    let room = state.room.clone();
    match identity {
        Some(identity) => ws.on_upgrade(move |socket| {
            connection::handle_connection_authenticated(socket, room, identity)
        }),
        None => {
            let sessions = state.sessions.clone();
            ws.on_upgrade(move |socket| connection::handle_connection(socket, room, sessions))
        }
    }
}
