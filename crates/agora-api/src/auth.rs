use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::{error, info};

use agora_db::Database;
use agora_db::models::CreateOutcome;
use agora_gateway::room::Room;
use agora_gateway::session::SessionStore;
use agora_types::api::{AuthResponse, LoginRequest, SignupRequest};
use agora_types::models::SYSTEM_AUTHOR;

use crate::credentials;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "agora_session";

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub sessions: SessionStore,
    pub room: Room,
    pub static_dir: PathBuf,
}

pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let (Some(username), Some(email), Some(password)) = (req.username, req.email, req.password)
    else {
        return Err(StatusCode::BAD_REQUEST);
    };
    let username = username.trim().to_string();
    let email = email.trim().to_string();

    if !valid_username(&username) || is_reserved(&state, &username) {
        return Err(StatusCode::BAD_REQUEST);
    }
    if !email.contains('@') || password.len() < 8 {
        return Err(StatusCode::BAD_REQUEST);
    }

    // Hashing and the insert both block; keep them off the async runtime
    let db_state = state.clone();
    let name = username.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        credentials::create(&db_state.db, &name, &email, &password)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .map_err(|e| {
        error!("Signup for {} failed: {}", username, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    if outcome == CreateOutcome::Conflict {
        return Err(StatusCode::CONFLICT);
    }

    info!("New account: {}", username);
    let jar = start_session(&state, jar, &username)?;
    Ok((jar, Json(AuthResponse { username })))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let (Some(username), Some(password)) = (req.username, req.password) else {
        return Err(StatusCode::BAD_REQUEST);
    };
    let username = username.trim().to_string();
    if username.is_empty() || password.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let db_state = state.clone();
    let name = username.clone();
    let verified = tokio::task::spawn_blocking(move || {
        credentials::verify(&db_state.db, &name, &password)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .map_err(|e| {
        error!("Login for {} failed: {}", username, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let username = verified.ok_or(StatusCode::UNAUTHORIZED)?;
    let jar = start_session(&state, jar, &username)?;
    Ok((jar, Json(AuthResponse { username })))
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.revoke(cookie.value());
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to("/login.html"))
}

fn start_session(state: &AppState, jar: CookieJar, username: &str) -> Result<CookieJar, StatusCode> {
    let token = state.sessions.issue(username).map_err(|e| {
        error!("Failed to issue session for {}: {}", username, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    Ok(jar.add(cookie))
}

fn valid_username(username: &str) -> bool {
    (3..=32).contains(&username.len())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Names used for synthetic authors cannot be registered.
fn is_reserved(state: &AppState, username: &str) -> bool {
    username.eq_ignore_ascii_case(SYSTEM_AUTHOR)
        || username.eq_ignore_ascii_case(state.room.bot_name())
}
