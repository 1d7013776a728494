use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, error};

use agora_gateway::session::Identity;
use agora_types::api::HealthResponse;

use crate::auth::AppState;
use crate::middleware::session_identity;

/// GET /: chatroom for signed-in users, signup for everyone else.
pub async fn index(State(state): State<AppState>, jar: CookieJar) -> Redirect {
    match session_identity(&state, &jar) {
        Some(_) => Redirect::to("/chatroom"),
        None => Redirect::to("/signup.html"),
    }
}

/// GET /chatroom, served behind `require_session`.
pub async fn chatroom(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse, StatusCode> {
    debug!("Serving chatroom to {}", identity.username);
    let path = state.static_dir.join("chatroom.html");
    let page = tokio::fs::read_to_string(&path).await.map_err(|e| {
        error!("Failed to read {}: {}", path.display(), e);
        StatusCode::NOT_FOUND
    })?;
    Ok(Html(page))
}

/// The raw page lives in the static dir; route it through the session gate.
pub async fn chatroom_file() -> Redirect {
    Redirect::to("/chatroom")
}

pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, StatusCode> {
    let db_state = state.clone();
    let users = tokio::task::spawn_blocking(move || db_state.db.user_count())
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            error!("Failed to count users: {}", e);
            StatusCode::SERVICE_UNAVAILABLE
        })?;

    Ok(Json(HealthResponse {
        status: "ok".into(),
        users,
        connections: state.room.registry().count(),
        history: state.room.history_len(),
    }))
}
