use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use agora_gateway::session::Identity;

use crate::auth::{AppState, SESSION_COOKIE};

/// Resolve the session cookie, if any.
pub fn session_identity(state: &AppState, jar: &CookieJar) -> Option<Identity> {
    let cookie = jar.get(SESSION_COOKIE)?;
    state.sessions.resolve(cookie.value())
}

/// Gate a route on a valid session. Anonymous requests are sent to the
/// login page; authenticated ones get the `Identity` as an extension.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    match session_identity(&state, &jar) {
        Some(identity) => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        None => Redirect::to("/login.html").into_response(),
    }
}
