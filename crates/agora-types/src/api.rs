use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- Session Claims --

/// Claims inside a session token. Shared by the HTTP layer and the
/// gateway handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username
    pub sub: String,
    /// Token id, used for revocation on logout
    pub jti: Uuid,
    pub exp: usize,
}

// -- Auth --

// Fields are optional so that missing input maps to 400 instead of the
// extractor's 422.
#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub username: String,
}

// -- Health --

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Registered accounts
    pub users: usize,
    pub connections: usize,
    pub history: usize,
}
