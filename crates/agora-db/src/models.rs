/// Database row types. These map directly to SQLite rows.

pub struct UserRow {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: String,
}

/// Outcome of inserting a new account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// The username is already taken (compared case-insensitively).
    Conflict,
}
