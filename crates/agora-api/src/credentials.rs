//! Account creation and password verification over the credential store.
//! Both are blocking (SQLite + Argon2) and are meant for `spawn_blocking`.

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

use agora_db::Database;
use agora_db::models::CreateOutcome;

/// Hash `password` with Argon2id and store the account.
pub fn create(
    db: &Database,
    username: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<CreateOutcome> {
    if db.get_user_by_username(username)?.is_some() {
        return Ok(CreateOutcome::Conflict);
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();

    db.create_user(username, email, &password_hash)
}

/// Check a username/password pair. Returns the stored spelling of the
/// username on success.
pub fn verify(db: &Database, username: &str, password: &str) -> anyhow::Result<Option<String>> {
    let Some(user) = db.get_user_by_username(username)? else {
        return Ok(None);
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|e| anyhow::anyhow!("corrupt password hash for {}: {}", user.username, e))?;

    let valid = Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok();
    Ok(valid.then_some(user.username))
}
