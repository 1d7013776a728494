use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;
use uuid::Uuid;

use agora_types::api::Claims;

/// Authenticated identity bound to a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to sign session token: {0}")]
    Sign(#[from] jsonwebtoken::errors::Error),
}

/// Maps opaque session tokens to identities.
///
/// Tokens are signed JWTs, so resolving one needs no server-side table. The
/// only state kept is the set of token ids revoked by logout.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    revoked: RwLock<HashSet<Uuid>>,
}

impl SessionStore {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
                ttl,
                revoked: RwLock::new(HashSet::new()),
            }),
        }
    }

    /// Issue a fresh token for `username`.
    pub fn issue(&self, username: &str) -> Result<String, SessionError> {
        let exp = chrono::Utc::now().timestamp() as u64 + self.inner.ttl.as_secs();
        let claims = Claims {
            sub: username.to_string(),
            jti: Uuid::new_v4(),
            exp: exp as usize,
        };
        Ok(encode(&Header::default(), &claims, &self.inner.encoding)?)
    }

    /// Resolve a token to its identity. Expired, forged, revoked or
    /// identity-less tokens resolve to `None`.
    pub fn resolve(&self, token: &str) -> Option<Identity> {
        let claims = self.decode(token)?;
        if claims.sub.trim().is_empty() {
            return None;
        }

        let revoked = self
            .inner
            .revoked
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if revoked.contains(&claims.jti) {
            debug!("Rejected revoked session for {}", claims.sub);
            return None;
        }

        Some(Identity {
            username: claims.sub,
        })
    }

    /// Revoke a token for the rest of the process lifetime. Unknown or
    /// invalid tokens are ignored.
    pub fn revoke(&self, token: &str) {
        if let Some(claims) = self.decode(token) {
            self.inner
                .revoked
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(claims.jti);
        }
    }

    fn decode(&self, token: &str) -> Option<Claims> {
        decode::<Claims>(token, &self.inner.decoding, &Validation::default())
            .ok()
            .map(|data| data.claims)
    }
}
