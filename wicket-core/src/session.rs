//! Sessions
//!
//! A [`Session`] is handed to the caller once, at sign-in. Its [`SessionToken`]
//! is an opaque bearer secret with 256 bits of entropy; the calling
//! application carries it (usually as a cookie) and presents it on every
//! request. The token store only ever sees a [`SessionRecord`] keyed by the
//! token's hash, so a leaked store does not leak live sessions.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{crypto, user::UserId};

/// Store namespace for session records.
pub const SESSION_NAMESPACE: &str = "sess";

/// Opaque session token value.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a token value received from a caller.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn new_random() -> Self {
        Self(crypto::generate_secure_token())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// The key this token's record is stored under.
    pub fn storage_key(&self) -> String {
        crypto::storage_key(SESSION_NAMESPACE, &self.0)
    }
}

impl From<String> for SessionToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// Debug must not print the bearer secret.
impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SessionToken").field(&"<redacted>").finish()
    }
}

/// What the token store keeps for a live session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: UserId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// A freshly issued session, as returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: SessionToken,
    pub user_id: UserId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn record(&self) -> SessionRecord {
        SessionRecord {
            user_id: self.user_id.clone(),
            issued_at: self.issued_at,
            expires_at: self.expires_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.record().is_expired()
    }
}
