//! Persistence contracts
//!
//! wicket owns two pieces of shared mutable state, and both are passed to the
//! components that need them rather than reached for globally:
//!
//! - a [`TokenStore`], a key-value store of short-lived secrets (sessions,
//!   login tickets and pending OAuth authorizations), keyed by the hash of
//!   the secret
//! - a [`UserDirectory`] mapping `(provider, subject)` pairs to users
//!
//! Implementations must make every operation atomic per key. Nothing needs a
//! transaction across keys.
mod memory;

pub use memory::{MemoryTokenStore, MemoryUserDirectory};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Error, IdentityClaim, ProviderKind, User, UserId, crypto, session::SessionRecord,
    ticket::EmailLoginTicket,
};

/// Store namespace for pending OAuth authorizations.
pub const OAUTH_STATE_NAMESPACE: &str = "oauth";

/// Server-side half of an OAuth redirect, stored under the hash of `state`
/// between `start_redirect` and the provider callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAuthorization {
    pub provider: ProviderKind,
    pub pkce_verifier: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PendingAuthorization {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    pub fn storage_key(state: &str) -> String {
        crypto::storage_key(OAUTH_STATE_NAMESPACE, state)
    }
}

/// A record held by a [`TokenStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoredToken {
    Session(SessionRecord),
    LoginTicket(EmailLoginTicket),
    PendingAuthorization(PendingAuthorization),
}

impl StoredToken {
    pub fn expires_at(&self) -> DateTime<Utc> {
        match self {
            StoredToken::Session(record) => record.expires_at,
            StoredToken::LoginTicket(ticket) => ticket.expires_at,
            StoredToken::PendingAuthorization(pending) => pending.expires_at,
        }
    }

    /// Whether this record is a consumed login ticket.
    pub fn is_consumed(&self) -> bool {
        matches!(self, StoredToken::LoginTicket(ticket) if ticket.consumed)
    }
}

/// Result of [`TokenStore::consume`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// This call flipped the ticket to consumed.
    Consumed(EmailLoginTicket),
    /// Somebody else consumed it first.
    AlreadyConsumed,
    /// No login ticket under this key.
    Missing,
}

/// Key-value store for opaque secrets.
///
/// Expired records stay readable until [`TokenStore::purge_expired`] evicts
/// them, so callers can tell an expired secret from an unknown one by
/// checking `expires_at` themselves.
#[async_trait]
pub trait TokenStore: Send + Sync + 'static {
    /// Insert or replace `record`. It becomes eligible for eviction once `ttl`
    /// has elapsed.
    async fn put(&self, key: &str, record: StoredToken, ttl: Duration) -> Result<(), Error>;

    async fn get(&self, key: &str) -> Result<Option<StoredToken>, Error>;

    /// Remove a record. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), Error>;

    /// Atomically remove and return a record.
    async fn take(&self, key: &str) -> Result<Option<StoredToken>, Error>;

    /// Atomically mark the login ticket under `key` as consumed.
    ///
    /// For any key at most one call ever returns [`ConsumeOutcome::Consumed`].
    /// Keys holding something other than a login ticket report `Missing`.
    async fn consume(&self, key: &str) -> Result<ConsumeOutcome, Error>;

    /// Evict every record whose ttl has elapsed. Returns how many were removed.
    async fn purge_expired(&self) -> Result<u64, Error>;
}

/// Directory of users and the identities linked to them.
#[async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    async fn get(&self, id: &UserId) -> Result<Option<User>, Error>;

    async fn find_by_identity(
        &self,
        provider: ProviderKind,
        subject_id: &str,
    ) -> Result<Option<User>, Error>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error>;

    /// Return the user owning the claim's `(provider, subject)` pair, creating
    /// one if the pair is unseen.
    ///
    /// With `link_by_email`, an unseen pair is linked to an existing user whose
    /// primary email equals the claim's email instead of creating a new user.
    /// Atomic per pair: concurrent calls for the same pair resolve to the same
    /// user.
    async fn resolve_or_create(
        &self,
        claim: &IdentityClaim,
        link_by_email: bool,
    ) -> Result<User, Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_token_serializes_with_kind_tag() {
        let ticket = EmailLoginTicket::new("a@x.com", Duration::hours(1)).unwrap();
        let json = serde_json::to_value(StoredToken::LoginTicket(ticket.clone())).unwrap();
        assert_eq!(json["kind"], "login_ticket");
        assert_eq!(json["email"], "a@x.com");

        let back: StoredToken = serde_json::from_value(json).unwrap();
        assert_eq!(back, StoredToken::LoginTicket(ticket));
    }

    #[test]
    fn test_is_consumed_only_for_tickets() {
        let mut ticket = EmailLoginTicket::new("a@x.com", Duration::hours(1)).unwrap();
        assert!(!StoredToken::LoginTicket(ticket.clone()).is_consumed());
        ticket.consumed = true;
        assert!(StoredToken::LoginTicket(ticket).is_consumed());

        let now = Utc::now();
        let pending = StoredToken::PendingAuthorization(PendingAuthorization {
            provider: ProviderKind::Google,
            pkce_verifier: None,
            created_at: now,
            expires_at: now + Duration::minutes(10),
        });
        assert!(!pending.is_consumed());
        assert_eq!(pending.expires_at(), now + Duration::minutes(10));
    }
}
