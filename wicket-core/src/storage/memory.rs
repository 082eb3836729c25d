//! In-memory backends
//!
//! Both stores live entirely in process memory and lose everything on
//! restart. They are the default for tests and single-process deployments.
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::{DashMap, mapref::entry::Entry};

use super::{ConsumeOutcome, StoredToken, TokenStore, UserDirectory};
use crate::{
    Error, IdentityClaim, LinkedIdentity, ProviderKind, User, UserId, error::StorageError,
    validation,
};

#[derive(Debug, Clone)]
struct StoreEntry {
    record: StoredToken,
    evict_at: DateTime<Utc>,
}

/// [`TokenStore`] backed by a sharded concurrent map.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: DashMap<String, StoreEntry>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn put(&self, key: &str, record: StoredToken, ttl: Duration) -> Result<(), Error> {
        let entry = StoreEntry {
            record,
            evict_at: validation::deadline(Utc::now(), ttl)?,
        };
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<StoredToken>, Error> {
        Ok(self.entries.get(key).map(|entry| entry.record.clone()))
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        self.entries.remove(key);
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<StoredToken>, Error> {
        Ok(self.entries.remove(key).map(|(_, entry)| entry.record))
    }

    async fn consume(&self, key: &str) -> Result<ConsumeOutcome, Error> {
        // The shard write lock is held until the flag is flipped.
        let Some(mut entry) = self.entries.get_mut(key) else {
            return Ok(ConsumeOutcome::Missing);
        };

        match &mut entry.record {
            StoredToken::LoginTicket(ticket) if ticket.consumed => {
                Ok(ConsumeOutcome::AlreadyConsumed)
            }
            StoredToken::LoginTicket(ticket) => {
                ticket.consumed = true;
                Ok(ConsumeOutcome::Consumed(ticket.clone()))
            }
            _ => Ok(ConsumeOutcome::Missing),
        }
    }

    async fn purge_expired(&self) -> Result<u64, Error> {
        let now = Utc::now();
        let mut removed = 0u64;
        self.entries.retain(|_, entry| {
            let keep = entry.evict_at > now;
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }
}

/// [`UserDirectory`] backed by concurrent maps.
///
/// The identity map is the source of truth for ownership; its entry lock
/// serialises `resolve_or_create` per `(provider, subject)` pair.
#[derive(Debug, Default)]
pub struct MemoryUserDirectory {
    users: DashMap<UserId, User>,
    identities: DashMap<LinkedIdentity, UserId>,
    emails: DashMap<String, UserId>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Remove a user and every identity pointing at it.
    ///
    /// wicket never calls this; it exists for host applications that manage
    /// accounts themselves.
    pub fn remove_user(&self, id: &UserId) -> Option<User> {
        let (_, user) = self.users.remove(id)?;
        for identity in &user.linked_identities {
            self.identities.remove(identity);
        }
        self.emails.remove_if(&user.primary_email, |_, owner| owner == id);
        Some(user)
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn get(&self, id: &UserId) -> Result<Option<User>, Error> {
        Ok(self.users.get(id).map(|user| user.value().clone()))
    }

    async fn find_by_identity(
        &self,
        provider: ProviderKind,
        subject_id: &str,
    ) -> Result<Option<User>, Error> {
        let owner = self
            .identities
            .get(&LinkedIdentity::new(provider, subject_id))
            .map(|id| id.value().clone());

        Ok(owner.and_then(|id| self.users.get(&id).map(|user| user.value().clone())))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let owner = self.emails.get(email).map(|id| id.value().clone());
        Ok(owner.and_then(|id| self.users.get(&id).map(|user| user.value().clone())))
    }

    async fn resolve_or_create(
        &self,
        claim: &IdentityClaim,
        link_by_email: bool,
    ) -> Result<User, Error> {
        let identity = LinkedIdentity::from(claim);

        match self.identities.entry(identity.clone()) {
            Entry::Occupied(entry) => {
                let user_id = entry.get().clone();
                drop(entry);
                self.users
                    .get(&user_id)
                    .map(|user| user.value().clone())
                    .ok_or(Error::Storage(StorageError::NotFound))
            }
            Entry::Vacant(entry) => {
                let email_owner = if link_by_email {
                    self.emails.get(claim.email()).map(|id| id.value().clone())
                } else {
                    None
                };

                let user = match email_owner.and_then(|id| self.users.get_mut(&id)) {
                    Some(mut existing) => {
                        existing.linked_identities.insert(identity);
                        existing.clone()
                    }
                    None => {
                        let user = User::from_claim(claim);
                        self.emails
                            .entry(user.primary_email.clone())
                            .or_insert_with(|| user.id.clone());
                        self.users.insert(user.id.clone(), user.clone());
                        user
                    }
                };

                entry.insert(user.id.clone());
                Ok(user)
            }
        }
    }
}
