use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use crate::{
    AuthError, Error, IdentityClaim, Session, SessionRecord, SessionToken, StoredToken, TokenStore,
    User, UserDirectory, validation,
};

/// Settings for [`SessionManager`].
#[derive(Debug, Clone)]
pub struct SessionManagerConfig {
    /// How long an issued session stays valid. Sessions never slide.
    pub session_lifetime: Duration,
    /// Link an unseen identity to the existing user with the same verified
    /// email instead of creating a second user.
    pub link_by_verified_email: bool,
}

impl Default for SessionManagerConfig {
    fn default() -> Self {
        Self {
            session_lifetime: Duration::days(30),
            link_by_verified_email: false,
        }
    }
}

/// Issues, validates and revokes opaque server-side sessions.
pub struct SessionManager<S: TokenStore, D: UserDirectory> {
    store: Arc<S>,
    directory: Arc<D>,
    config: SessionManagerConfig,
}

impl<S: TokenStore, D: UserDirectory> SessionManager<S, D> {
    pub fn new(store: Arc<S>, directory: Arc<D>, config: SessionManagerConfig) -> Self {
        Self {
            store,
            directory,
            config,
        }
    }

    pub fn config(&self) -> &SessionManagerConfig {
        &self.config
    }

    /// Create a session for the user owning `claim`, creating the user on the
    /// first sign-in for the claim's identity.
    pub async fn issue(&self, claim: &IdentityClaim) -> Result<Session, Error> {
        let now = Utc::now();
        let expires_at = validation::deadline(now, self.config.session_lifetime)?;

        let user = self
            .directory
            .resolve_or_create(claim, self.config.link_by_verified_email)
            .await?;

        let session = Session {
            token: SessionToken::new_random(),
            user_id: user.id.clone(),
            issued_at: now,
            expires_at,
        };

        self.store
            .put(
                &session.token.storage_key(),
                StoredToken::Session(session.record()),
                self.config.session_lifetime,
            )
            .await?;

        info!(
            user_id = %user.id,
            provider = %claim.provider(),
            expires_at = %session.expires_at,
            "Issued session"
        );

        Ok(session)
    }

    /// Resolve a presented token to its user.
    ///
    /// Validation never extends the session. An expired record keeps
    /// answering [`AuthError::SessionExpired`] until
    /// [`SessionManager::purge_expired`] evicts it.
    pub async fn validate(&self, token: &SessionToken) -> Result<User, Error> {
        let key = token.storage_key();

        let record = match self.store.get(&key).await? {
            Some(StoredToken::Session(record)) => record,
            _ => return Err(AuthError::SessionNotFound.into()),
        };

        if record.is_expired() {
            debug!(user_id = %record.user_id, "Session expired");
            return Err(AuthError::SessionExpired.into());
        }

        self.user_for(&record).await
    }

    /// Delete a session. Revoking an unknown or already revoked token succeeds.
    pub async fn revoke(&self, token: &SessionToken) -> Result<(), Error> {
        self.store.delete(&token.storage_key()).await?;
        debug!("Revoked session");
        Ok(())
    }

    /// Evict everything in the token store whose lifetime has elapsed.
    pub async fn purge_expired(&self) -> Result<u64, Error> {
        let removed = self.store.purge_expired().await?;
        if removed > 0 {
            info!(removed, "Purged expired tokens");
        }
        Ok(removed)
    }

    async fn user_for(&self, record: &SessionRecord) -> Result<User, Error> {
        match self.directory.get(&record.user_id).await? {
            Some(user) => Ok(user),
            None => {
                warn!(user_id = %record.user_id, "Session refers to a missing user");
                Err(AuthError::SessionNotFound.into())
            }
        }
    }
}
