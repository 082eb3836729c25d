use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info, warn};
use wicket_core::{
    Error, ProviderKind, Session, SessionManager, SessionToken, TokenStore, User, UserDirectory,
    ValidationError,
};

use crate::{
    AuthGatewayBuilder,
    provider::{CallbackData, Provider, SignInRequest, SignInStarted},
    state::{SignInEvent, SignInState},
};

/// The caller-facing surface of wicket.
///
/// Every operation takes the session token explicitly; the gateway keeps no
/// per-caller state of its own.
pub struct AuthGateway<S: TokenStore, D: UserDirectory> {
    sessions: SessionManager<S, D>,
    providers: HashMap<ProviderKind, Provider>,
}

impl<S: TokenStore, D: UserDirectory> AuthGateway<S, D> {
    pub fn builder(store: Arc<S>, directory: Arc<D>) -> AuthGatewayBuilder<S, D> {
        AuthGatewayBuilder::new(store, directory)
    }

    pub(crate) fn new(
        sessions: SessionManager<S, D>,
        providers: HashMap<ProviderKind, Provider>,
    ) -> Self {
        Self {
            sessions,
            providers,
        }
    }

    /// The configured providers, in a stable order.
    pub fn providers(&self) -> Vec<ProviderKind> {
        let mut kinds: Vec<_> = self.providers.keys().copied().collect();
        kinds.sort();
        kinds
    }

    pub fn provider(&self, kind: ProviderKind) -> Result<&Provider, Error> {
        self.providers.get(&kind).ok_or_else(|| {
            ValidationError::InvalidProvider(format!("{kind} is not configured")).into()
        })
    }

    pub fn sessions(&self) -> &SessionManager<S, D> {
        &self.sessions
    }

    /// Start signing in with `provider`.
    pub async fn begin_sign_in(
        &self,
        provider: ProviderKind,
        request: SignInRequest,
    ) -> Result<SignInStarted, Error> {
        let handler = self.provider(provider)?;
        let started = handler.begin(request).await?;

        // Every started attempt is new: a fresh state or ticket now awaits
        // its callback.
        SignInState::Idle.advance(SignInEvent::RedirectStarted, Some(provider.as_str()));

        Ok(started)
    }

    /// Verify what the provider sent back and issue a session.
    ///
    /// A failed verification issues nothing and creates no user.
    pub async fn complete_sign_in(
        &self,
        provider: ProviderKind,
        data: CallbackData,
    ) -> Result<Session, Error> {
        let handler = self.provider(provider)?;
        let attempt = Self::attempt_state(handler, &data).await?;
        let kind = Some(provider.as_str());

        let claim = match handler.complete(data).await {
            Ok(claim) => claim,
            Err(err) => {
                warn!(provider = %provider, error = %err, "Sign-in failed");
                attempt.advance(SignInEvent::CallbackFailed, kind);
                return Err(err);
            }
        };

        match self.sessions.issue(&claim).await {
            Ok(session) => {
                attempt.advance(SignInEvent::CallbackSucceeded, kind);
                info!(user_id = %session.user_id, provider = %provider, "User signed in");
                Ok(session)
            }
            Err(err) => {
                error!(
                    provider = %provider,
                    error = %err,
                    "Verified sign-in could not be turned into a session"
                );
                attempt.advance(SignInEvent::CallbackFailed, kind);
                Err(err)
            }
        }
    }

    /// Revoke a session. Signing out twice is not an error.
    pub async fn sign_out(&self, token: &SessionToken) -> Result<(), Error> {
        // Revocation must not depend on the user directory being reachable.
        let state = self.session_state(token).await.unwrap_or_else(|err| {
            warn!(error = %err, "Could not read session state before sign-out");
            SignInState::Idle
        });
        self.sessions.revoke(token).await?;
        state.advance(SignInEvent::SignedOut, None);
        Ok(())
    }

    /// Where the attempt answered by `data` stands.
    ///
    /// [`SignInState::AwaitingProviderCallback`] while `provider` still holds
    /// the pending OAuth state or unredeemed ticket, [`SignInState::Idle`]
    /// once it has been used, has expired, or never existed.
    pub async fn callback_state(
        &self,
        provider: ProviderKind,
        data: &CallbackData,
    ) -> Result<SignInState, Error> {
        Self::attempt_state(self.provider(provider)?, data).await
    }

    /// [`SignInState::Authenticated`] while `token` names a live session.
    pub async fn session_state(&self, token: &SessionToken) -> Result<SignInState, Error> {
        match self.sessions.validate(token).await {
            Ok(_) => Ok(SignInState::Authenticated),
            Err(err) if err.is_auth_error() => Ok(SignInState::Idle),
            Err(err) => Err(err),
        }
    }

    async fn attempt_state(handler: &Provider, data: &CallbackData) -> Result<SignInState, Error> {
        Ok(if handler.is_awaiting(data).await? {
            SignInState::AwaitingProviderCallback
        } else {
            SignInState::Idle
        })
    }

    /// Resolve a session token to its user.
    pub async fn check_session(&self, token: &SessionToken) -> Result<User, Error> {
        self.sessions.validate(token).await
    }

    /// Evict expired sessions, tickets and pending authorizations.
    pub async fn purge_expired(&self) -> Result<u64, Error> {
        self.sessions.purge_expired().await
    }
}
