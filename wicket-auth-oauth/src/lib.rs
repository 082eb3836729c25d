//! OAuth redirect sign-in for wicket
//!
//! The redirect flow has two legs. [`OAuthRedirectFlow::start_redirect`]
//! mints a fresh `state`, remembers it server-side, and returns the
//! provider's authorization URL. When the provider sends the browser back,
//! [`OAuthRedirectFlow::handle_callback`] checks the `state`, exchanges the
//! authorization code and produces a verified [`IdentityClaim`].
//!
//! A `state` is single use and lives for at most ten minutes. The flow never
//! creates users or sessions; that is the session manager's job.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use wicket_auth_oauth::{GoogleClient, OAuthConfig, OAuthRedirectFlow};
//! use wicket_core::MemoryTokenStore;
//!
//! # async fn run() -> Result<(), wicket_core::Error> {
//! let flow = OAuthRedirectFlow::new(
//!     Arc::new(GoogleClient::from_env()?),
//!     Arc::new(MemoryTokenStore::new()),
//!     OAuthConfig::default(),
//! );
//!
//! let request = flow.start_redirect().await?;
//! println!("Send the browser to {}", request.url);
//! # Ok(())
//! # }
//! ```
pub mod providers;

pub use providers::{AuthorizationUrl, GoogleClient, OAuthClient, ProviderIdentity};

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::{debug, info, warn};
use wicket_core::{
    AuthError, Error, IdentityClaim, IdentityProvider, PendingAuthorization, ProviderKind,
    StoredToken, TokenStore, ValidationError, crypto, validation,
    validation::normalize_email,
};

/// Upper bound on how long an OAuth `state` stays valid.
pub fn max_state_lifetime() -> Duration {
    Duration::minutes(10)
}

#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// Lifetime of a pending authorization. Values above
    /// [`max_state_lifetime`] are capped.
    pub state_lifetime: Duration,
    /// Bound on the whole code exchange, including the user info lookup.
    pub provider_timeout: std::time::Duration,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            state_lifetime: max_state_lifetime(),
            provider_timeout: std::time::Duration::from_secs(10),
        }
    }
}

/// Where to redirect the browser to start signing in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub url: String,
    /// The opaque `state` embedded in `url`. Bind it to the browser (for
    /// example in a short-lived cookie) and pass it back as the
    /// `expected_state` of the [`OAuthCallback`].
    pub state: String,
}

/// What the provider sent back to the redirect URI, together with the
/// `state` the originating browser holds.
///
/// The callback is accepted only when `state` equals `expected_state`, so a
/// caller without a bound state (no cookie, say) passes an empty string and
/// is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthCallback {
    pub code: String,
    pub state: String,
    pub expected_state: String,
}

impl OAuthCallback {
    pub fn new(
        code: impl Into<String>,
        state: impl Into<String>,
        expected_state: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            state: state.into(),
            expected_state: expected_state.into(),
        }
    }
}

pub struct OAuthRedirectFlow {
    client: Arc<dyn OAuthClient>,
    store: Arc<dyn TokenStore>,
    config: OAuthConfig,
}

impl OAuthRedirectFlow {
    pub fn new(
        client: Arc<dyn OAuthClient>,
        store: Arc<dyn TokenStore>,
        config: OAuthConfig,
    ) -> Self {
        Self {
            client,
            store,
            config,
        }
    }

    pub fn kind(&self) -> ProviderKind {
        self.client.kind()
    }

    fn state_lifetime(&self) -> Duration {
        self.config.state_lifetime.min(max_state_lifetime())
    }

    /// Begin a sign-in: store a pending authorization and return the URL to
    /// send the browser to.
    pub async fn start_redirect(&self) -> Result<AuthorizationRequest, Error> {
        let state = crypto::generate_secure_token();
        let AuthorizationUrl { url, pkce_verifier } = self.client.authorization_url(&state)?;

        let lifetime = self.state_lifetime();
        let now = Utc::now();
        let pending = PendingAuthorization {
            provider: self.kind(),
            pkce_verifier,
            created_at: now,
            expires_at: validation::deadline(now, lifetime)?,
        };

        self.store
            .put(
                &PendingAuthorization::storage_key(&state),
                StoredToken::PendingAuthorization(pending),
                lifetime,
            )
            .await?;

        debug!(provider = %self.kind(), "Started OAuth redirect");

        Ok(AuthorizationRequest { url, state })
    }

    /// Finish a sign-in from the provider's callback.
    ///
    /// The pending authorization is consumed before the code exchange. It is
    /// put back only when the provider could not be reached, so the caller can
    /// retry with the same `state` while it is still valid.
    pub async fn handle_callback(&self, callback: OAuthCallback) -> Result<IdentityClaim, Error> {
        let kind = self.kind();

        if callback.expected_state.is_empty()
            || !crypto::constant_time_eq(&callback.expected_state, &callback.state)
        {
            warn!(provider = %kind, "OAuth state is not bound to this browser");
            return Err(AuthError::InvalidState.into());
        }

        if callback.code.is_empty() {
            return Err(ValidationError::MissingField("code".to_string()).into());
        }

        let key = PendingAuthorization::storage_key(&callback.state);
        let pending = match self.store.take(&key).await? {
            Some(StoredToken::PendingAuthorization(pending)) => pending,
            _ => {
                warn!(provider = %kind, "Unknown or already used OAuth state");
                return Err(AuthError::InvalidState.into());
            }
        };

        if pending.provider != kind || pending.is_expired() {
            warn!(provider = %kind, "Expired or foreign OAuth state");
            return Err(AuthError::InvalidState.into());
        }

        let exchange = self
            .client
            .exchange_code(&callback.code, pending.pkce_verifier.as_deref());

        let identity = match tokio::time::timeout(self.config.provider_timeout, exchange).await {
            Ok(Ok(identity)) => identity,
            Ok(Err(err)) => {
                if err.is_retryable() {
                    self.restore(&key, pending).await;
                }
                warn!(provider = %kind, error = ?err, "Code exchange failed");
                return Err(err);
            }
            Err(_) => {
                self.restore(&key, pending).await;
                warn!(provider = %kind, "Code exchange timed out");
                return Err(AuthError::ProviderUnavailable(format!(
                    "no response from {kind} within {:?}",
                    self.config.provider_timeout
                ))
                .into());
            }
        };

        if !identity.email_verified {
            warn!(provider = %kind, "Provider email is not verified");
            return Err(AuthError::ProviderRejected("email address not verified".to_string()).into());
        }

        let email = normalize_email(&identity.email).map_err(|_| {
            AuthError::ProviderRejected("provider returned an invalid email address".to_string())
        })?;

        info!(provider = %kind, "OAuth sign-in verified");

        Ok(IdentityClaim::verified(kind, identity.subject, email))
    }

    /// Whether `state` belongs to a redirect that has neither completed nor
    /// expired.
    pub async fn is_pending(&self, state: &str) -> Result<bool, Error> {
        let stored = self.store.get(&PendingAuthorization::storage_key(state)).await?;
        Ok(matches!(
            stored,
            Some(StoredToken::PendingAuthorization(pending))
                if pending.provider == self.kind() && !pending.is_expired()
        ))
    }

    async fn restore(&self, key: &str, pending: PendingAuthorization) {
        let remaining = pending.expires_at - Utc::now();
        if remaining <= Duration::zero() {
            return;
        }

        if let Err(e) = self
            .store
            .put(key, StoredToken::PendingAuthorization(pending), remaining)
            .await
        {
            warn!(error = ?e, "Failed to restore pending authorization");
        }
    }
}

#[async_trait]
impl IdentityProvider for OAuthRedirectFlow {
    type Request = OAuthCallback;

    fn kind(&self) -> ProviderKind {
        OAuthRedirectFlow::kind(self)
    }

    async fn verify(&self, request: OAuthCallback) -> Result<IdentityClaim, Error> {
        self.handle_callback(request).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use wicket_core::MemoryTokenStore;

    enum Exchange {
        Succeed(ProviderIdentity),
        Reject,
        Unavailable,
        Hang,
    }

    /// Scripted provider: each exchange pops the next outcome.
    struct MockClient {
        script: Mutex<VecDeque<Exchange>>,
        verifiers: Mutex<Vec<Option<String>>>,
    }

    impl MockClient {
        fn new(script: Vec<Exchange>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                verifiers: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl OAuthClient for MockClient {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Google
        }

        fn authorization_url(&self, state: &str) -> Result<AuthorizationUrl, Error> {
            Ok(AuthorizationUrl {
                url: format!("https://provider.test/authorize?state={state}"),
                pkce_verifier: Some("verifier".to_string()),
            })
        }

        async fn exchange_code(
            &self,
            _code: &str,
            pkce_verifier: Option<&str>,
        ) -> Result<ProviderIdentity, Error> {
            self.verifiers
                .lock()
                .unwrap()
                .push(pkce_verifier.map(str::to_string));
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(Exchange::Succeed(identity)) => Ok(identity),
                Some(Exchange::Reject) => {
                    Err(AuthError::ProviderRejected("invalid_grant".to_string()).into())
                }
                Some(Exchange::Unavailable) | None => {
                    Err(AuthError::ProviderUnavailable("connection refused".to_string()).into())
                }
                Some(Exchange::Hang) => {
                    tokio::time::sleep(std::time::Duration::from_secs(60)).await;
                    Err(AuthError::ProviderUnavailable("hung".to_string()).into())
                }
            }
        }
    }

    fn identity(email_verified: bool) -> ProviderIdentity {
        ProviderIdentity {
            subject: "google-sub-1".to_string(),
            email: " A@X.com ".to_string(),
            email_verified,
            name: Some("A".to_string()),
        }
    }

    fn flow_with(
        script: Vec<Exchange>,
        config: OAuthConfig,
    ) -> (OAuthRedirectFlow, Arc<MockClient>, Arc<MemoryTokenStore>) {
        let client = Arc::new(MockClient::new(script));
        let store = Arc::new(MemoryTokenStore::new());
        let flow = OAuthRedirectFlow::new(client.clone(), store.clone(), config);
        (flow, client, store)
    }

    /// A callback from the browser that started the redirect.
    fn bound(code: &str, state: &str) -> OAuthCallback {
        OAuthCallback::new(code, state, state)
    }

    fn auth_error(err: &Error) -> AuthError {
        err.auth_error().cloned().expect("expected an auth error")
    }

    #[tokio::test]
    async fn test_start_redirect_stores_pending_authorization() {
        let (flow, _, store) = flow_with(vec![], OAuthConfig::default());

        let request = flow.start_redirect().await.unwrap();
        assert!(request.url.contains(&request.state));

        let stored = store
            .get(&PendingAuthorization::storage_key(&request.state))
            .await
            .unwrap();
        match stored {
            Some(StoredToken::PendingAuthorization(pending)) => {
                assert_eq!(pending.provider, ProviderKind::Google);
                assert_eq!(pending.pkce_verifier.as_deref(), Some("verifier"));
                assert_eq!(pending.expires_at - pending.created_at, Duration::minutes(10));
            }
            other => panic!("expected a pending authorization, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_state_lifetime_is_capped() {
        let config = OAuthConfig {
            state_lifetime: Duration::hours(1),
            ..Default::default()
        };
        let (flow, _, store) = flow_with(vec![], config);

        let request = flow.start_redirect().await.unwrap();
        let Some(StoredToken::PendingAuthorization(pending)) = store
            .get(&PendingAuthorization::storage_key(&request.state))
            .await
            .unwrap()
        else {
            panic!("pending authorization missing");
        };
        assert_eq!(pending.expires_at - pending.created_at, Duration::minutes(10));
    }

    #[tokio::test]
    async fn test_callback_success() {
        let (flow, client, _) =
            flow_with(vec![Exchange::Succeed(identity(true))], OAuthConfig::default());

        let request = flow.start_redirect().await.unwrap();
        let claim = flow.handle_callback(bound("code", &request.state)).await.unwrap();

        assert_eq!(claim.provider(), ProviderKind::Google);
        assert_eq!(claim.subject_id(), "google-sub-1");
        assert_eq!(claim.email(), "a@x.com");
        assert_eq!(
            client.verifiers.lock().unwrap().as_slice(),
            &[Some("verifier".to_string())]
        );
    }

    #[tokio::test]
    async fn test_callback_with_different_state() {
        let (flow, _, _) = flow_with(vec![Exchange::Succeed(identity(true))], OAuthConfig::default());

        let first = flow.start_redirect().await.unwrap();
        let second = flow.start_redirect().await.unwrap();

        // A valid state, but not the one bound to this browser.
        let callback = OAuthCallback::new("code", &second.state, &first.state);
        let err = flow.handle_callback(callback).await.unwrap_err();
        assert_eq!(auth_error(&err), AuthError::InvalidState);
    }

    #[tokio::test]
    async fn test_callback_without_bound_state() {
        let (flow, client, store) =
            flow_with(vec![Exchange::Succeed(identity(true))], OAuthConfig::default());

        // A live state replayed from a browser that never started a redirect.
        let request = flow.start_redirect().await.unwrap();
        let err = flow
            .handle_callback(OAuthCallback::new("code", &request.state, ""))
            .await
            .unwrap_err();
        assert_eq!(auth_error(&err), AuthError::InvalidState);

        // Rejected before the exchange, and the owner's state is untouched.
        assert!(client.verifiers.lock().unwrap().is_empty());
        assert_eq!(store.len(), 1);
        flow.handle_callback(bound("code", &request.state))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_is_pending_until_callback() {
        let (flow, _, _) = flow_with(vec![Exchange::Succeed(identity(true))], OAuthConfig::default());

        let request = flow.start_redirect().await.unwrap();
        assert!(flow.is_pending(&request.state).await.unwrap());
        assert!(!flow.is_pending("forged").await.unwrap());

        flow.handle_callback(bound("code", &request.state))
            .await
            .unwrap();
        assert!(!flow.is_pending(&request.state).await.unwrap());
    }

    #[tokio::test]
    async fn test_callback_with_unknown_state() {
        let (flow, _, _) = flow_with(vec![Exchange::Succeed(identity(true))], OAuthConfig::default());

        let err = flow
            .handle_callback(bound("code", "forged"))
            .await
            .unwrap_err();
        assert_eq!(auth_error(&err), AuthError::InvalidState);
    }

    #[tokio::test]
    async fn test_state_is_single_use() {
        let (flow, _, _) = flow_with(
            vec![
                Exchange::Succeed(identity(true)),
                Exchange::Succeed(identity(true)),
            ],
            OAuthConfig::default(),
        );

        let request = flow.start_redirect().await.unwrap();
        flow.handle_callback(bound("code", &request.state))
            .await
            .unwrap();

        let err = flow
            .handle_callback(bound("code", &request.state))
            .await
            .unwrap_err();
        assert_eq!(auth_error(&err), AuthError::InvalidState);
    }

    #[tokio::test]
    async fn test_expired_state() {
        let config = OAuthConfig {
            state_lifetime: Duration::zero(),
            ..Default::default()
        };
        let (flow, _, _) = flow_with(vec![Exchange::Succeed(identity(true))], config);

        let request = flow.start_redirect().await.unwrap();
        let err = flow
            .handle_callback(bound("code", &request.state))
            .await
            .unwrap_err();
        assert_eq!(auth_error(&err), AuthError::InvalidState);
    }

    #[tokio::test]
    async fn test_missing_code() {
        let (flow, _, _) = flow_with(vec![], OAuthConfig::default());

        let request = flow.start_redirect().await.unwrap();
        let err = flow
            .handle_callback(bound("", &request.state))
            .await
            .unwrap_err();
        assert!(err.is_validation_error());
    }

    #[tokio::test]
    async fn test_rejected_exchange_consumes_state() {
        let (flow, _, store) = flow_with(vec![Exchange::Reject], OAuthConfig::default());

        let request = flow.start_redirect().await.unwrap();
        let err = flow
            .handle_callback(bound("code", &request.state))
            .await
            .unwrap_err();

        assert!(matches!(auth_error(&err), AuthError::ProviderRejected(_)));
        assert!(!err.is_retryable());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_provider_can_be_retried() {
        let (flow, _, _) = flow_with(
            vec![Exchange::Unavailable, Exchange::Succeed(identity(true))],
            OAuthConfig::default(),
        );

        let request = flow.start_redirect().await.unwrap();
        let err = flow
            .handle_callback(bound("code", &request.state))
            .await
            .unwrap_err();
        assert!(err.is_retryable());

        let claim = flow
            .handle_callback(bound("code", &request.state))
            .await
            .unwrap();
        assert_eq!(claim.subject_id(), "google-sub-1");
    }

    #[tokio::test]
    async fn test_exchange_timeout() {
        let config = OAuthConfig {
            provider_timeout: std::time::Duration::from_millis(50),
            ..Default::default()
        };
        let (flow, _, store) = flow_with(vec![Exchange::Hang], config);

        let request = flow.start_redirect().await.unwrap();
        let err = flow
            .handle_callback(bound("code", &request.state))
            .await
            .unwrap_err();

        assert!(matches!(auth_error(&err), AuthError::ProviderUnavailable(_)));
        // The state is back in the store for a retry.
        assert!(
            store
                .get(&PendingAuthorization::storage_key(&request.state))
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_unverified_email_is_rejected() {
        let (flow, _, _) = flow_with(vec![Exchange::Succeed(identity(false))], OAuthConfig::default());

        let request = flow.start_redirect().await.unwrap();
        let err = flow
            .handle_callback(bound("code", &request.state))
            .await
            .unwrap_err();
        assert!(matches!(auth_error(&err), AuthError::ProviderRejected(_)));
    }

    #[tokio::test]
    async fn test_identity_provider_impl() {
        let (flow, _, _) = flow_with(vec![Exchange::Succeed(identity(true))], OAuthConfig::default());

        let request = flow.start_redirect().await.unwrap();
        let claim = IdentityProvider::verify(&flow, bound("code", &request.state))
            .await
            .unwrap();
        assert_eq!(IdentityProvider::kind(&flow), ProviderKind::Google);
        assert_eq!(claim.email(), "a@x.com");
    }
}
