//! The external OAuth provider boundary
//!
//! An [`OAuthClient`] knows how to build the provider's authorization URL and
//! how to turn an authorization code into the provider's view of the user.
//! Everything else (state handling, timeouts, claims) lives in
//! [`OAuthRedirectFlow`](crate::OAuthRedirectFlow).
use async_trait::async_trait;
use wicket_core::{Error, ProviderKind};

mod google;

pub use google::{GoogleClient, GoogleUserInfo};

/// Where to send the browser, plus the PKCE verifier to keep server-side.
#[derive(Debug, Clone)]
pub struct AuthorizationUrl {
    pub url: String,
    pub pkce_verifier: Option<String>,
}

/// The user as reported by the provider after a successful code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderIdentity {
    /// Provider-scoped stable id (`sub` for OpenID Connect providers).
    pub subject: String,
    pub email: String,
    pub email_verified: bool,
    pub name: Option<String>,
}

#[async_trait]
pub trait OAuthClient: Send + Sync + 'static {
    fn kind(&self) -> ProviderKind;

    /// Build the authorization URL embedding `state`.
    fn authorization_url(&self, state: &str) -> Result<AuthorizationUrl, Error>;

    /// Exchange an authorization code and look up the user.
    ///
    /// Errors the provider reports are `ProviderRejected`; transport failures
    /// are `ProviderUnavailable`.
    async fn exchange_code(
        &self,
        code: &str,
        pkce_verifier: Option<&str>,
    ) -> Result<ProviderIdentity, Error>;
}
