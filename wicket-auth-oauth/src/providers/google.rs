use std::time::Duration;

use async_trait::async_trait;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, RequestTokenError, Scope, TokenResponse,
    TokenUrl, basic::BasicClient,
};
use serde::Deserialize;
use wicket_core::{AuthError, Error, ProviderKind, ValidationError};

use super::{AuthorizationUrl, OAuthClient, ProviderIdentity};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const DEFAULT_SCOPES: &str = "openid email profile";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

type ConfiguredClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// A limited subset of the user info response from Google.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUserInfo {
    pub sub: String,
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Google sign-in via the authorization code flow with PKCE.
pub struct GoogleClient {
    client: ConfiguredClient,
    http: reqwest::Client,
}

impl GoogleClient {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Result<Self, Error> {
        Self::with_timeout(client_id, client_secret, redirect_uri, DEFAULT_HTTP_TIMEOUT)
    }

    /// Like [`GoogleClient::new`] with a custom timeout for each HTTP request.
    pub fn with_timeout(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let redirect_uri = RedirectUrl::new(redirect_uri.into()).map_err(|e| {
            ValidationError::InvalidField(format!("Invalid redirect URI: {e}"))
        })?;
        let auth_uri = AuthUrl::new(GOOGLE_AUTH_URL.to_string())
            .map_err(|e| ValidationError::InvalidField(format!("Invalid auth URL: {e}")))?;
        let token_uri = TokenUrl::new(GOOGLE_TOKEN_URL.to_string())
            .map_err(|e| ValidationError::InvalidField(format!("Invalid token URL: {e}")))?;

        let client = BasicClient::new(ClientId::new(client_id.into()))
            .set_client_secret(ClientSecret::new(client_secret.into()))
            .set_auth_uri(auth_uri)
            .set_token_uri(token_uri)
            .set_redirect_uri(redirect_uri);

        let http = reqwest::ClientBuilder::new()
            // Following redirects opens the client up to SSRF vulnerabilities.
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .build()
            .map_err(|e| ValidationError::InvalidField(format!("HTTP client: {e}")))?;

        Ok(Self { client, http })
    }

    /// Read `GOOGLE_ID`, `GOOGLE_SECRET` and `GOOGLE_REDIRECT_URI`.
    pub fn from_env() -> Result<Self, Error> {
        let var = |name: &str| {
            std::env::var(name).map_err(|_| ValidationError::MissingField(name.to_string()))
        };
        Self::new(var("GOOGLE_ID")?, var("GOOGLE_SECRET")?, var("GOOGLE_REDIRECT_URI")?)
    }

    async fn user_info(&self, access_token: &str) -> Result<GoogleUserInfo, Error> {
        let response = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, "Error getting user info");
                AuthError::ProviderUnavailable(format!("userinfo request failed: {e}"))
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            tracing::error!(error = ?e, "Error reading user info");
            AuthError::ProviderUnavailable(format!("userinfo body could not be read: {e}"))
        })?;

        Ok(read_user_info(status, &body)?)
    }
}

/// Map a userinfo response to the profile or a provider error.
///
/// 5xx and unparseable bodies are `ProviderUnavailable`; any other
/// non-success status is `ProviderRejected`.
fn read_user_info(status: reqwest::StatusCode, body: &[u8]) -> Result<GoogleUserInfo, AuthError> {
    if status.is_server_error() {
        return Err(AuthError::ProviderUnavailable(format!("userinfo returned {status}")));
    }
    if !status.is_success() {
        return Err(AuthError::ProviderRejected(format!("userinfo returned {status}")));
    }

    serde_json::from_slice(body).map_err(|e| {
        tracing::error!(error = ?e, "Error parsing user info");
        AuthError::ProviderUnavailable("malformed userinfo response".to_string())
    })
}

#[async_trait]
impl OAuthClient for GoogleClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    fn authorization_url(&self, state: &str) -> Result<AuthorizationUrl, Error> {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let state = state.to_string();

        let (auth_url, _) = self
            .client
            .authorize_url(|| CsrfToken::new(state))
            .set_pkce_challenge(pkce_challenge)
            .add_scopes(
                DEFAULT_SCOPES
                    .split_whitespace()
                    .map(|s| Scope::new(s.to_string())),
            )
            .url();

        Ok(AuthorizationUrl {
            url: auth_url.to_string(),
            pkce_verifier: Some(pkce_verifier.secret().to_string()),
        })
    }

    async fn exchange_code(
        &self,
        code: &str,
        pkce_verifier: Option<&str>,
    ) -> Result<ProviderIdentity, Error> {
        let mut request = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()));
        if let Some(verifier) = pkce_verifier {
            request = request.set_pkce_verifier(PkceCodeVerifier::new(verifier.to_string()));
        }

        let token_response = request
            .request_async(&self.http)
            .await
            .map_err(|e| match e {
                RequestTokenError::ServerResponse(response) => {
                    tracing::warn!(error = %response, "Google rejected the code exchange");
                    AuthError::ProviderRejected(response.to_string())
                }
                RequestTokenError::Request(e) => {
                    tracing::error!(error = ?e, "Code exchange request failed");
                    AuthError::ProviderUnavailable(e.to_string())
                }
                RequestTokenError::Parse(e, _) => {
                    tracing::error!(error = ?e, "Unparseable token response");
                    AuthError::ProviderUnavailable("unparseable token response".to_string())
                }
                RequestTokenError::Other(message) => AuthError::ProviderRejected(message),
            })?;

        tracing::debug!("Exchanged authorization code");

        let user_info = self
            .user_info(token_response.access_token().secret())
            .await?;

        let email = user_info.email.ok_or_else(|| {
            AuthError::ProviderRejected("Google account has no email address".to_string())
        })?;

        Ok(ProviderIdentity {
            subject: user_info.sub,
            email,
            email_verified: user_info.email_verified,
            name: user_info.name,
        })
    }
}
