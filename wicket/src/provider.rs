//! Tagged dispatch over the configured identity providers.
use wicket_auth_magic_link::EmailMagicLinkFlow;
use wicket_auth_oauth::{AuthorizationRequest, OAuthCallback, OAuthRedirectFlow};
use wicket_core::{Error, IdentityClaim, IdentityProvider, ProviderKind, ValidationError};

/// One configured identity provider.
pub enum Provider {
    OAuth(OAuthRedirectFlow),
    Email(EmailMagicLinkFlow),
}

/// Input that starts a sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInRequest {
    OAuth,
    Email { email: String },
}

/// What the caller should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInStarted {
    /// Send the browser to the provider.
    Redirect(AuthorizationRequest),
    /// A sign-in link is on its way, if the address can receive mail.
    LinkSent,
}

/// What came back from the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackData {
    OAuth(OAuthCallback),
    Email { ticket: String },
}

impl SignInRequest {
    pub fn email(email: impl Into<String>) -> Self {
        SignInRequest::Email {
            email: email.into(),
        }
    }
}

impl CallbackData {
    pub fn email(ticket: impl Into<String>) -> Self {
        CallbackData::Email {
            ticket: ticket.into(),
        }
    }
}

impl Provider {
    pub fn kind(&self) -> ProviderKind {
        match self {
            Provider::OAuth(flow) => flow.kind(),
            Provider::Email(flow) => flow.kind(),
        }
    }

    pub(crate) async fn begin(&self, request: SignInRequest) -> Result<SignInStarted, Error> {
        match (self, request) {
            (Provider::OAuth(flow), SignInRequest::OAuth) => {
                Ok(SignInStarted::Redirect(flow.start_redirect().await?))
            }
            (Provider::Email(flow), SignInRequest::Email { email }) => {
                flow.request_link(&email).await?;
                Ok(SignInStarted::LinkSent)
            }
            _ => Err(self.mismatch("sign-in request")),
        }
    }

    pub(crate) async fn complete(&self, data: CallbackData) -> Result<IdentityClaim, Error> {
        match (self, data) {
            (Provider::OAuth(flow), CallbackData::OAuth(callback)) => flow.verify(callback).await,
            (Provider::Email(flow), CallbackData::Email { ticket }) => flow.verify(ticket).await,
            _ => Err(self.mismatch("callback")),
        }
    }

    /// Whether `data` answers an attempt this provider is still waiting on.
    pub(crate) async fn is_awaiting(&self, data: &CallbackData) -> Result<bool, Error> {
        match (self, data) {
            (Provider::OAuth(flow), CallbackData::OAuth(callback)) => {
                flow.is_pending(&callback.state).await
            }
            (Provider::Email(flow), CallbackData::Email { ticket }) => flow.is_pending(ticket).await,
            _ => Ok(false),
        }
    }

    fn mismatch(&self, what: &str) -> Error {
        ValidationError::InvalidProvider(format!("{} does not accept this {what}", self.kind())).into()
    }
}
