//! Wicket is a small authentication core.
//!
//! A caller signs in through an identity provider (Google OAuth or an email
//! magic link), and wicket issues an opaque, revocable server-side session.
//! The [`AuthGateway`] exposes the whole surface:
//!
//! - [`AuthGateway::begin_sign_in`] starts a sign-in: a redirect URL for OAuth,
//!   a sent link for email
//! - [`AuthGateway::complete_sign_in`] verifies the provider callback and issues
//!   a [`Session`]
//! - [`AuthGateway::check_session`] resolves a session token to its [`User`]
//! - [`AuthGateway::sign_out`] revokes a session
//!
//! Storage is pluggable through the [`TokenStore`] and [`UserDirectory`]
//! contracts. In-memory implementations ship with `wicket-core`; the `sqlite`
//! feature (on by default) adds a SQLite backend.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use wicket::{AuthGateway, CallbackData, ProviderKind, SignInRequest};
//! use wicket_core::{MemoryTokenStore, MemoryUserDirectory};
//! use wicket_mailer::MailerConfig;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = AuthGateway::builder(
//!     Arc::new(MemoryTokenStore::new()),
//!     Arc::new(MemoryUserDirectory::new()),
//! )
//! .with_mailer_config(&MailerConfig::from_env()?)?
//! .build()?;
//!
//! gateway
//!     .begin_sign_in(ProviderKind::Email, SignInRequest::email("user@example.com"))
//!     .await?;
//!
//! // The user follows the link; the ticket arrives as the `token` parameter.
//! let session = gateway
//!     .complete_sign_in(ProviderKind::Email, CallbackData::email("ticket"))
//!     .await?;
//!
//! let user = gateway.check_session(&session.token).await?;
//! gateway.sign_out(&session.token).await?;
//! # Ok(())
//! # }
//! ```
mod builder;
mod config;
mod gateway;
mod provider;
mod state;

pub use builder::{AuthGatewayBuilder, GatewayBuilderError};
pub use config::GatewayConfig;
pub use gateway::AuthGateway;
pub use provider::{CallbackData, Provider, SignInRequest, SignInStarted};
pub use state::{SignInEvent, SignInState};

pub use wicket_auth_magic_link::{EmailMagicLinkFlow, MagicLinkConfig};
pub use wicket_auth_oauth::{
    AuthorizationRequest, AuthorizationUrl, GoogleClient, OAuthCallback, OAuthClient, OAuthConfig,
    OAuthRedirectFlow, ProviderIdentity,
};
pub use wicket_core::{
    AuthError, Error, IdentityClaim, ProviderKind, Session, SessionToken, StorageError, TokenStore,
    User, UserDirectory, UserId, ValidationError,
};

/// SQLite storage backend.
#[cfg(feature = "sqlite")]
pub mod sqlite {
    pub use wicket_storage_sqlite::{SqliteBackend, SqliteTokenStore, SqliteUserDirectory};
}

#[cfg(feature = "sqlite")]
impl AuthGateway<sqlite::SqliteTokenStore, sqlite::SqliteUserDirectory> {
    /// A builder over both halves of a SQLite backend.
    pub fn sqlite_builder(
        backend: &sqlite::SqliteBackend,
    ) -> AuthGatewayBuilder<sqlite::SqliteTokenStore, sqlite::SqliteUserDirectory> {
        AuthGateway::builder(backend.token_store(), backend.user_directory())
    }
}
