//! Assembling an [`AuthGateway`]
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use wicket::{AuthGateway, GatewayConfig};
//! use wicket_core::{MemoryTokenStore, MemoryUserDirectory};
//! use wicket_mailer::MailerConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = AuthGateway::builder(
//!     Arc::new(MemoryTokenStore::new()),
//!     Arc::new(MemoryUserDirectory::new()),
//! )
//! .with_config(GatewayConfig::from_env()?)
//! .with_google_from_env()?
//! .with_mailer_config(&MailerConfig::from_env()?)?
//! .build()?;
//! # Ok(())
//! # }
//! ```
use std::collections::HashMap;
use std::sync::Arc;

use wicket_auth_magic_link::EmailMagicLinkFlow;
use wicket_auth_oauth::{GoogleClient, OAuthClient, OAuthRedirectFlow};
use wicket_core::{SessionManager, TokenStore, UserDirectory};
use wicket_mailer::{Mailer, MailerConfig, MailerError};

use crate::{AuthGateway, GatewayConfig, provider::Provider};

/// Errors that can occur when building an [`AuthGateway`].
#[derive(Debug, thiserror::Error)]
pub enum GatewayBuilderError {
    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Failed to configure the mailer
    #[error("Mailer configuration failed: {0}")]
    Mailer(#[from] MailerError),

    /// Failed to configure an identity provider
    #[error("Provider configuration failed: {0}")]
    Provider(#[from] wicket_core::Error),
}

pub struct AuthGatewayBuilder<S: TokenStore, D: UserDirectory> {
    store: Arc<S>,
    directory: Arc<D>,
    config: GatewayConfig,
    oauth_clients: Vec<Arc<dyn OAuthClient>>,
    mailer: Option<Arc<dyn Mailer>>,
}

impl<S: TokenStore, D: UserDirectory> AuthGatewayBuilder<S, D> {
    pub fn new(store: Arc<S>, directory: Arc<D>) -> Self {
        Self {
            store,
            directory,
            config: GatewayConfig::default(),
            oauth_clients: Vec::new(),
            mailer: None,
        }
    }

    pub fn with_config(mut self, config: GatewayConfig) -> Self {
        self.config = config;
        self
    }

    /// Enable an OAuth redirect provider.
    pub fn with_oauth_client(mut self, client: Arc<dyn OAuthClient>) -> Self {
        self.oauth_clients.push(client);
        self
    }

    pub fn with_google(self, client: GoogleClient) -> Self {
        self.with_oauth_client(Arc::new(client))
    }

    /// Enable Google sign-in from `GOOGLE_ID`, `GOOGLE_SECRET` and
    /// `GOOGLE_REDIRECT_URI`.
    pub fn with_google_from_env(self) -> Result<Self, GatewayBuilderError> {
        Ok(self.with_google(GoogleClient::from_env()?))
    }

    /// Enable email magic links delivered through `mailer`.
    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    /// Enable email magic links with the transport described by `config`.
    /// The sender address and app name are taken from it too.
    pub fn with_mailer_config(mut self, config: &MailerConfig) -> Result<Self, GatewayBuilderError> {
        let transport = config.build_transport()?;
        self.config = self.config.with_mailer_identity(config);
        self.mailer = Some(Arc::from(transport));
        Ok(self)
    }

    pub fn build(self) -> Result<AuthGateway<S, D>, GatewayBuilderError> {
        self.config.validate()?;

        let token_store: Arc<dyn TokenStore> = self.store.clone();
        let mut providers = HashMap::new();

        for client in self.oauth_clients {
            let kind = client.kind();
            let flow = OAuthRedirectFlow::new(client, token_store.clone(), self.config.oauth());
            if providers.insert(kind, Provider::OAuth(flow)).is_some() {
                return Err(GatewayBuilderError::InvalidConfiguration(format!(
                    "provider {kind} configured twice"
                )));
            }
        }

        if let Some(mailer) = self.mailer {
            let flow = EmailMagicLinkFlow::new(token_store, mailer, self.config.magic_link());
            let kind = wicket_core::ProviderKind::Email;
            if providers.insert(kind, Provider::Email(flow)).is_some() {
                return Err(GatewayBuilderError::InvalidConfiguration(format!(
                    "provider {kind} configured twice"
                )));
            }
        }

        if providers.is_empty() {
            return Err(GatewayBuilderError::InvalidConfiguration(
                "no identity providers configured".to_string(),
            ));
        }

        let sessions = SessionManager::new(
            self.store,
            self.directory,
            self.config.session_manager(),
        );

        tracing::info!(
            providers = ?providers.keys().collect::<Vec<_>>(),
            "Auth gateway ready"
        );

        Ok(AuthGateway::new(sessions, providers))
    }
}
