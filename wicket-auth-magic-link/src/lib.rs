//! Email magic-link sign-in for wicket
//!
//! [`EmailMagicLinkFlow::request_link`] emails a one-time sign-in link and
//! [`EmailMagicLinkFlow::verify_link`] redeems the ticket embedded in it.
//!
//! Requesting a link never reveals whether an account exists: any well-formed
//! address gets the same answer, and delivery happens in the background.
//! Tickets are stored by hash, expire after 24 hours by default, and can be
//! redeemed exactly once even under concurrent requests.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use wicket_auth_magic_link::{EmailMagicLinkFlow, MagicLinkConfig};
//! use wicket_core::MemoryTokenStore;
//! use wicket_mailer::MailerConfig;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mailer = MailerConfig::from_env()?.build_transport()?;
//! let flow = EmailMagicLinkFlow::new(
//!     Arc::new(MemoryTokenStore::new()),
//!     Arc::from(mailer),
//!     MagicLinkConfig::default(),
//! );
//!
//! flow.request_link("user@example.com").await?;
//!
//! // Later, when the user follows the link:
//! let claim = flow.verify_link("ticket-from-the-link").await?;
//! # Ok(())
//! # }
//! ```
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use tracing::{debug, error, info, warn};
use wicket_core::{
    AuthError, ConsumeOutcome, EmailLoginTicket, Error, IdentityClaim, IdentityProvider,
    ProviderKind, StoredToken, TokenStore, crypto, validation::normalize_email,
};
use wicket_mailer::{MagicLinkEmail, Mailer};

#[derive(Debug, Clone)]
pub struct MagicLinkConfig {
    /// How long an emailed link stays valid.
    pub ticket_lifetime: Duration,
    /// The URL the ticket is appended to as a `token` query parameter.
    pub link_base_url: String,
    /// Bound on a single delivery attempt.
    pub dispatch_timeout: std::time::Duration,
    /// Sender address, optionally with a display name.
    pub from_address: String,
    /// Product name shown in the email.
    pub app_name: String,
}

impl Default for MagicLinkConfig {
    fn default() -> Self {
        Self {
            ticket_lifetime: Duration::hours(24),
            link_base_url: "http://localhost:3000/api/auth/callback/email".to_string(),
            dispatch_timeout: std::time::Duration::from_secs(10),
            from_address: "noreply@example.com".to_string(),
            app_name: "Wicket".to_string(),
        }
    }
}

pub struct EmailMagicLinkFlow {
    store: Arc<dyn TokenStore>,
    mailer: Arc<dyn Mailer>,
    config: MagicLinkConfig,
}

impl EmailMagicLinkFlow {
    pub fn new(
        store: Arc<dyn TokenStore>,
        mailer: Arc<dyn Mailer>,
        config: MagicLinkConfig,
    ) -> Self {
        Self {
            store,
            mailer,
            config,
        }
    }

    pub fn config(&self) -> &MagicLinkConfig {
        &self.config
    }

    /// Issue a ticket for `email` and send the sign-in link.
    ///
    /// Only a malformed address is an error. Delivery runs on a background
    /// task; its failures are logged and never reach the caller.
    pub async fn request_link(&self, email: &str) -> Result<(), Error> {
        let email = normalize_email(email)?;

        let ticket_value = crypto::generate_secure_token();
        let ticket = EmailLoginTicket::new(email.clone(), self.config.ticket_lifetime)?;
        self.store
            .put(
                &EmailLoginTicket::storage_key(&ticket_value),
                StoredToken::LoginTicket(ticket),
                self.config.ticket_lifetime,
            )
            .await?;

        let link = self.build_link(&ticket_value);
        self.dispatch(email, link);

        debug!("Issued login ticket");
        Ok(())
    }

    /// Redeem a ticket from a sign-in link.
    pub async fn verify_link(&self, ticket: &str) -> Result<IdentityClaim, Error> {
        if ticket.is_empty() {
            return Err(AuthError::TicketNotFound.into());
        }

        let key = EmailLoginTicket::storage_key(ticket);
        let stored = match self.store.get(&key).await? {
            Some(StoredToken::LoginTicket(stored)) => stored,
            _ => return Err(AuthError::TicketNotFound.into()),
        };

        if stored.is_expired() {
            return Err(AuthError::TicketExpired.into());
        }
        if stored.consumed {
            return Err(AuthError::TicketAlreadyUsed.into());
        }

        match self.store.consume(&key).await? {
            ConsumeOutcome::Consumed(ticket) => {
                info!("Magic link verified");
                Ok(IdentityClaim::verified(
                    ProviderKind::Email,
                    ticket.email.clone(),
                    ticket.email,
                ))
            }
            ConsumeOutcome::AlreadyConsumed => {
                warn!("Magic link redeemed concurrently");
                Err(AuthError::TicketAlreadyUsed.into())
            }
            ConsumeOutcome::Missing => Err(AuthError::TicketNotFound.into()),
        }
    }

    /// Whether `ticket` can still be redeemed.
    pub async fn is_pending(&self, ticket: &str) -> Result<bool, Error> {
        if ticket.is_empty() {
            return Ok(false);
        }

        let stored = self.store.get(&EmailLoginTicket::storage_key(ticket)).await?;
        Ok(matches!(
            stored,
            Some(StoredToken::LoginTicket(stored)) if !stored.consumed && !stored.is_expired()
        ))
    }

    fn build_link(&self, ticket_value: &str) -> String {
        let base = &self.config.link_base_url;
        let separator = if base.contains('?') { '&' } else { '?' };
        format!("{base}{separator}token={ticket_value}")
    }

    fn dispatch(&self, to: String, link: String) {
        let email = match MagicLinkEmail::build(
            &self.config.from_address,
            &to,
            &link,
            &self.config.app_name,
        ) {
            Ok(email) => email,
            Err(e) => {
                error!(error = ?e, "Failed to build magic link email");
                return;
            }
        };

        let mailer = self.mailer.clone();
        let timeout = self.config.dispatch_timeout;
        tokio::spawn(async move {
            match tokio::time::timeout(timeout, mailer.send_email(email)).await {
                Ok(Ok(())) => debug!("Magic link email sent"),
                Ok(Err(e)) => error!(error = ?e, "Failed to send magic link email"),
                Err(_) => error!(?timeout, "Timed out sending magic link email"),
            }
        });
    }
}

#[async_trait]
impl IdentityProvider for EmailMagicLinkFlow {
    type Request = String;

    fn kind(&self) -> ProviderKind {
        ProviderKind::Email
    }

    async fn verify(&self, ticket: String) -> Result<IdentityClaim, Error> {
        self.verify_link(&ticket).await
    }
}
