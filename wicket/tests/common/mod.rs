#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use wicket::{
    AuthGateway, AuthorizationUrl, CallbackData, Error, OAuthClient, ProviderIdentity,
    ProviderKind, SignInRequest, TokenStore, UserDirectory,
};
use wicket_mailer::{Email, Mailer, MailerError};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("wicket=debug")
        .with_test_writer()
        .try_init();
}

/// Google stand-in: every code exchange resolves to the same account.
pub struct FakeGoogle {
    pub subject: String,
    pub email: String,
}

impl FakeGoogle {
    pub fn new(subject: &str, email: &str) -> Self {
        Self {
            subject: subject.to_string(),
            email: email.to_string(),
        }
    }
}

#[async_trait]
impl OAuthClient for FakeGoogle {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    fn authorization_url(&self, state: &str) -> Result<AuthorizationUrl, Error> {
        Ok(AuthorizationUrl {
            url: format!("https://accounts.test/o/oauth2/auth?state={state}"),
            pkce_verifier: Some("pkce".to_string()),
        })
    }

    async fn exchange_code(
        &self,
        _code: &str,
        _pkce_verifier: Option<&str>,
    ) -> Result<ProviderIdentity, Error> {
        Ok(ProviderIdentity {
            subject: self.subject.clone(),
            email: self.email.clone(),
            email_verified: true,
            name: None,
        })
    }
}

/// Hands every sent email to the test through a channel.
pub struct ChannelMailer {
    sent: mpsc::UnboundedSender<Email>,
}

impl ChannelMailer {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Email>) {
        let (sent, rx) = mpsc::unbounded_channel();
        (Self { sent }, rx)
    }
}

#[async_trait]
impl Mailer for ChannelMailer {
    async fn send_email(&self, email: Email) -> Result<(), MailerError> {
        self.sent
            .send(email)
            .map_err(|e| MailerError::Builder(e.to_string()))
    }
}

pub fn ticket_from(email: &Email) -> String {
    let (_, rest) = email
        .text_body
        .split_once("token=")
        .expect("link with a token");
    rest.split_whitespace()
        .next()
        .expect("token value")
        .to_string()
}

/// Request a link for `address` and return the ticket from the email.
pub async fn email_ticket<S: TokenStore, D: UserDirectory>(
    gateway: &AuthGateway<S, D>,
    inbox: &mut mpsc::UnboundedReceiver<Email>,
    address: &str,
) -> String {
    gateway
        .begin_sign_in(ProviderKind::Email, SignInRequest::email(address))
        .await
        .expect("link requested");
    let email = inbox.recv().await.expect("email delivered");
    ticket_from(&email)
}

/// Run the email flow end to end and return the session.
pub async fn sign_in_by_email<S: TokenStore, D: UserDirectory>(
    gateway: &AuthGateway<S, D>,
    inbox: &mut mpsc::UnboundedReceiver<Email>,
    address: &str,
) -> wicket::Session {
    let ticket = email_ticket(gateway, inbox, address).await;
    gateway
        .complete_sign_in(ProviderKind::Email, CallbackData::email(ticket))
        .await
        .expect("signed in")
}

pub fn mailer() -> (Arc<ChannelMailer>, mpsc::UnboundedReceiver<Email>) {
    let (mailer, inbox) = ChannelMailer::new();
    (Arc::new(mailer), inbox)
}
