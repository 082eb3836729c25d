use crate::{Email, MailerError};
use async_trait::async_trait;
use std::sync::Arc;

/// Outbound email boundary.
///
/// Implementations deliver a fully built [`Email`]. Callers in the auth core
/// treat delivery as fire-and-forget, so an implementation should return
/// promptly and report failures through the result rather than retrying.
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send_email(&self, email: Email) -> Result<(), MailerError>;
}

#[async_trait]
impl<M: Mailer + ?Sized> Mailer for Arc<M> {
    async fn send_email(&self, email: Email) -> Result<(), MailerError> {
        (**self).send_email(email).await
    }
}

#[async_trait]
impl Mailer for Box<dyn Mailer> {
    async fn send_email(&self, email: Email) -> Result<(), MailerError> {
        (**self).send_email(email).await
    }
}
