//! Email delivery for wicket
//!
//! The authentication core only ever needs one outbound message, the sign-in
//! link. This crate provides the [`Email`] value, the [`Mailer`] transport
//! boundary, and two `lettre`-backed transports: [`SmtpTransport`] for real
//! delivery and [`FileTransport`] for local development.
pub mod config;
pub mod email;
pub mod email_types;
pub mod error;
pub mod mailer;
pub mod templates;
pub mod transports;

pub use config::{MailerConfig, TransportConfig};
pub use email::{Email, EmailBuilder};
pub use email_types::MagicLinkEmail;
pub use error::MailerError;
pub use mailer::Mailer;
pub use transports::{FileTransport, SmtpSecurity, SmtpSettings, SmtpTransport, SmtpUrl};

pub mod prelude {
    pub use crate::{
        Email, EmailBuilder, FileTransport, MagicLinkEmail, Mailer, MailerConfig, MailerError,
        SmtpTransport,
    };
}
