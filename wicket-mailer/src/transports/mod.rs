//! Delivery backends for [`Mailer`](crate::Mailer).
mod file;
mod smtp;

pub use file::FileTransport;
pub use smtp::{SmtpSecurity, SmtpSettings, SmtpTransport, SmtpUrl};
