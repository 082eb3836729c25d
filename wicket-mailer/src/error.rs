use lettre::transport::{file, smtp};

#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("Invalid mailbox: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Incomplete email: {0}")]
    Builder(String),

    #[error("Could not render email: {0}")]
    Template(#[from] askama::Error),

    #[error("Could not assemble message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP delivery failed: {0}")]
    Smtp(#[from] smtp::Error),

    #[error("Could not write email file: {0}")]
    File(#[from] file::Error),

    #[error("Mailer misconfigured: {0}")]
    Config(String),

    #[error("Delivery task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
