//! Email login tickets
//!
//! A ticket is the one-time secret embedded in a magic link. The store keeps
//! an [`EmailLoginTicket`] under the hash of the ticket value; the value
//! itself only ever travels inside the email.
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{crypto, error::ValidationError, validation};

/// Store namespace for login tickets.
pub const TICKET_NAMESPACE: &str = "tkt";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailLoginTicket {
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed: bool,
}

impl EmailLoginTicket {
    pub fn new(email: impl Into<String>, lifetime: Duration) -> Result<Self, ValidationError> {
        let now = Utc::now();
        Ok(Self {
            email: email.into(),
            created_at: now,
            expires_at: validation::deadline(now, lifetime)?,
            consumed: false,
        })
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// The key a ticket value is stored under.
    pub fn storage_key(ticket_value: &str) -> String {
        crypto::storage_key(TICKET_NAMESPACE, ticket_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ticket() {
        let ticket = EmailLoginTicket::new("a@x.com", Duration::hours(24)).unwrap();
        assert!(!ticket.consumed);
        assert!(!ticket.is_expired());
        assert_eq!(ticket.expires_at - ticket.created_at, Duration::hours(24));
    }

    #[test]
    fn test_zero_lifetime_ticket_is_expired() {
        let ticket = EmailLoginTicket::new("a@x.com", Duration::zero()).unwrap();
        assert!(ticket.is_expired());
    }

    #[test]
    fn test_lifetime_out_of_range() {
        assert!(EmailLoginTicket::new("a@x.com", Duration::MAX).is_err());
    }

    #[test]
    fn test_storage_key() {
        let key = EmailLoginTicket::storage_key("value");
        assert!(key.starts_with("tkt:"));
        assert_ne!(key, EmailLoginTicket::storage_key("other"));
    }
}
