//! Users
//!
//! | Field               | Type                       | Description                                          |
//! | ------------------- | -------------------------- | ---------------------------------------------------- |
//! | `id`                | `UserId`                   | Opaque unique identifier.                            |
//! | `primary_email`     | `String`                   | The verified email of the first claim for this user. |
//! | `linked_identities` | `BTreeSet<LinkedIdentity>` | Every `(provider, subject)` pair owned by the user.  |
//! | `created_at`        | `DateTime`                 | When the user was created.                           |
//!
//! A `(provider, subject)` pair belongs to at most one user. Users are created
//! on the first successful claim for an unseen pair and are never deleted by
//! wicket itself.
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    claim::{IdentityClaim, ProviderKind},
    id::{generate_prefixed_id, validate_prefixed_id},
};

/// A unique, stable identifier for a user. Treat it as opaque.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: &str) -> Self {
        UserId(id.to_string())
    }

    pub fn new_random() -> Self {
        UserId(generate_prefixed_id("usr"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        validate_prefixed_id(&self.0, "usr")
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A `(provider, subject)` pair linked to a user.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LinkedIdentity {
    pub provider: ProviderKind,
    pub subject_id: String,
}

impl LinkedIdentity {
    pub fn new(provider: ProviderKind, subject_id: impl Into<String>) -> Self {
        Self {
            provider,
            subject_id: subject_id.into(),
        }
    }
}

impl From<&IdentityClaim> for LinkedIdentity {
    fn from(claim: &IdentityClaim) -> Self {
        Self::new(claim.provider(), claim.subject_id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub primary_email: String,
    pub linked_identities: BTreeSet<LinkedIdentity>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// A fresh user owning the claim's identity.
    pub fn from_claim(claim: &IdentityClaim) -> Self {
        Self {
            id: UserId::new_random(),
            primary_email: claim.email().to_string(),
            linked_identities: BTreeSet::from([LinkedIdentity::from(claim)]),
            created_at: Utc::now(),
        }
    }

    pub fn has_identity(&self, provider: ProviderKind, subject_id: &str) -> bool {
        self.linked_identities
            .iter()
            .any(|identity| identity.provider == provider && identity.subject_id == subject_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id() {
        let id = UserId::new_random();
        assert!(id.is_valid());
        assert_eq!(id.to_string(), id.as_str());
        assert!(!UserId::new("someone").is_valid());
    }

    #[test]
    fn test_user_id_serializes_as_plain_string() {
        let id = UserId::new("usr_abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"usr_abc\"");
    }

    #[test]
    fn test_user_from_claim() {
        let claim = IdentityClaim::verified(ProviderKind::Google, "1234", "a@x.com");
        let user = User::from_claim(&claim);

        assert!(user.id.is_valid());
        assert_eq!(user.primary_email, "a@x.com");
        assert!(user.has_identity(ProviderKind::Google, "1234"));
        assert!(!user.has_identity(ProviderKind::Email, "a@x.com"));
    }
}
