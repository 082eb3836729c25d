//! Verified identity claims
//!
//! An [`IdentityClaim`] is what a provider hands back after it has verified
//! who the caller is. It is immutable and the only way to build one is
//! [`IdentityClaim::verified`], which the provider crates call once their
//! checks have passed.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The identity providers wicket knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Google,
    Email,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Google => "google",
            ProviderKind::Email => "email",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(ProviderKind::Google),
            "email" => Ok(ProviderKind::Email),
            other => Err(ValidationError::InvalidProvider(other.to_string())),
        }
    }
}

/// Proof that a provider verified an identity. Only provider flows build
/// claims, through [`IdentityClaim::verified`]; there is no way to decode one
/// from untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityClaim {
    provider: ProviderKind,
    subject_id: String,
    email: String,
    verified_at: DateTime<Utc>,
}

impl IdentityClaim {
    /// Record a successful verification.
    ///
    /// `subject_id` is the provider-scoped unique id (the email address itself
    /// for the email provider) and `email` the verified address asserted by
    /// the provider.
    pub fn verified(
        provider: ProviderKind,
        subject_id: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            subject_id: subject_id.into(),
            email: email.into(),
            verified_at: Utc::now(),
        }
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn verified_at(&self) -> DateTime<Utc> {
        self.verified_at
    }
}
