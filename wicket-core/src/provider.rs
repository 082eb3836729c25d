//! Identity provider contract
//!
//! Every sign-in method ends the same way: the provider verifies whatever the
//! caller brought back (an OAuth callback, a magic-link ticket) and produces an
//! [`IdentityClaim`]. New providers implement this trait; the gateway never
//! needs to know how verification works.

use async_trait::async_trait;

use crate::{Error, IdentityClaim, ProviderKind};

#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// What the caller hands back to complete a sign-in.
    type Request: Send + 'static;

    fn kind(&self) -> ProviderKind;

    /// Verify the request and return the claim it proves.
    ///
    /// A failed verification leaves no partial state behind: no user, no
    /// session.
    async fn verify(&self, request: Self::Request) -> Result<IdentityClaim, Error>;
}
