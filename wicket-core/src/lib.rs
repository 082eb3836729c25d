//! Core functionality for wicket
//!
//! This crate holds the pieces every identity provider and storage backend
//! shares:
//!
//! - the data model: [`User`], [`IdentityClaim`], [`Session`] and [`EmailLoginTicket`]
//! - the error taxonomy in [`error`]
//! - the persistence contracts [`TokenStore`] and [`UserDirectory`], with
//!   in-memory implementations
//! - the [`IdentityProvider`] contract implemented by the provider crates
//! - the [`SessionManager`], which turns a verified claim into a session
//!
//! Application code normally talks to the `wicket` crate's gateway instead of
//! using these types directly.
pub mod claim;
pub mod crypto;
pub mod error;
pub mod id;
pub mod provider;
pub mod services;
pub mod session;
pub mod storage;
pub mod ticket;
pub mod user;
pub mod validation;

pub use claim::{IdentityClaim, ProviderKind};
pub use error::{AuthError, Error, StorageError, ValidationError};
pub use provider::IdentityProvider;
pub use services::{SessionManager, SessionManagerConfig};
pub use session::{Session, SessionRecord, SessionToken};
pub use storage::{
    ConsumeOutcome, MemoryTokenStore, MemoryUserDirectory, PendingAuthorization, StoredToken,
    TokenStore, UserDirectory,
};
pub use ticket::EmailLoginTicket;
pub use user::{LinkedIdentity, User, UserId};
