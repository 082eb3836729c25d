use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Failures a sign-in caller is expected to handle.
///
/// Only [`AuthError::ProviderUnavailable`] is worth retrying; every other
/// variant ends the attempt and the user has to start signing in again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid or expired OAuth state")]
    InvalidState,

    #[error("Identity provider rejected the request: {0}")]
    ProviderRejected(String),

    #[error("Identity provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Login ticket expired")]
    TicketExpired,

    #[error("Login ticket already used")]
    TicketAlreadyUsed,

    #[error("Login ticket not found")]
    TicketNotFound,

    #[error("Session expired")]
    SessionExpired,

    #[error("Session not found")]
    SessionNotFound,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Record not found")]
    NotFound,
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    #[error("Invalid provider: {0}")]
    InvalidProvider(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

impl Error {
    /// The caller may retry the same operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Auth(AuthError::ProviderUnavailable(_)))
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Auth(_))
    }

    pub fn is_storage_error(&self) -> bool {
        matches!(self, Error::Storage(_))
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// The inner [`AuthError`], if this is one.
    pub fn auth_error(&self) -> Option<&AuthError> {
        match self {
            Error::Auth(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let auth_error = Error::Auth(AuthError::TicketAlreadyUsed);
        assert_eq!(
            auth_error.to_string(),
            "Authentication error: Login ticket already used"
        );

        let validation_error =
            Error::Validation(ValidationError::InvalidEmail("test@".to_string()));
        assert_eq!(
            validation_error.to_string(),
            "Validation error: Invalid email format: test@"
        );

        let storage_error = Error::Storage(StorageError::NotFound);
        assert_eq!(storage_error.to_string(), "Storage error: Record not found");
    }

    #[test]
    fn test_only_provider_unavailable_is_retryable() {
        assert!(Error::from(AuthError::ProviderUnavailable("timeout".into())).is_retryable());

        for terminal in [
            AuthError::InvalidState,
            AuthError::ProviderRejected("denied".into()),
            AuthError::TicketExpired,
            AuthError::TicketAlreadyUsed,
            AuthError::TicketNotFound,
            AuthError::SessionExpired,
            AuthError::SessionNotFound,
        ] {
            assert!(!Error::from(terminal).is_retryable());
        }

        assert!(!Error::Storage(StorageError::Database("down".into())).is_retryable());
    }

    #[test]
    fn test_error_classification() {
        let err: Error = AuthError::SessionNotFound.into();
        assert!(err.is_auth_error());
        assert_eq!(err.auth_error(), Some(&AuthError::SessionNotFound));

        let err: Error = ValidationError::MissingField("email".into()).into();
        assert!(err.is_validation_error());
        assert_eq!(err.auth_error(), None);

        let err: Error = StorageError::Migration("bad".into()).into();
        assert!(err.is_storage_error());
    }
}
