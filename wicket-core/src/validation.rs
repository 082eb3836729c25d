use crate::error::ValidationError;
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// A practical subset of RFC 5322, compiled once.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("Invalid email regex pattern")
});

/// Validate an email address and return its canonical form (trimmed,
/// lower-cased). Both providers key identities on this form.
///
/// ```rust
/// use wicket_core::validation::normalize_email;
///
/// assert_eq!(normalize_email(" A@X.com ").unwrap(), "a@x.com");
/// assert!(normalize_email("not-an-email").is_err());
/// ```
pub fn normalize_email(email: &str) -> Result<String, ValidationError> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::MissingField(
            "Email is required".to_string(),
        ));
    }

    if email.len() > 254 {
        return Err(ValidationError::InvalidEmail(
            "Email is too long".to_string(),
        ));
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }

    Ok(email.to_lowercase())
}

/// `start + lifetime`, or an error if the result does not fit in a
/// timestamp.
pub fn deadline(start: DateTime<Utc>, lifetime: Duration) -> Result<DateTime<Utc>, ValidationError> {
    start
        .checked_add_signed(lifetime)
        .ok_or_else(|| ValidationError::InvalidField(format!("lifetime {lifetime} is out of range")))
}
