//! Secret generation and hashing
//!
//! Session tokens, login tickets and OAuth states are bearer secrets. They are
//! generated from the OS RNG with 256 bits of entropy, handed to the caller
//! once, and only their SHA-256 hash is ever written to a store. High-entropy
//! random values do not need a slow password hash.

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use rand::{TryRngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Generate a 256-bit random secret, base64url encoded (43 characters).
///
/// # Panics
///
/// Panics if the OS random number generator is unavailable.
pub fn generate_secure_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .expect("OS RNG failure - system entropy source unavailable");
    BASE64_URL_SAFE_NO_PAD.encode(bytes)
}

/// Hex-encoded SHA-256 of a secret.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Store key for a secret: `{namespace}:{sha256(secret)}`.
pub fn storage_key(namespace: &str, secret: &str) -> String {
    format!("{namespace}:{}", hash_token(secret))
}

/// Compare two secrets without leaking the position of the first mismatch.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_secure_token() {
        let token = generate_secure_token();
        assert_eq!(token.len(), 43);
        assert_eq!(BASE64_URL_SAFE_NO_PAD.decode(&token).unwrap().len(), 32);
        assert_ne!(token, generate_secure_token());
    }

    #[test]
    fn test_hash_token() {
        let hash = hash_token("test_token");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, hash_token("test_token"));
        assert_ne!(hash, hash_token("other_token"));
    }

    #[test]
    fn test_storage_key_is_namespaced() {
        let key = storage_key("sess", "secret");
        assert!(key.starts_with("sess:"));
        assert_ne!(key, storage_key("tkt", "secret"));
        assert!(!key.contains("secret"));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("state", "state"));
        assert!(!constant_time_eq("state", "stale"));
        assert!(!constant_time_eq("state", "state2"));
        assert!(constant_time_eq("", ""));
    }
}
