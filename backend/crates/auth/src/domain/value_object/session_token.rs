//! Session Token Value Object
//!
//! Opaque bearer secret handed to the client. The server only ever stores
//! `keyed_digest(secret, namespace, token)`; the namespace label keeps buyer
//! and admin digests disjoint even for the same raw string.

use std::fmt;

use platform::crypto::{SecretKey, keyed_digest, random_token};

/// Longest token string accepted from a client
const MAX_PRESENTED_LEN: usize = 128;

/// Token namespace; one per session registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenNamespace {
    Buyer,
    Admin,
}

impl TokenNamespace {
    pub const fn label(&self) -> &'static str {
        match self {
            TokenNamespace::Buyer => "buyer-session",
            TokenNamespace::Admin => "admin-session",
        }
    }
}

/// Raw session token
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Fresh 256-bit token
    pub fn generate() -> Self {
        Self(random_token())
    }

    /// Accept a token presented by a client
    ///
    /// Returns `None` for empty or oversized input so obviously bogus values
    /// never reach the database.
    pub fn from_presented(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw.len() > MAX_PRESENTED_LEN {
            return None;
        }
        Some(Self(raw.to_string()))
    }

    pub fn digest(&self, key: &SecretKey, namespace: TokenNamespace) -> Vec<u8> {
        keyed_digest(key, namespace.label(), &self.0).to_vec()
    }

    /// Token string for the response body or cookie
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionToken").field(&"[REDACTED]").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tokens_are_distinct() {
        let a = SessionToken::generate();
        let b = SessionToken::generate();
        assert_ne!(a, b);
        assert_eq!(a.expose().len(), 43);
    }

    #[test]
    fn test_from_presented_rejects_garbage() {
        assert!(SessionToken::from_presented("").is_none());
        assert!(SessionToken::from_presented("   ").is_none());
        assert!(SessionToken::from_presented(&"x".repeat(MAX_PRESENTED_LEN + 1)).is_none());
        assert_eq!(
            SessionToken::from_presented(" abc ").unwrap().expose(),
            "abc"
        );
    }

    #[test]
    fn test_digest_differs_by_namespace() {
        let key = SecretKey::generate();
        let token = SessionToken::generate();
        assert_ne!(
            token.digest(&key, TokenNamespace::Buyer),
            token.digest(&key, TokenNamespace::Admin)
        );
    }

    #[test]
    fn test_debug_is_redacted() {
        let token = SessionToken::from_presented("super-secret").unwrap();
        assert!(!format!("{token:?}").contains("super-secret"));
    }
}
