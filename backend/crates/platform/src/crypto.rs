//! Cryptographic Utilities

use std::fmt;

use base64::{Engine, engine::general_purpose};
use hmac::{Hmac, Mac};
use rand::{RngCore, rngs::OsRng};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha256 = Hmac<Sha256>;

/// Number of random bytes in an opaque session token (256 bits)
pub const TOKEN_BYTES: usize = 32;

/// Generate cryptographically secure random bytes
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Generate an opaque, URL-safe session token
///
/// 256 bits of OS randomness, base64url without padding (43 characters).
pub fn random_token() -> String {
    to_base64_url(&random_bytes(TOKEN_BYTES))
}

/// Encode bytes as base64
pub fn to_base64(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

/// Decode base64 to bytes
pub fn from_base64(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::STANDARD.decode(s)
}

/// Encode bytes as unpadded base64url
pub fn to_base64_url(bytes: &[u8]) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Server-side secret used to key token digests
///
/// Zeroized on drop; `Debug` never prints the key material.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Fresh random key (development and tests)
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Decode a standard-base64 key; must be exactly 32 bytes
    pub fn from_base64(s: &str) -> Option<Self> {
        let decoded = from_base64(s.trim()).ok()?;
        let bytes: [u8; 32] = decoded.try_into().ok()?;
        Some(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SecretKey").field(&"[REDACTED]").finish()
    }
}

/// Compute HMAC-SHA256
pub fn hmac_sha256(key: &SecretKey, data: &[u8]) -> [u8; 32] {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts any key length"));
    mac.update(data);
    mac.finalize().into_bytes().into()
}

/// Keyed digest of a token within a namespace
///
/// The namespace label is mixed into the MAC input, so the same raw token
/// digests differently in two namespaces and a lookup in one can never hit
/// a row stored by the other.
pub fn keyed_digest(key: &SecretKey, namespace: &str, token: &str) -> [u8; 32] {
    let mut input = Vec::with_capacity(namespace.len() + 1 + token.len());
    input.extend_from_slice(namespace.as_bytes());
    input.push(0);
    input.extend_from_slice(token.as_bytes());
    hmac_sha256(key, &input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hmac_matches_direct_computation() {
        let key = SecretKey::new([0x0b; 32]);
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&[0x0b; 32]).unwrap();
        mac.update(b"Hi There");
        let expected: [u8; 32] = mac.finalize().into_bytes().into();
        assert_eq!(hmac_sha256(&key, b"Hi There"), expected);
    }

    #[test]
    fn test_random_token_shape() {
        let a = random_token();
        let b = random_token();
        assert_eq!(a.len(), 43);
        assert_ne!(a, b);
        assert!(
            a.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_keyed_digest_is_namespace_separated() {
        let key = SecretKey::generate();
        let token = random_token();
        let buyer = keyed_digest(&key, "buyer-session", &token);
        let admin = keyed_digest(&key, "admin-session", &token);
        assert_ne!(buyer, admin);
        assert_eq!(buyer, keyed_digest(&key, "buyer-session", &token));
    }

    #[test]
    fn test_keyed_digest_depends_on_key() {
        let token = random_token();
        let a = keyed_digest(&SecretKey::generate(), "buyer-session", &token);
        let b = keyed_digest(&SecretKey::generate(), "buyer-session", &token);
        assert_ne!(a, b);
    }

    #[test]
    fn test_secret_key_from_base64() {
        let encoded = to_base64(&[7u8; 32]);
        let key = SecretKey::from_base64(&encoded).unwrap();
        assert_eq!(key.as_bytes(), &[7u8; 32]);

        assert!(SecretKey::from_base64(&to_base64(&[1u8; 16])).is_none());
        assert!(SecretKey::from_base64("%%%").is_none());
        assert!(format!("{key:?}").contains("REDACTED"));
    }
}
