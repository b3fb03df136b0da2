//! Password Hashing and Verification
//!
//! NIST SP 800-63B compliant password handling with:
//! - Argon2id hashing with configurable cost (OWASP defaults)
//! - Zeroization of sensitive data
//! - Dummy verification for unknown identities
//! - Rehash detection when cost parameters change
//!
//! Hashing is CPU and memory bound; async callers should go through
//! [`PasswordHasher::hash_blocking`] / [`PasswordHasher::verify_blocking`],
//! which move the work onto tokio's blocking pool.

use std::fmt;
use std::sync::Arc;

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier as _, Version,
    password_hash::SaltString,
};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

// ============================================================================
// Constants (NIST SP 800-63B compliant)
// ============================================================================

/// Minimum password length (NIST: SHALL be at least 8)
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length (NIST: SHOULD permit at least 64)
pub const MAX_PASSWORD_LENGTH: usize = 128;

// ============================================================================
// Error Types
// ============================================================================

/// Password policy violation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("Password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    #[error("Password must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    #[error("Password cannot be empty or contain only whitespace")]
    EmptyOrWhitespace,

    #[error("Password contains invalid control characters")]
    InvalidCharacter,

    #[error("Password is too common or follows a predictable pattern")]
    CommonPattern,
}

/// Password hashing/verification errors
#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,

    #[error("Invalid Argon2 parameters: {0}")]
    InvalidParams(String),

    #[error("Hashing task failed: {0}")]
    TaskFailed(String),
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Clear text password with automatic memory zeroization
///
/// - Implements `Zeroize` and `ZeroizeOnDrop`
/// - Does not implement `Clone` to prevent accidental copies
/// - Debug output is redacted
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Create a new clear text password, enforcing the password policy
    ///
    /// Unicode is normalized using NFKC before validation. Lengths are
    /// counted in code points, not bytes.
    pub fn new(raw: String) -> Result<Self, PasswordPolicyError> {
        let candidate = Self::for_verification(raw);
        let normalized = candidate.0.as_str();

        if normalized.trim().is_empty() {
            return Err(PasswordPolicyError::EmptyOrWhitespace);
        }

        let char_count = normalized.chars().count();
        if char_count < MIN_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: MIN_PASSWORD_LENGTH,
                actual: char_count,
            });
        }
        if char_count > MAX_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooLong {
                max: MAX_PASSWORD_LENGTH,
                actual: char_count,
            });
        }

        // Space, tab and newline are allowed; other control characters are not
        if normalized
            .chars()
            .any(|ch| ch.is_control() && ch != ' ' && ch != '\t' && ch != '\n')
        {
            return Err(PasswordPolicyError::InvalidCharacter);
        }

        if is_common_pattern(normalized) {
            return Err(PasswordPolicyError::CommonPattern);
        }

        Ok(candidate)
    }

    /// Wrap a login attempt without enforcing policy
    ///
    /// The input is still NFKC-normalized so it compares equal to what was
    /// hashed at registration. Policy is not applied: a login attempt with a
    /// short password must fail as "invalid credentials", not as a policy
    /// error that hints at what the stored password looks like.
    pub fn for_verification(raw: String) -> Self {
        let raw = Zeroizing::new(raw);
        Self(raw.nfkc().collect())
    }

    fn peppered(&self, pepper: Option<&[u8]>) -> Zeroizing<Vec<u8>> {
        let mut bytes = self.0.as_bytes().to_vec();
        if let Some(p) = pepper {
            bytes.extend_from_slice(p);
        }
        Zeroizing::new(bytes)
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hashed Password (Safe to store)
// ============================================================================

/// Hashed password in PHC string format
///
/// The PHC string carries algorithm, version, cost parameters and salt, so a
/// stored hash stays verifiable after the configured cost changes.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    /// Create from PHC string (e.g., from database)
    pub fn from_phc_string(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let hash = s.into();
        PasswordHash::new(&hash).map_err(|_| PasswordHashError::InvalidHashFormat)?;
        Ok(Self { hash })
    }

    /// Get the PHC string for storage
    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Hasher
// ============================================================================

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Config {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Iterations
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for Argon2Config {
    /// OWASP recommended Argon2id parameters: m=19456 (19 MiB), t=2, p=1
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl Argon2Config {
    /// Minimal cost for unit tests. Never use outside tests.
    pub fn insecure_fast() -> Self {
        Self {
            memory_kib: 256,
            iterations: 1,
            parallelism: 1,
        }
    }

    fn params(&self) -> Result<Params, PasswordHashError> {
        Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| PasswordHashError::InvalidParams(e.to_string()))
    }
}

/// Argon2id hasher with an optional application pepper
///
/// Cheap to clone. Holds a dummy hash produced with the same parameters, so
/// verifying against an unknown identity costs the same as a real check.
#[derive(Clone)]
pub struct PasswordHasher {
    inner: Arc<HasherInner>,
}

struct HasherInner {
    config: Argon2Config,
    params: Params,
    pepper: Option<Zeroizing<Vec<u8>>>,
    dummy: HashedPassword,
}

impl PasswordHasher {
    pub fn new(config: Argon2Config, pepper: Option<Vec<u8>>) -> Result<Self, PasswordHashError> {
        let params = config.params()?;
        let pepper = pepper.map(Zeroizing::new);

        let dummy_password =
            ClearTextPassword::for_verification(crate::crypto::random_token());
        let dummy = hash_with(&params, pepper.as_deref().map(Vec::as_slice), &dummy_password)?;

        Ok(Self {
            inner: Arc::new(HasherInner {
                config,
                params,
                pepper,
                dummy,
            }),
        })
    }

    pub fn config(&self) -> Argon2Config {
        self.inner.config
    }

    fn pepper(&self) -> Option<&[u8]> {
        self.inner.pepper.as_deref().map(Vec::as_slice)
    }

    /// Hash a password with the configured parameters and a fresh salt
    pub fn hash(&self, password: &ClearTextPassword) -> Result<HashedPassword, PasswordHashError> {
        hash_with(&self.inner.params, self.pepper(), password)
    }

    /// Verify a password against a stored hash
    ///
    /// Uses the parameters embedded in the hash; Argon2 compares in
    /// constant time.
    pub fn verify(&self, hashed: &HashedPassword, password: &ClearTextPassword) -> bool {
        let Ok(parsed) = PasswordHash::new(hashed.as_phc_string()) else {
            return false;
        };
        Argon2::default()
            .verify_password(&password.peppered(self.pepper()), &parsed)
            .is_ok()
    }

    /// Burn the same work as [`Self::verify`] against a throwaway hash
    ///
    /// Always returns `false`.
    pub fn verify_dummy(&self, password: &ClearTextPassword) -> bool {
        let _ = self.verify(&self.inner.dummy, password);
        false
    }

    /// True when the hash is not Argon2id or uses different cost parameters
    pub fn needs_rehash(&self, hashed: &HashedPassword) -> bool {
        let Ok(parsed) = PasswordHash::new(hashed.as_phc_string()) else {
            return true;
        };
        if parsed.algorithm != Algorithm::Argon2id.ident() {
            return true;
        }
        match Params::try_from(&parsed) {
            Ok(stored) => {
                stored.m_cost() != self.inner.params.m_cost()
                    || stored.t_cost() != self.inner.params.t_cost()
                    || stored.p_cost() != self.inner.params.p_cost()
            }
            Err(_) => true,
        }
    }

    /// [`Self::hash`] on the blocking thread pool
    pub async fn hash_blocking(
        &self,
        password: ClearTextPassword,
    ) -> Result<HashedPassword, PasswordHashError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| PasswordHashError::TaskFailed(e.to_string()))?
    }

    /// [`Self::verify`] on the blocking thread pool
    ///
    /// `None` runs [`Self::verify_dummy`] instead. The password is handed
    /// back so a successful check can be followed by a rehash.
    pub async fn verify_blocking(
        &self,
        hashed: Option<HashedPassword>,
        password: ClearTextPassword,
    ) -> Result<(bool, ClearTextPassword), PasswordHashError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || {
            let valid = match &hashed {
                Some(hashed) => hasher.verify(hashed, &password),
                None => hasher.verify_dummy(&password),
            };
            (valid, password)
        })
        .await
        .map_err(|e| PasswordHashError::TaskFailed(e.to_string()))
    }
}

impl fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("config", &self.inner.config)
            .field("pepper", &self.inner.pepper.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

fn hash_with(
    params: &Params,
    pepper: Option<&[u8]>,
    password: &ClearTextPassword,
) -> Result<HashedPassword, PasswordHashError> {
    let salt = SaltString::generate(OsRng);
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone());

    let hash = argon2
        .hash_password(&password.peppered(pepper), &salt)
        .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

    Ok(HashedPassword {
        hash: hash.to_string(),
    })
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Check for common weak patterns
fn is_common_pattern(password: &str) -> bool {
    let lower = password.to_lowercase();

    // All the same character (e.g., "aaaaaaaa")
    let mut chars = lower.chars();
    if let Some(first) = chars.next() {
        if chars.all(|c| c == first) {
            return true;
        }
    }

    if is_sequential_numbers(&lower) {
        return true;
    }

    const KEYBOARD_PATTERNS: &[&str] = &[
        "qwerty",
        "qwertyuiop",
        "asdfgh",
        "asdfghjkl",
        "zxcvbn",
        "qazwsx",
        "1qaz2wsx",
    ];
    if KEYBOARD_PATTERNS.iter().any(|p| lower.contains(p)) {
        return true;
    }

    const COMMON_PASSWORDS: &[&str] = &[
        "password",
        "password1",
        "password123",
        "abcdefgh",
        "letmein",
        "welcome",
        "welcome1",
        "admin123",
        "iloveyou",
        "sunshine",
        "princess",
        "football",
        "baseball",
        "trustno1",
    ];
    COMMON_PASSWORDS.contains(&lower.as_str())
}

/// Check if string is sequential numbers
fn is_sequential_numbers(s: &str) -> bool {
    let digits: Vec<u32> = s.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() < 4 || digits.len() != s.chars().count() {
        return false;
    }

    let is_ascending = digits
        .windows(2)
        .all(|w| w[1] == w[0] + 1 || (w[0] == 9 && w[1] == 0));
    let is_descending = digits
        .windows(2)
        .all(|w| w[0] == w[1] + 1 || (w[0] == 0 && w[1] == 9));

    is_ascending || is_descending
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(Argon2Config::insecure_fast(), None).unwrap()
    }

    #[test]
    fn test_password_too_short() {
        let result = ClearTextPassword::new("short".to_string());
        assert!(matches!(result, Err(PasswordPolicyError::TooShort { .. })));
    }

    #[test]
    fn test_password_too_long() {
        let long_password = "ab".repeat(MAX_PASSWORD_LENGTH);
        let result = ClearTextPassword::new(long_password);
        assert!(matches!(result, Err(PasswordPolicyError::TooLong { .. })));
    }

    #[test]
    fn test_password_whitespace_only() {
        let result = ClearTextPassword::new("        ".to_string());
        assert!(matches!(
            result,
            Err(PasswordPolicyError::EmptyOrWhitespace)
        ));
    }

    #[test]
    fn test_password_control_character() {
        let result = ClearTextPassword::new("Secure\u{0007}Pass42".to_string());
        assert!(matches!(result, Err(PasswordPolicyError::InvalidCharacter)));
    }

    #[test]
    fn test_password_common_pattern() {
        for weak in ["password123", "qwertyuiop", "12345678", "zzzzzzzz"] {
            let result = ClearTextPassword::new(weak.to_string());
            assert!(
                matches!(result, Err(PasswordPolicyError::CommonPattern)),
                "{weak} should be rejected"
            );
        }
    }

    #[test]
    fn test_valid_passwords() {
        assert!(ClearTextPassword::new("MySecure#Pass2024!".to_string()).is_ok());
        assert!(ClearTextPassword::new("パスワード安全です!".to_string()).is_ok());
    }

    #[test]
    fn test_nfkc_normalization_matches_on_verify() {
        let hasher = hasher();
        // Fullwidth letters normalize to ASCII under NFKC
        let registered = ClearTextPassword::new("ＳｅｃｕｒｅＰａｓｓ42".to_string()).unwrap();
        let hashed = hasher.hash(&registered).unwrap();

        let attempt = ClearTextPassword::for_verification("SecurePass42".to_string());
        assert!(hasher.verify(&hashed, &attempt));
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = hasher();
        let password = ClearTextPassword::for_verification("TestPassword123!".to_string());
        let hashed = hasher.hash(&password).unwrap();

        assert!(hasher.verify(&hashed, &password));

        let wrong = ClearTextPassword::for_verification("WrongPassword123!".to_string());
        assert!(!hasher.verify(&hashed, &wrong));
    }

    #[test]
    fn test_hash_with_pepper() {
        let peppered = PasswordHasher::new(
            Argon2Config::insecure_fast(),
            Some(b"my_secret_pepper".to_vec()),
        )
        .unwrap();
        let plain = hasher();

        let password = ClearTextPassword::for_verification("TestPassword123!".to_string());
        let hashed = peppered.hash(&password).unwrap();

        assert!(peppered.verify(&hashed, &password));
        assert!(!plain.verify(&hashed, &password));
    }

    #[test]
    fn test_verify_dummy_is_always_false() {
        let hasher = hasher();
        let password = ClearTextPassword::for_verification("anything-at-all".to_string());
        assert!(!hasher.verify_dummy(&password));
    }

    #[test]
    fn test_needs_rehash_on_param_change() {
        let weak = hasher();
        let strong = PasswordHasher::new(
            Argon2Config {
                memory_kib: 512,
                iterations: 2,
                parallelism: 1,
            },
            None,
        )
        .unwrap();

        let password = ClearTextPassword::for_verification("TestPassword123!".to_string());
        let hashed = weak.hash(&password).unwrap();

        assert!(!weak.needs_rehash(&hashed));
        assert!(strong.needs_rehash(&hashed));
        // Old hashes still verify after the cost changes
        assert!(strong.verify(&hashed, &password));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let result = PasswordHasher::new(
            Argon2Config {
                memory_kib: 1,
                iterations: 0,
                parallelism: 1,
            },
            None,
        );
        assert!(matches!(result, Err(PasswordHashError::InvalidParams(_))));
    }

    #[test]
    fn test_phc_string_roundtrip() {
        let hasher = hasher();
        let password = ClearTextPassword::for_verification("TestPassword123!".to_string());
        let hashed = hasher.hash(&password).unwrap();

        let restored = HashedPassword::from_phc_string(hashed.as_phc_string()).unwrap();
        assert!(hasher.verify(&restored, &password));
        assert!(HashedPassword::from_phc_string("not_a_valid_hash").is_err());
    }

    #[test]
    fn test_debug_redaction() {
        let password = ClearTextPassword::for_verification("secret-value".to_string());
        let debug_output = format!("{:?}", password);
        assert!(debug_output.contains("REDACTED"));
        assert!(!debug_output.contains("secret-value"));
    }

    #[tokio::test]
    async fn test_blocking_variants() {
        let hasher = hasher();
        let hashed = hasher
            .hash_blocking(ClearTextPassword::for_verification("TestPassword123!".into()))
            .await
            .unwrap();

        let (ok, _) = hasher
            .verify_blocking(
                Some(hashed),
                ClearTextPassword::for_verification("TestPassword123!".into()),
            )
            .await
            .unwrap();
        assert!(ok);

        let (unknown, _) = hasher
            .verify_blocking(None, ClearTextPassword::for_verification("x".into()))
            .await
            .unwrap();
        assert!(!unknown);
    }
}
