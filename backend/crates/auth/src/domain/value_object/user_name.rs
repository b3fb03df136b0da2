//! User Name Value Object
//!
//! Public handle used for login and display. Buyers and admins share the
//! rules; uniqueness holds within each account table only.
//!
//! Processing order is NFKC, trim, then validation. Input may be mixed
//! case; the canonical form is lowercase ASCII.
//!
//! ## Invariants
//! - 3 to 30 characters after normalization, from `a-z 0-9 _ . -`
//! - Starts and ends with an alphanumeric or `_`
//! - No `..`

use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

/// Minimum length for user name (in characters)
pub const USER_NAME_MIN_LENGTH: usize = 3;

/// Maximum length for user name (in characters)
pub const USER_NAME_MAX_LENGTH: usize = 30;

const ALLOWED_SPECIAL_CHARS: &[char] = &['_', '.', '-'];

/// Names that would be confusing next to staff accounts or API routes
const RESERVED_WORDS: &[&str] = &[
    "admin",
    "administrator",
    "root",
    "system",
    "superuser",
    "super_admin",
    "staff",
    "support",
    "api",
    "auth",
    "login",
    "logout",
    "register",
    "checkout",
    "orders",
    "favorites",
    "me",
    "null",
    "anonymous",
    "guest",
];

/// Error returned when user name validation fails
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserNameError {
    #[error("User name cannot be empty")]
    Empty,

    #[error("User name is too short ({length} chars, minimum {min})")]
    TooShort { length: usize, min: usize },

    #[error("User name is too long ({length} chars, maximum {max})")]
    TooLong { length: usize, max: usize },

    #[error("Invalid character '{ch}'. Only a-z, 0-9, _, ., - are allowed")]
    InvalidCharacter { ch: char },

    #[error("User name must start and end with a-z, 0-9, or _")]
    InvalidBoundary,

    #[error("User name cannot contain consecutive dots (..)")]
    ConsecutiveDots,

    #[error("'{0}' is a reserved user name")]
    Reserved(String),
}

/// Validated, normalized user name
///
/// `original` keeps the case the user typed; `canonical` is the lowercase
/// form used for uniqueness and lookup.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserName {
    original: String,
    canonical: String,
}

impl UserName {
    pub fn new(input: impl AsRef<str>) -> Result<Self, UserNameError> {
        let original: String = input.as_ref().nfkc().collect::<String>().trim().to_string();
        let canonical = original.to_lowercase();
        Self::validate(&canonical)?;
        Ok(Self {
            original,
            canonical,
        })
    }

    /// Lookup key for a login identifier; no validation
    pub fn canonicalize(input: &str) -> String {
        input.nfkc().collect::<String>().trim().to_lowercase()
    }

    #[inline]
    pub fn original(&self) -> &str {
        &self.original
    }

    #[inline]
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Rebuild from a stored value (assumed already validated)
    pub fn from_db(original: &str) -> Self {
        Self {
            original: original.to_string(),
            canonical: original.to_lowercase(),
        }
    }

    fn validate(canonical: &str) -> Result<(), UserNameError> {
        let (Some(first), Some(last)) = (canonical.chars().next(), canonical.chars().next_back())
        else {
            return Err(UserNameError::Empty);
        };

        let length = canonical.chars().count();
        if length < USER_NAME_MIN_LENGTH {
            return Err(UserNameError::TooShort {
                length,
                min: USER_NAME_MIN_LENGTH,
            });
        }
        if length > USER_NAME_MAX_LENGTH {
            return Err(UserNameError::TooLong {
                length,
                max: USER_NAME_MAX_LENGTH,
            });
        }

        if let Some(ch) = canonical.chars().find(|&c| !Self::is_valid_char(c)) {
            return Err(UserNameError::InvalidCharacter { ch });
        }

        let boundary_ok = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_';
        if !boundary_ok(first) || !boundary_ok(last) {
            return Err(UserNameError::InvalidBoundary);
        }

        if canonical.contains("..") {
            return Err(UserNameError::ConsecutiveDots);
        }

        if RESERVED_WORDS.contains(&canonical) {
            return Err(UserNameError::Reserved(canonical.to_string()));
        }

        Ok(())
    }

    #[inline]
    fn is_valid_char(c: char) -> bool {
        c.is_ascii_lowercase() || c.is_ascii_digit() || ALLOWED_SPECIAL_CHARS.contains(&c)
    }
}

impl TryFrom<String> for UserName {
    type Error = UserNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserName> for String {
    fn from(value: UserName) -> Self {
        value.original
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl fmt::Debug for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserName({})", self.original)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names_keep_case() {
        let name = UserName::new("  Alice_01 ").unwrap();
        assert_eq!(name.original(), "Alice_01");
        assert_eq!(name.canonical(), "alice_01");
        assert!(UserName::new("bob.smith-2").is_ok());
    }

    #[test]
    fn test_fullwidth_input_is_normalized() {
        let name = UserName::new("ａｌｉｃｅ").unwrap();
        assert_eq!(name.canonical(), "alice");
    }

    #[test]
    fn test_invalid_names() {
        assert_eq!(UserName::new("   "), Err(UserNameError::Empty));
        assert!(matches!(UserName::new("ab"), Err(UserNameError::TooShort { .. })));
        assert!(matches!(
            UserName::new("a".repeat(31)),
            Err(UserNameError::TooLong { .. })
        ));
        assert!(matches!(
            UserName::new("bad name"),
            Err(UserNameError::InvalidCharacter { ch: ' ' })
        ));
        assert_eq!(UserName::new(".alice"), Err(UserNameError::InvalidBoundary));
        assert_eq!(UserName::new("al..ice"), Err(UserNameError::ConsecutiveDots));
    }

    #[test]
    fn test_reserved_names_rejected_case_insensitively() {
        assert!(matches!(UserName::new("Admin"), Err(UserNameError::Reserved(_))));
        assert!(matches!(UserName::new("checkout"), Err(UserNameError::Reserved(_))));
    }

    #[test]
    fn test_serde_uses_validation() {
        let name: UserName = serde_json::from_str("\"Carol\"").unwrap();
        assert_eq!(name.canonical(), "carol");
        assert!(serde_json::from_str::<UserName>("\"x\"").is_err());
    }
}
