//! Email Value Object
//!
//! Validated, lowercased email address. Used as the buyer login identity,
//! as the admin contact address, and as the order-history key.

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// RFC 5321 path limit
const EMAIL_MAX_LENGTH: usize = 254;
const LOCAL_PART_MAX_LENGTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// Trim, lowercase and check the shape `local@domain.tld`
    pub fn new(email: impl Into<String>) -> AppResult<Self> {
        let email = email.into().trim().to_lowercase();

        if email.is_empty() {
            return Err(AppError::bad_request("Email cannot be empty"));
        }
        if email.len() > EMAIL_MAX_LENGTH {
            return Err(AppError::bad_request(format!(
                "Email must be at most {EMAIL_MAX_LENGTH} characters"
            )));
        }
        if !well_formed(&email) {
            return Err(AppError::bad_request("Invalid email format"));
        }

        Ok(Self(email))
    }

    /// Rebuild from a stored row
    pub fn from_db(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_db(self) -> String {
        self.0
    }

    pub fn domain(&self) -> &str {
        self.0.split_once('@').map_or("", |(_, domain)| domain)
    }

    /// Redacted form for logs: first character of the local part plus domain
    pub fn masked(&self) -> String {
        let first = self.0.chars().next().unwrap_or('*');
        format!("{first}***@{}", self.domain())
    }
}

fn well_formed(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || local.len() > LOCAL_PART_MAX_LENGTH || domain.contains('@') {
        return false;
    }
    let edge = |c: char| c == '.' || c == '-';
    domain.contains('.')
        && domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || edge(c))
        && !domain.starts_with(edge)
        && !domain.ends_with(edge)
}

impl FromStr for Email {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        Email::new(s)
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_shapes_and_lowercases() {
        for raw in [
            "buyer@example.com",
            "buyer.name@mail.example.co.jp",
            "buyer+orders@example.com",
        ] {
            assert!(Email::new(raw).is_ok(), "{raw}");
        }
        let email: Email = "  Buyer@Example.COM ".parse().unwrap();
        assert_eq!(email.as_str(), "buyer@example.com");
    }

    #[test]
    fn rejects_malformed_addresses() {
        for raw in [
            "",
            "buyerexample.com",
            "buyer@",
            "@example.com",
            "buyer@@example.com",
            "buyer@example",
            "buyer@exa mple.com",
            "buyer@.example.com",
            "buyer@example.com-",
        ] {
            assert!(Email::new(raw).is_err(), "{raw:?}");
        }
        assert!(Email::new(format!("{}@example.com", "a".repeat(65))).is_err());
    }

    #[test]
    fn masks_local_part_for_logs() {
        let email = Email::new("buyer@example.com").unwrap();
        assert_eq!(email.domain(), "example.com");
        assert_eq!(email.masked(), "b***@example.com");
    }
}
