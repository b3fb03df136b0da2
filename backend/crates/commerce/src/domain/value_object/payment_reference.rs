//! Payment gateway reference (e.g. a Stripe Checkout Session id)

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CommerceError, CommerceResult};

const MAX_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentReference(String);

impl PaymentReference {
    /// ASCII letters, digits and `_`, at most 255 bytes
    ///
    /// Gateway session ids (`cs_live_...`, `cs_test_...`) fit this shape.
    /// The reference becomes a URL path segment on status lookups, so
    /// separators such as `/`, `.`, `?` and `#` are refused.
    pub fn new(raw: impl Into<String>) -> CommerceResult<Self> {
        let raw = raw.into();
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(CommerceError::Validation(
                "Payment reference cannot be empty".into(),
            ));
        }
        if raw.len() > MAX_LEN || !raw.bytes().all(is_reference_byte) {
            return Err(CommerceError::Validation("Invalid payment reference".into()));
        }
        Ok(Self(raw.to_string()))
    }

    /// Whether the value is safe to place in a URL path segment
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty() && self.0.len() <= MAX_LEN && self.0.bytes().all(is_reference_byte)
    }

    /// From a trusted source (database, gateway response)
    pub fn from_db(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_reference_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

impl fmt::Display for PaymentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_reference() {
        let r = PaymentReference::new("  cs_test_a1B2c3 ").unwrap();
        assert_eq!(r.as_str(), "cs_test_a1B2c3");
    }

    #[test]
    fn test_invalid_reference() {
        assert!(PaymentReference::new("").is_err());
        assert!(PaymentReference::new("pay 123").is_err());
        assert!(PaymentReference::new("x".repeat(256)).is_err());
        assert!(PaymentReference::new("päy").is_err());
    }

    #[test]
    fn test_url_syntax_refused() {
        for raw in [
            "../../v1/customers?limit=1#",
            "cs_test_1/expire",
            "cs_test_1?expand=customer",
            "cs_test_1#frag",
            "..",
            "cs-test-1",
            "cs%2Ftest",
        ] {
            assert!(PaymentReference::new(raw).is_err(), "{raw}");
        }
        assert!(PaymentReference::new("cs_live_a1B2c3D4e5").is_ok());
    }

    #[test]
    fn test_trusted_values_can_be_checked() {
        assert!(PaymentReference::from_db("cs_test_1").is_well_formed());
        assert!(!PaymentReference::from_db("cs_test_1/../x").is_well_formed());
    }
}
