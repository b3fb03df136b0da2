//! Checkout metadata carried through the payment gateway
//!
//! Checkout writes it into the gateway session; confirmation reads it back.
//! Values are flat strings so any gateway with key/value metadata can hold
//! them.

use std::collections::HashMap;

use kernel::id::BuyerId;

use crate::domain::value_object::ProfileId;
use crate::error::{CommerceError, CommerceResult};

pub const KEY_BUYER_EMAIL: &str = "buyerEmail";
pub const KEY_BUYER_NAME: &str = "buyerName";
pub const KEY_BUYER_ID: &str = "buyerId";
pub const KEY_PROFILE_IDS: &str = "profileIds";
pub const KEY_UNIT_PRICES: &str = "unitPrices";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutMetadata {
    pub buyer_email: String,
    pub buyer_name: Option<String>,
    /// Signed-in buyer who opened the checkout; `None` for guests
    pub buyer_id: Option<BuyerId>,
    pub profile_ids: Vec<ProfileId>,
    /// Authoritative unit prices at checkout, parallel to `profile_ids`
    pub unit_prices: Vec<i64>,
}

impl CheckoutMetadata {
    pub fn to_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert(KEY_BUYER_EMAIL.to_string(), self.buyer_email.clone());
        if let Some(name) = &self.buyer_name {
            map.insert(KEY_BUYER_NAME.to_string(), name.clone());
        }
        if let Some(buyer_id) = &self.buyer_id {
            map.insert(KEY_BUYER_ID.to_string(), buyer_id.to_string());
        }
        map.insert(KEY_PROFILE_IDS.to_string(), join(&self.profile_ids));
        map.insert(KEY_UNIT_PRICES.to_string(), join(&self.unit_prices));
        map
    }

    /// Parse what the gateway echoes back
    ///
    /// `profileIds` and `buyerEmail` are required. A present but malformed
    /// `buyerId` is an error, never a guest order. A malformed `unitPrices`
    /// is dropped rather than failing the confirmation; pricing then falls
    /// back to splitting the charged total.
    pub fn from_map(map: &HashMap<String, String>) -> CommerceResult<Self> {
        let buyer_email = map
            .get(KEY_BUYER_EMAIL)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| missing(KEY_BUYER_EMAIL))?
            .clone();

        let profile_ids = map
            .get(KEY_PROFILE_IDS)
            .ok_or_else(|| missing(KEY_PROFILE_IDS))?
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.parse::<ProfileId>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CommerceError::Internal(format!("Malformed profileIds metadata: {e}")))?;
        if profile_ids.is_empty() {
            return Err(missing(KEY_PROFILE_IDS));
        }

        let buyer_id = map
            .get(KEY_BUYER_ID)
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.trim().parse::<BuyerId>())
            .transpose()
            .map_err(|e| CommerceError::Internal(format!("Malformed buyerId metadata: {e}")))?;

        let unit_prices = map
            .get(KEY_UNIT_PRICES)
            .and_then(|raw| {
                raw.split(',')
                    .filter(|s| !s.trim().is_empty())
                    .map(|s| s.trim().parse::<i64>())
                    .collect::<Result<Vec<_>, _>>()
                    .ok()
            })
            .unwrap_or_default();

        Ok(Self {
            buyer_email,
            buyer_name: map.get(KEY_BUYER_NAME).filter(|v| !v.is_empty()).cloned(),
            buyer_id,
            profile_ids,
            unit_prices,
        })
    }
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn missing(key: &str) -> CommerceError {
    CommerceError::Internal(format!("Payment metadata is missing {key}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CheckoutMetadata {
        CheckoutMetadata {
            buyer_email: "a@x.com".into(),
            buyer_name: Some("A".into()),
            buyer_id: Some(BuyerId::new()),
            profile_ids: vec![ProfileId::new(1), ProfileId::new(2)],
            unit_prices: vec![500, 300],
        }
    }

    #[test]
    fn test_map_keys() {
        let map = sample().to_map();
        assert_eq!(map[KEY_PROFILE_IDS], "1,2");
        assert_eq!(map[KEY_UNIT_PRICES], "500,300");
        assert_eq!(CheckoutMetadata::from_map(&map).unwrap(), sample());
    }

    #[test]
    fn test_malformed_unit_prices_dropped() {
        let mut map = sample().to_map();
        map.insert(KEY_UNIT_PRICES.into(), "500,abc".into());
        let parsed = CheckoutMetadata::from_map(&map).unwrap();
        assert!(parsed.unit_prices.is_empty());
        assert_eq!(parsed.profile_ids.len(), 2);
    }

    #[test]
    fn test_buyer_id_optional_but_never_garbled() {
        let mut guest = sample();
        guest.buyer_id = None;
        let map = guest.to_map();
        assert!(!map.contains_key(KEY_BUYER_ID));
        assert_eq!(CheckoutMetadata::from_map(&map).unwrap().buyer_id, None);

        let mut map = sample().to_map();
        map.insert(KEY_BUYER_ID.into(), "not-a-uuid".into());
        assert!(matches!(
            CheckoutMetadata::from_map(&map),
            Err(CommerceError::Internal(_))
        ));
    }

    #[test]
    fn test_missing_profile_ids_is_an_error() {
        let mut map = sample().to_map();
        map.remove(KEY_PROFILE_IDS);
        assert!(CheckoutMetadata::from_map(&map).is_err());

        map.insert(KEY_PROFILE_IDS.into(), "".into());
        assert!(CheckoutMetadata::from_map(&map).is_err());
    }
}
