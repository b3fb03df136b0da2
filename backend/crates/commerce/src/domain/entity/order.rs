//! Orders and their contact-escrow items

use chrono::{DateTime, Utc};
use kernel::id::{BuyerId, OrderId, OrderItemId};
use serde::{Deserialize, Serialize};

use crate::domain::entity::profile::{ContactMethod, Profile};
use crate::domain::value_object::{Currency, PaymentReference, ProfileId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Completed,
    Failed,
}

impl OrderStatus {
    pub const fn code(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Failed => "failed",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "pending" => Some(OrderStatus::Pending),
            "completed" => Some(OrderStatus::Completed),
            "failed" => Some(OrderStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub order_id: OrderId,
    pub payment_reference: PaymentReference,
    /// Owning account; guest orders have none and never show up in any
    /// buyer's history
    pub buyer_id: Option<BuyerId>,
    pub buyer_email: String,
    pub buyer_name: Option<String>,
    /// Minor currency units, as charged by the gateway
    pub total_amount: i64,
    pub currency: Currency,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Point-in-time copy of a profile's contact data
///
/// Stored as JSON and never rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSnapshot {
    pub profile_id: ProfileId,
    pub display_name: Option<String>,
    pub contact_methods: Vec<ContactMethod>,
    pub captured_at: DateTime<Utc>,
    /// False when the profile was gone at fulfillment time
    pub available: bool,
}

impl ContactSnapshot {
    pub fn capture(profile: &Profile, at: DateTime<Utc>) -> Self {
        Self {
            profile_id: profile.id,
            display_name: Some(profile.display_name.clone()),
            contact_methods: profile.contact_methods.clone(),
            captured_at: at,
            available: true,
        }
    }

    pub fn unavailable(profile_id: ProfileId, at: DateTime<Utc>) -> Self {
        Self {
            profile_id,
            display_name: None,
            contact_methods: Vec::new(),
            captured_at: at,
            available: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub item_id: OrderItemId,
    pub order_id: OrderId,
    pub profile_id: ProfileId,
    pub price_at_purchase: i64,
    pub contact_snapshot: ContactSnapshot,
}

/// An order with all of its items, as returned by confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FulfilledOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_round_trip() {
        for status in [OrderStatus::Pending, OrderStatus::Completed, OrderStatus::Failed] {
            assert_eq!(OrderStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(OrderStatus::from_code("refunded"), None);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut profile = Profile {
            id: ProfileId::new(1),
            display_name: "Aki".into(),
            price: 500,
            is_approved: true,
            contact_methods: vec![ContactMethod {
                kind: "phone".into(),
                value: "+81-90-0000-0000".into(),
            }],
        };
        let snapshot = ContactSnapshot::capture(&profile, Utc::now());
        profile.contact_methods[0].value = "changed".into();
        assert_eq!(snapshot.contact_methods[0].value, "+81-90-0000-0000");
        assert!(snapshot.available);
    }
}
