//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::CheckoutOutput;
use crate::domain::entity::{
    ContactSnapshot, FavoriteEntry, FulfilledOrder, OrderItem, OrderStatus, ProfileSummary,
};
use crate::domain::value_object::ProfileId;

// ============================================================================
// Checkout
// ============================================================================

/// Checkout request
///
/// `buyerEmail` may be omitted by a signed-in buyer; the account email is
/// used instead.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub buyer_email: Option<String>,
    #[serde(default)]
    pub buyer_name: Option<String>,
    pub profile_ids: Vec<ProfileId>,
    /// Client-side total; never trusted
    #[serde(default, alias = "total")]
    pub total_amount: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub redirect_handle: String,
    pub payment_reference: String,
    pub total_amount: i64,
    pub currency: String,
}

impl From<CheckoutOutput> for CheckoutResponse {
    fn from(output: CheckoutOutput) -> Self {
        Self {
            redirect_handle: output.redirect_handle,
            payment_reference: output.payment_reference.as_str().to_string(),
            total_amount: output.total_amount,
            currency: output.currency.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    #[serde(alias = "sessionId")]
    pub payment_reference: String,
}

// ============================================================================
// Orders
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: Uuid,
    pub payment_reference: String,
    pub buyer_email: String,
    pub buyer_name: Option<String>,
    pub total_amount: i64,
    pub currency: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub item_id: Uuid,
    pub profile_id: ProfileId,
    pub price_at_purchase: i64,
    pub contact_snapshot: ContactSnapshot,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            item_id: item.item_id.into_uuid(),
            profile_id: item.profile_id,
            price_at_purchase: item.price_at_purchase,
            contact_snapshot: item.contact_snapshot,
        }
    }
}

/// `{order, items[]}`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfilledOrderResponse {
    pub order: OrderResponse,
    pub items: Vec<OrderItemResponse>,
}

impl From<FulfilledOrder> for FulfilledOrderResponse {
    fn from(fulfilled: FulfilledOrder) -> Self {
        let order = fulfilled.order;
        Self {
            order: OrderResponse {
                order_id: order.order_id.into_uuid(),
                payment_reference: order.payment_reference.as_str().to_string(),
                buyer_email: order.buyer_email,
                buyer_name: order.buyer_name,
                total_amount: order.total_amount,
                currency: order.currency.as_str().to_string(),
                status: order.status,
                created_at: order.created_at,
            },
            items: fulfilled.items.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListResponse {
    pub orders: Vec<FulfilledOrderResponse>,
}

// ============================================================================
// Favorites
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FavoritesQuery {
    /// `asc` or `desc` (default)
    pub order: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteResponse {
    pub favorite_id: Uuid,
    pub profile_id: ProfileId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEntryResponse {
    pub favorite_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub profile: ProfileSummary,
}

impl From<FavoriteEntry> for FavoriteEntryResponse {
    fn from(entry: FavoriteEntry) -> Self {
        Self {
            favorite_id: entry.favorite.favorite_id.into_uuid(),
            created_at: entry.favorite.created_at,
            profile: entry.profile,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteListResponse {
    pub favorites: Vec<FavoriteEntryResponse>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRemovedResponse {
    pub removed: bool,
}
