//! Repository Traits

use kernel::id::BuyerId;

use crate::domain::entity::{Favorite, FulfilledOrder, SortOrder};
use crate::domain::value_object::{PaymentReference, ProfileId};
use crate::error::CommerceResult;

/// Result of the atomic order write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// Another writer owns this payment reference; nothing was written
    AlreadyExists,
}

#[trait_variant::make(OrderRepository: Send)]
pub trait LocalOrderRepository {
    async fn find_order_by_reference(
        &self,
        reference: &PaymentReference,
    ) -> CommerceResult<Option<FulfilledOrder>>;

    /// Write the order and all of its items in one transaction, order first
    ///
    /// A conflict on the payment reference rolls back and reports
    /// `AlreadyExists`.
    async fn insert_fulfilled_order(&self, fulfilled: &FulfilledOrder)
    -> CommerceResult<InsertOutcome>;

    /// Orders owned by one buyer account, newest first
    async fn list_orders_for_buyer(
        &self,
        buyer_id: &BuyerId,
        limit: i64,
    ) -> CommerceResult<Vec<FulfilledOrder>>;
}

#[trait_variant::make(FavoriteRepository: Send)]
pub trait LocalFavoriteRepository {
    /// Insert unless `(buyer, profile)` exists; returns the stored row
    async fn upsert_favorite(&self, favorite: &Favorite) -> CommerceResult<Favorite>;

    /// Returns whether a row was deleted
    async fn delete_favorite(&self, buyer_id: &BuyerId, profile_id: ProfileId)
    -> CommerceResult<bool>;

    async fn list_favorites(&self, buyer_id: &BuyerId, order: SortOrder)
    -> CommerceResult<Vec<Favorite>>;
}

/// Everything commerce persists, as one bound
pub trait CommerceStore:
    OrderRepository + FavoriteRepository + Clone + Send + Sync + 'static
{
}

impl<T> CommerceStore for T where
    T: OrderRepository + FavoriteRepository + Clone + Send + Sync + 'static
{
}
