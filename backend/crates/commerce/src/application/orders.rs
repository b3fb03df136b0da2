//! Order lookups: buyer history and admin support lookup

use std::sync::Arc;

use kernel::id::BuyerId;

use crate::application::config::CommerceConfig;
use crate::domain::CommerceStore;
use crate::domain::entity::FulfilledOrder;
use crate::domain::value_object::PaymentReference;
use crate::error::{CommerceError, CommerceResult};

pub struct OrderHistory<S>
where
    S: CommerceStore,
{
    repo: Arc<S>,
    config: Arc<CommerceConfig>,
}

impl<S> Clone for OrderHistory<S>
where
    S: CommerceStore,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S> OrderHistory<S>
where
    S: CommerceStore,
{
    pub fn new(repo: Arc<S>, config: Arc<CommerceConfig>) -> Self {
        Self { repo, config }
    }

    /// Orders checked out while signed in as this buyer, newest first
    ///
    /// Keyed on the account id only. Emails are unverified, so matching on
    /// them would hand one buyer's snapshots to whoever registers the same
    /// address.
    pub async fn for_buyer(&self, buyer_id: &BuyerId) -> CommerceResult<Vec<FulfilledOrder>> {
        self.repo
            .list_orders_for_buyer(buyer_id, self.config.order_history_limit)
            .await
    }

    pub async fn by_reference(&self, reference: &PaymentReference) -> CommerceResult<FulfilledOrder> {
        self.repo
            .find_order_by_reference(reference)
            .await?
            .ok_or(CommerceError::OrderNotFound)
    }
}
