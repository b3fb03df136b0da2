//! Application Layer
//!
//! Use cases over the commerce repositories and external collaborators.

pub mod checkout;
pub mod config;
pub mod favorites;
pub mod fulfillment;
pub mod orders;
mod timeout;

use std::sync::Arc;

use crate::domain::{CommerceStore, PaymentGateway, ProfileStore};

pub use checkout::{CheckoutInput, CheckoutOrchestrator, CheckoutOutput};
pub use config::CommerceConfig;
pub use favorites::FavoritesLedger;
pub use fulfillment::FulfillmentService;
pub use orders::OrderHistory;

/// Commerce use cases, wired once at startup
pub struct CommerceServices<S, P, G>
where
    S: CommerceStore,
    P: ProfileStore + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    pub checkout: CheckoutOrchestrator<P, G>,
    pub fulfillment: FulfillmentService<S, P, G>,
    pub favorites: FavoritesLedger<S, P>,
    pub orders: OrderHistory<S>,
}

impl<S, P, G> Clone for CommerceServices<S, P, G>
where
    S: CommerceStore,
    P: ProfileStore + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            checkout: self.checkout.clone(),
            fulfillment: self.fulfillment.clone(),
            favorites: self.favorites.clone(),
            orders: self.orders.clone(),
        }
    }
}

impl<S, P, G> CommerceServices<S, P, G>
where
    S: CommerceStore,
    P: ProfileStore + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    pub fn new(repo: S, profiles: P, gateway: G, config: CommerceConfig) -> Self {
        let repo = Arc::new(repo);
        let profiles = Arc::new(profiles);
        let gateway = Arc::new(gateway);
        let config = Arc::new(config);

        Self {
            checkout: CheckoutOrchestrator::new(profiles.clone(), gateway.clone(), config.clone()),
            fulfillment: FulfillmentService::new(
                repo.clone(),
                profiles.clone(),
                gateway,
                config.clone(),
            ),
            favorites: FavoritesLedger::new(repo.clone(), profiles),
            orders: OrderHistory::new(repo, config),
        }
    }
}
