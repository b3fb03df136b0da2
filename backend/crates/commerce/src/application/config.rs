//! Commerce configuration

use std::time::Duration;

use crate::domain::value_object::Currency;

#[derive(Debug, Clone)]
pub struct CommerceConfig {
    /// Currency every profile is priced in
    pub currency: Currency,
    /// Largest basket accepted at checkout (after de-duplication)
    pub max_basket_items: usize,
    /// Upper bound on each payment gateway call
    pub gateway_timeout: Duration,
    /// Upper bound on each profile store read during checkout and fulfillment
    pub profile_store_timeout: Duration,
    /// Page size for buyer order history
    pub order_history_limit: i64,
}

impl Default for CommerceConfig {
    fn default() -> Self {
        Self {
            currency: Currency::default(),
            max_basket_items: 20,
            gateway_timeout: Duration::from_secs(10),
            profile_store_timeout: Duration::from_secs(5),
            order_history_limit: 100,
        }
    }
}

impl CommerceConfig {
    /// Short upstream timeouts for tests
    pub fn testing() -> Self {
        Self {
            gateway_timeout: Duration::from_millis(200),
            profile_store_timeout: Duration::from_millis(200),
            ..Self::default()
        }
    }
}
