//! Checkout Orchestrator
//!
//! Re-prices a cart against the profile store and opens a gateway session.
//! No order row exists until the payment is confirmed.

use std::collections::HashSet;
use std::sync::Arc;

use auth::domain::value_object::Email;
use kernel::id::BuyerId;

use crate::application::config::CommerceConfig;
use crate::application::timeout::bounded;
use crate::domain::checkout::CheckoutMetadata;
use crate::domain::port::{CheckoutSessionRequest, LineItem};
use crate::domain::value_object::{Currency, PaymentReference, ProfileId};
use crate::domain::{PaymentGateway, ProfileStore};
use crate::error::{CommerceError, CommerceResult};

const MAX_BUYER_NAME_LEN: usize = 100;

#[derive(Debug, Clone)]
pub struct CheckoutInput {
    /// Set when a signed-in buyer checks out; the order is linked to it
    pub buyer_id: Option<BuyerId>,
    pub buyer_email: String,
    pub buyer_name: Option<String>,
    pub profile_ids: Vec<ProfileId>,
    /// What the client thinks the total is; advisory only
    pub claimed_total: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct CheckoutOutput {
    pub redirect_handle: String,
    pub payment_reference: PaymentReference,
    pub total_amount: i64,
    pub currency: Currency,
}

pub struct CheckoutOrchestrator<P, G>
where
    P: ProfileStore + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    profiles: Arc<P>,
    gateway: Arc<G>,
    config: Arc<CommerceConfig>,
}

impl<P, G> Clone for CheckoutOrchestrator<P, G>
where
    P: ProfileStore + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            profiles: self.profiles.clone(),
            gateway: self.gateway.clone(),
            config: self.config.clone(),
        }
    }
}

impl<P, G> CheckoutOrchestrator<P, G>
where
    P: ProfileStore + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    pub fn new(profiles: Arc<P>, gateway: Arc<G>, config: Arc<CommerceConfig>) -> Self {
        Self {
            profiles,
            gateway,
            config,
        }
    }

    pub async fn open_checkout(&self, input: CheckoutInput) -> CommerceResult<CheckoutOutput> {
        let email = Email::new(input.buyer_email)?;
        let buyer_name = normalize_name(input.buyer_name)?;
        let profile_ids = dedup(input.profile_ids);

        if profile_ids.is_empty() {
            return Err(CommerceError::EmptyBasket);
        }
        if profile_ids.len() > self.config.max_basket_items {
            return Err(CommerceError::BasketTooLarge {
                max: self.config.max_basket_items,
            });
        }

        // Every profile must be live and approved; nothing reaches the
        // gateway otherwise.
        let mut line_items = Vec::with_capacity(profile_ids.len());
        for id in &profile_ids {
            let profile = bounded(
                self.config.profile_store_timeout,
                "read profile",
                self.profiles.get_profile(*id),
            )
            .await?
            .filter(|p| p.is_approved)
            .ok_or(CommerceError::ProfileUnavailable(*id))?;
            if profile.price < 0 {
                return Err(CommerceError::ProfileUnavailable(*id));
            }
            line_items.push(LineItem {
                profile_id: profile.id,
                name: profile.display_name,
                amount: profile.price,
            });
        }

        let total_amount = line_items
            .iter()
            .try_fold(0i64, |acc, item| acc.checked_add(item.amount))
            .ok_or_else(|| CommerceError::Validation("Basket total is out of range".into()))?;

        if let Some(claimed) = input.claimed_total {
            if claimed != total_amount {
                tracing::info!(
                    claimed_total = claimed,
                    total_amount,
                    "Client-claimed total differs from authoritative total; ignoring claim"
                );
            }
        }

        let metadata = CheckoutMetadata {
            buyer_email: email.as_str().to_string(),
            buyer_name,
            buyer_id: input.buyer_id,
            profile_ids: profile_ids.clone(),
            unit_prices: line_items.iter().map(|item| item.amount).collect(),
        };
        let request = CheckoutSessionRequest {
            amount: total_amount,
            currency: self.config.currency.clone(),
            line_items,
            metadata: metadata.to_map(),
            customer_email: email.as_str().to_string(),
        };

        let session = bounded(
            self.config.gateway_timeout,
            "create checkout session",
            self.gateway.create_session(&request),
        )
        .await?;

        tracing::info!(
            payment_reference = %session.reference,
            items = profile_ids.len(),
            total_amount,
            currency = %self.config.currency,
            "Checkout session opened"
        );

        Ok(CheckoutOutput {
            redirect_handle: session.redirect_handle,
            payment_reference: session.reference,
            total_amount,
            currency: self.config.currency.clone(),
        })
    }
}

/// Keep first occurrences, in order
fn dedup(ids: Vec<ProfileId>) -> Vec<ProfileId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

fn normalize_name(name: Option<String>) -> CommerceResult<Option<String>> {
    let Some(name) = name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };
    if name.chars().count() > MAX_BUYER_NAME_LEN {
        return Err(CommerceError::Validation(format!(
            "Buyer name must be at most {MAX_BUYER_NAME_LEN} characters"
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(CommerceError::Validation("Buyer name contains invalid characters".into()));
    }
    Ok(Some(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_keeps_first_order() {
        let ids = [3, 1, 3, 2, 1].map(ProfileId::new).to_vec();
        assert_eq!(dedup(ids), [3, 1, 2].map(ProfileId::new).to_vec());
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name(None).unwrap(), None);
        assert_eq!(normalize_name(Some("   ".into())).unwrap(), None);
        assert_eq!(normalize_name(Some(" Ann ".into())).unwrap(), Some("Ann".into()));
        assert!(normalize_name(Some("x".repeat(101))).is_err());
        assert!(normalize_name(Some("a\u{0007}b".into())).is_err());
    }
}
