//! Fulfillment state machine
//!
//! `NoOrder -> OrderMaterializing -> OrderCompleted`. `OrderCompleted` is
//! terminal: entering it again for the same payment reference yields the
//! stored order, never a second one.

use chrono::{DateTime, Utc};
use kernel::id::{OrderId, OrderItemId};

use crate::domain::checkout::CheckoutMetadata;
use crate::domain::entity::{
    ContactSnapshot, FulfilledOrder, Order, OrderItem, OrderStatus, Profile,
};
use crate::domain::value_object::{Currency, PaymentReference, ProfileId};

#[derive(Debug, Clone)]
pub enum FulfillmentState {
    NoOrder,
    /// Built in memory, not yet committed
    OrderMaterializing(FulfilledOrder),
    OrderCompleted(FulfilledOrder),
}

/// Where item prices came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    /// Unit prices captured at checkout
    CheckoutMetadata,
    /// Charged total split evenly
    EvenSplit,
}

/// Per-item prices that always sum to `charged_total`
///
/// Checkout-time unit prices win when there is one per item, none is
/// negative and they add up to what the gateway charged. Otherwise the total
/// is split evenly and the remainder goes to the earliest items.
pub fn allocate_item_prices(
    unit_prices: &[i64],
    charged_total: i64,
    count: usize,
) -> (Vec<i64>, PriceSource) {
    if count == 0 {
        return (Vec::new(), PriceSource::EvenSplit);
    }

    let consistent = unit_prices.len() == count
        && unit_prices.iter().all(|p| *p >= 0)
        && unit_prices.iter().try_fold(0i64, |acc, p| acc.checked_add(*p)) == Some(charged_total);
    if consistent {
        return (unit_prices.to_vec(), PriceSource::CheckoutMetadata);
    }

    let n = count as i64;
    let base = charged_total.div_euclid(n);
    let remainder = charged_total.rem_euclid(n) as usize;
    let prices = (0..count)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect();
    (prices, PriceSource::EvenSplit)
}

/// Assemble the completed order for a succeeded payment
///
/// `profiles` is parallel to `metadata.profile_ids`; a `None` entry becomes
/// an item with an unavailable snapshot. The buyer paid for it, so it is
/// recorded rather than dropped.
pub fn materialize(
    reference: PaymentReference,
    metadata: &CheckoutMetadata,
    charged_total: i64,
    currency: Currency,
    profiles: &[Option<Profile>],
    now: DateTime<Utc>,
) -> (FulfilledOrder, PriceSource) {
    let order_id = OrderId::new();
    let (prices, source) =
        allocate_item_prices(&metadata.unit_prices, charged_total, metadata.profile_ids.len());

    let items = metadata
        .profile_ids
        .iter()
        .zip(prices)
        .enumerate()
        .map(|(i, (profile_id, price))| OrderItem {
            item_id: OrderItemId::new(),
            order_id,
            profile_id: *profile_id,
            price_at_purchase: price,
            contact_snapshot: snapshot_for(*profile_id, profiles.get(i).and_then(Option::as_ref), now),
        })
        .collect();

    let order = Order {
        order_id,
        payment_reference: reference,
        buyer_id: metadata.buyer_id,
        buyer_email: metadata.buyer_email.clone(),
        buyer_name: metadata.buyer_name.clone(),
        total_amount: charged_total,
        currency,
        status: OrderStatus::Completed,
        created_at: now,
    };

    (FulfilledOrder { order, items }, source)
}

fn snapshot_for(id: ProfileId, profile: Option<&Profile>, now: DateTime<Utc>) -> ContactSnapshot {
    match profile {
        Some(profile) => ContactSnapshot::capture(profile, now),
        None => ContactSnapshot::unavailable(id, now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::ContactMethod;

    #[test]
    fn test_unit_prices_used_when_consistent() {
        let (prices, source) = allocate_item_prices(&[500, 300], 800, 2);
        assert_eq!(prices, vec![500, 300]);
        assert_eq!(source, PriceSource::CheckoutMetadata);
    }

    #[test]
    fn test_even_split_when_inconsistent() {
        let (prices, source) = allocate_item_prices(&[500, 300], 1000, 2);
        assert_eq!(prices, vec![500, 500]);
        assert_eq!(source, PriceSource::EvenSplit);

        let (prices, _) = allocate_item_prices(&[], 1001, 3);
        assert_eq!(prices, vec![334, 334, 333]);
        assert_eq!(prices.iter().sum::<i64>(), 1001);
    }

    #[test]
    fn test_negative_unit_price_rejected() {
        let (prices, source) = allocate_item_prices(&[900, -100], 800, 2);
        assert_eq!(source, PriceSource::EvenSplit);
        assert_eq!(prices, vec![400, 400]);
    }

    #[test]
    fn test_materialize_marks_missing_profile_unavailable() {
        let metadata = CheckoutMetadata {
            buyer_email: "a@x.com".into(),
            buyer_name: None,
            buyer_id: None,
            profile_ids: vec![ProfileId::new(1), ProfileId::new(2)],
            unit_prices: vec![500, 300],
        };
        let present = Profile {
            id: ProfileId::new(1),
            display_name: "One".into(),
            price: 500,
            is_approved: true,
            contact_methods: vec![ContactMethod {
                kind: "email".into(),
                value: "one@example.com".into(),
            }],
        };

        let (fulfilled, _) = materialize(
            PaymentReference::new("pay_1").unwrap(),
            &metadata,
            800,
            Currency::default(),
            &[Some(present), None],
            Utc::now(),
        );

        assert_eq!(fulfilled.order.status, OrderStatus::Completed);
        assert_eq!(fulfilled.items.len(), 2);
        assert!(fulfilled.items[0].contact_snapshot.available);
        assert!(!fulfilled.items[1].contact_snapshot.available);
        assert!(fulfilled.items.iter().all(|i| i.order_id == fulfilled.order.order_id));
        assert_eq!(
            fulfilled.items.iter().map(|i| i.price_at_purchase).sum::<i64>(),
            fulfilled.order.total_amount
        );
    }
}
