//! Payment confirmation
//!
//! Drives [`FulfillmentState`] for one payment reference. Safe to call any
//! number of times, concurrently included: the unique index on
//! `orders.payment_reference` decides the single writer and every other
//! caller reads the winner's order back.

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::CommerceConfig;
use crate::application::timeout::bounded;
use crate::domain::checkout::CheckoutMetadata;
use crate::domain::entity::FulfilledOrder;
use crate::domain::fulfillment::{FulfillmentState, PriceSource, materialize};
use crate::domain::port::PaymentStatus;
use crate::domain::value_object::PaymentReference;
use crate::domain::{CommerceStore, InsertOutcome, PaymentGateway, ProfileStore};
use crate::error::{CommerceError, CommerceResult};

pub struct FulfillmentService<S, P, G>
where
    S: CommerceStore,
    P: ProfileStore + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    repo: Arc<S>,
    profiles: Arc<P>,
    gateway: Arc<G>,
    config: Arc<CommerceConfig>,
}

impl<S, P, G> Clone for FulfillmentService<S, P, G>
where
    S: CommerceStore,
    P: ProfileStore + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            profiles: self.profiles.clone(),
            gateway: self.gateway.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S, P, G> FulfillmentService<S, P, G>
where
    S: CommerceStore,
    P: ProfileStore + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    pub fn new(
        repo: Arc<S>,
        profiles: Arc<P>,
        gateway: Arc<G>,
        config: Arc<CommerceConfig>,
    ) -> Self {
        Self {
            repo,
            profiles,
            gateway,
            config,
        }
    }

    /// Confirm on a detached task
    ///
    /// The task keeps running if the caller's future is dropped (client
    /// disconnect), so a succeeded payment always ends with an order.
    pub async fn confirm_detached(
        &self,
        reference: PaymentReference,
    ) -> CommerceResult<FulfilledOrder> {
        let service = self.clone();
        tokio::spawn(async move { service.confirm(&reference).await })
            .await
            .map_err(|e| CommerceError::Internal(format!("Confirmation task failed: {e}")))?
    }

    pub async fn confirm(&self, reference: &PaymentReference) -> CommerceResult<FulfilledOrder> {
        let report = bounded(
            self.config.gateway_timeout,
            "retrieve payment status",
            self.gateway.get_status(reference),
        )
        .await?;

        if report.status != PaymentStatus::Succeeded {
            return Err(CommerceError::PaymentNotSucceeded {
                reference: reference.clone(),
            });
        }

        let mut state = match self.repo.find_order_by_reference(reference).await? {
            Some(existing) => FulfillmentState::OrderCompleted(existing),
            None => FulfillmentState::NoOrder,
        };

        loop {
            state = match state {
                FulfillmentState::OrderCompleted(fulfilled) => return Ok(fulfilled),

                FulfillmentState::NoOrder => {
                    let metadata = CheckoutMetadata::from_map(&report.metadata)?;

                    // Contact bundles are read now, at fulfillment time
                    let mut profiles = Vec::with_capacity(metadata.profile_ids.len());
                    for id in &metadata.profile_ids {
                        let profile = bounded(
                            self.config.profile_store_timeout,
                            "read profile",
                            self.profiles.get_profile(*id),
                        )
                        .await?;
                        if profile.is_none() {
                            tracing::warn!(
                                payment_reference = %reference,
                                profile_id = %id,
                                "Purchased profile missing at fulfillment; recording unavailable snapshot"
                            );
                        }
                        profiles.push(profile);
                    }

                    let (fulfilled, source) = materialize(
                        reference.clone(),
                        &metadata,
                        report.amount_total,
                        report.currency.clone(),
                        &profiles,
                        Utc::now(),
                    );
                    if source == PriceSource::EvenSplit {
                        tracing::warn!(
                            payment_reference = %reference,
                            amount_total = report.amount_total,
                            "Checkout unit prices unusable; splitting charged total evenly"
                        );
                    }
                    FulfillmentState::OrderMaterializing(fulfilled)
                }

                FulfillmentState::OrderMaterializing(fulfilled) => {
                    match self.repo.insert_fulfilled_order(&fulfilled).await? {
                        InsertOutcome::Inserted => {
                            tracing::info!(
                                order_id = %fulfilled.order.order_id,
                                payment_reference = %reference,
                                items = fulfilled.items.len(),
                                total_amount = fulfilled.order.total_amount,
                                "Order fulfilled"
                            );
                            FulfillmentState::OrderCompleted(fulfilled)
                        }
                        InsertOutcome::AlreadyExists => {
                            tracing::debug!(
                                payment_reference = %reference,
                                "Lost confirmation race; reading winner's order"
                            );
                            let existing = self
                                .repo
                                .find_order_by_reference(reference)
                                .await?
                                .ok_or_else(|| {
                                    CommerceError::Internal(
                                        "Order conflict reported but no order found".into(),
                                    )
                                })?;
                            FulfillmentState::OrderCompleted(existing)
                        }
                    }
                }
            };
        }
    }
}
