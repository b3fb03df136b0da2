//! External collaborators: the catalog's profile store and the payment
//! gateway

use std::collections::HashMap;

use crate::domain::entity::{Profile, ProfileSummary};
use crate::domain::value_object::{Currency, PaymentReference, ProfileId};
use crate::error::CommerceResult;

/// Read access to catalog profiles
#[trait_variant::make(ProfileStore: Send)]
pub trait LocalProfileStore {
    /// Profile with its contact bundle, or `None` if absent
    async fn get_profile(&self, id: ProfileId) -> CommerceResult<Option<Profile>>;

    /// Public summaries for the given ids; absent ids are skipped
    async fn get_profile_summaries(&self, ids: &[ProfileId])
    -> CommerceResult<Vec<ProfileSummary>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub profile_id: ProfileId,
    pub name: String,
    /// Minor currency units
    pub amount: i64,
}

#[derive(Debug, Clone)]
pub struct CheckoutSessionRequest {
    pub amount: i64,
    pub currency: Currency,
    pub line_items: Vec<LineItem>,
    pub metadata: HashMap<String, String>,
    pub customer_email: String,
}

#[derive(Debug, Clone)]
pub struct CheckoutSession {
    /// Where the buyer completes payment
    pub redirect_handle: String,
    pub reference: PaymentReference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Succeeded,
    Failed,
    Pending,
}

#[derive(Debug, Clone)]
pub struct PaymentStatusReport {
    pub status: PaymentStatus,
    /// Minor currency units actually charged
    pub amount_total: i64,
    pub currency: Currency,
    pub metadata: HashMap<String, String>,
}

/// Hosted checkout provider
///
/// An unknown reference is reported as `Failed`, not as an error.
#[trait_variant::make(PaymentGateway: Send)]
pub trait LocalPaymentGateway {
    async fn create_session(&self, request: &CheckoutSessionRequest)
    -> CommerceResult<CheckoutSession>;

    async fn get_status(&self, reference: &PaymentReference) -> CommerceResult<PaymentStatusReport>;
}
