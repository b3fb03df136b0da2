//! In-memory commerce store, profile catalog and payment gateway
//!
//! Test doubles with the same uniqueness rules as the PostgreSQL schema.
//! Order inserts hold the lock for the whole write, so concurrent
//! confirmations of one reference serialize the way the unique index
//! makes them serialize in the database.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use kernel::id::BuyerId;
use tokio::sync::Mutex;

use crate::domain::entity::{ContactMethod, Favorite, FulfilledOrder, Profile, ProfileSummary, SortOrder};
use crate::domain::port::{
    CheckoutSession, CheckoutSessionRequest, PaymentGateway, PaymentStatus, PaymentStatusReport,
    ProfileStore,
};
use crate::domain::repository::{FavoriteRepository, InsertOutcome, OrderRepository};
use crate::domain::value_object::{PaymentReference, ProfileId};
use crate::error::{CommerceError, CommerceResult};

// ============================================================================
// Orders and favorites
// ============================================================================

#[derive(Default)]
struct StoreState {
    orders: Vec<FulfilledOrder>,
    favorites: Vec<Favorite>,
    insert_attempts: usize,
}

#[derive(Clone, Default)]
pub struct MemoryCommerceRepository {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryCommerceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }

    /// Orders stored under one reference; never more than one
    pub async fn orders_with_reference(&self, reference: &PaymentReference) -> usize {
        self.state
            .lock()
            .await
            .orders
            .iter()
            .filter(|o| o.order.payment_reference == *reference)
            .count()
    }

    /// Number of `insert_fulfilled_order` calls, winners and losers alike
    pub async fn insert_attempts(&self) -> usize {
        self.state.lock().await.insert_attempts
    }
}

impl OrderRepository for MemoryCommerceRepository {
    async fn find_order_by_reference(
        &self,
        reference: &PaymentReference,
    ) -> CommerceResult<Option<FulfilledOrder>> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .iter()
            .find(|o| o.order.payment_reference == *reference)
            .cloned())
    }

    async fn insert_fulfilled_order(
        &self,
        fulfilled: &FulfilledOrder,
    ) -> CommerceResult<InsertOutcome> {
        let mut state = self.state.lock().await;
        state.insert_attempts += 1;
        if state
            .orders
            .iter()
            .any(|o| o.order.payment_reference == fulfilled.order.payment_reference)
        {
            return Ok(InsertOutcome::AlreadyExists);
        }
        state.orders.push(fulfilled.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn list_orders_for_buyer(
        &self,
        buyer_id: &BuyerId,
        limit: i64,
    ) -> CommerceResult<Vec<FulfilledOrder>> {
        let state = self.state.lock().await;
        let mut orders: Vec<FulfilledOrder> = state
            .orders
            .iter()
            .filter(|o| o.order.buyer_id.as_ref() == Some(buyer_id))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.order.created_at.cmp(&a.order.created_at));
        orders.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(orders)
    }
}

impl FavoriteRepository for MemoryCommerceRepository {
    async fn upsert_favorite(&self, favorite: &Favorite) -> CommerceResult<Favorite> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state
            .favorites
            .iter()
            .find(|f| f.buyer_id == favorite.buyer_id && f.profile_id == favorite.profile_id)
        {
            return Ok(existing.clone());
        }
        state.favorites.push(favorite.clone());
        Ok(favorite.clone())
    }

    async fn delete_favorite(
        &self,
        buyer_id: &BuyerId,
        profile_id: ProfileId,
    ) -> CommerceResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.favorites.len();
        state
            .favorites
            .retain(|f| !(f.buyer_id == *buyer_id && f.profile_id == profile_id));
        Ok(state.favorites.len() != before)
    }

    async fn list_favorites(
        &self,
        buyer_id: &BuyerId,
        order: SortOrder,
    ) -> CommerceResult<Vec<Favorite>> {
        let state = self.state.lock().await;
        // Insertion order stands in for created_at ties
        let mut favorites: Vec<Favorite> = state
            .favorites
            .iter()
            .filter(|f| f.buyer_id == *buyer_id)
            .cloned()
            .collect();
        if order == SortOrder::Desc {
            favorites.reverse();
        }
        Ok(favorites)
    }
}

// ============================================================================
// Profile catalog
// ============================================================================

#[derive(Clone, Default)]
pub struct MemoryProfileStore {
    profiles: Arc<Mutex<HashMap<ProfileId, Profile>>>,
    unreachable: Arc<Mutex<bool>>,
    delay: Arc<Mutex<Option<Duration>>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, profile: Profile) {
        self.profiles.lock().await.insert(profile.id, profile);
    }

    /// Approved profile with one phone contact
    pub async fn put_approved(&self, id: i64, display_name: &str, price: i64) -> Profile {
        let profile = Profile {
            id: ProfileId::new(id),
            display_name: display_name.to_string(),
            price,
            is_approved: true,
            contact_methods: vec![ContactMethod {
                kind: "phone".into(),
                value: format!("+1-555-010-{id:04}"),
            }],
        };
        self.put(profile.clone()).await;
        profile
    }

    pub async fn set_contacts(&self, id: ProfileId, contact_methods: Vec<ContactMethod>) {
        if let Some(profile) = self.profiles.lock().await.get_mut(&id) {
            profile.contact_methods = contact_methods;
        }
    }

    pub async fn set_approved(&self, id: ProfileId, approved: bool) {
        if let Some(profile) = self.profiles.lock().await.get_mut(&id) {
            profile.is_approved = approved;
        }
    }

    pub async fn remove(&self, id: ProfileId) {
        self.profiles.lock().await.remove(&id);
    }

    /// Fail every read with `Upstream`
    pub async fn set_unreachable(&self, unreachable: bool) {
        *self.unreachable.lock().await = unreachable;
    }

    /// Sleep this long before answering any read
    pub async fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().await = delay;
    }

    async fn check_reachable(&self) -> CommerceResult<()> {
        let delay = *self.delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if *self.unreachable.lock().await {
            return Err(CommerceError::Upstream("profile store unreachable".into()));
        }
        Ok(())
    }
}

impl ProfileStore for MemoryProfileStore {
    async fn get_profile(&self, id: ProfileId) -> CommerceResult<Option<Profile>> {
        self.check_reachable().await?;
        Ok(self.profiles.lock().await.get(&id).cloned())
    }

    async fn get_profile_summaries(
        &self,
        ids: &[ProfileId],
    ) -> CommerceResult<Vec<ProfileSummary>> {
        self.check_reachable().await?;
        let profiles = self.profiles.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| profiles.get(id).map(Profile::summary))
            .collect())
    }
}

// ============================================================================
// Payment gateway
// ============================================================================

#[derive(Default)]
struct GatewayState {
    sessions: HashMap<PaymentReference, CheckoutSessionRequest>,
    statuses: HashMap<PaymentReference, PaymentStatus>,
    /// Overrides the amount the session reports as charged
    charged: HashMap<PaymentReference, i64>,
    delay: Option<Duration>,
    status_calls: usize,
}

/// Scripted gateway
///
/// Sessions start `Pending`; tests move them with [`FakeGateway::set_status`].
/// References look like `cs_test_N`.
#[derive(Clone, Default)]
pub struct FakeGateway {
    state: Arc<Mutex<GatewayState>>,
    counter: Arc<AtomicU64>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under a fixed reference, as if checkout had
    /// opened it
    pub async fn seed_session(
        &self,
        reference: &PaymentReference,
        request: CheckoutSessionRequest,
        status: PaymentStatus,
    ) {
        let mut state = self.state.lock().await;
        state.sessions.insert(reference.clone(), request);
        state.statuses.insert(reference.clone(), status);
    }

    pub async fn set_status(&self, reference: &PaymentReference, status: PaymentStatus) {
        self.state
            .lock()
            .await
            .statuses
            .insert(reference.clone(), status);
    }

    pub async fn set_charged_amount(&self, reference: &PaymentReference, amount: i64) {
        self.state
            .lock()
            .await
            .charged
            .insert(reference.clone(), amount);
    }

    /// Replace the metadata the session reports back
    pub async fn set_metadata(&self, reference: &PaymentReference, metadata: HashMap<String, String>) {
        if let Some(request) = self.state.lock().await.sessions.get_mut(reference) {
            request.metadata = metadata;
        }
    }

    /// Sleep this long before answering any call
    pub async fn set_delay(&self, delay: Option<Duration>) {
        self.state.lock().await.delay = delay;
    }

    pub async fn created_sessions(&self) -> usize {
        self.state.lock().await.sessions.len()
    }

    pub async fn session_request(&self, reference: &PaymentReference) -> Option<CheckoutSessionRequest> {
        self.state.lock().await.sessions.get(reference).cloned()
    }

    pub async fn status_calls(&self) -> usize {
        self.state.lock().await.status_calls
    }

    async fn pause(&self) {
        let delay = self.state.lock().await.delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl PaymentGateway for FakeGateway {
    async fn create_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> CommerceResult<CheckoutSession> {
        self.pause().await;
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let reference = PaymentReference::from_db(format!("cs_test_{n}"));

        let mut state = self.state.lock().await;
        state.sessions.insert(reference.clone(), request.clone());
        state.statuses.insert(reference.clone(), PaymentStatus::Pending);

        Ok(CheckoutSession {
            redirect_handle: format!("https://checkout.test/pay/{reference}"),
            reference,
        })
    }

    async fn get_status(&self, reference: &PaymentReference) -> CommerceResult<PaymentStatusReport> {
        self.pause().await;
        let mut state = self.state.lock().await;
        state.status_calls += 1;

        let Some(request) = state.sessions.get(reference) else {
            return Ok(PaymentStatusReport {
                status: PaymentStatus::Failed,
                amount_total: 0,
                currency: Default::default(),
                metadata: HashMap::new(),
            });
        };

        Ok(PaymentStatusReport {
            status: state
                .statuses
                .get(reference)
                .copied()
                .unwrap_or(PaymentStatus::Pending),
            amount_total: state
                .charged
                .get(reference)
                .copied()
                .unwrap_or(request.amount),
            currency: request.currency.clone(),
            metadata: request.metadata.clone(),
        })
    }
}
