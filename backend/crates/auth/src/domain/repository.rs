//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.
//!
//! Method names are unique across traits so one store type can implement all
//! of them without call-site ambiguity.

use chrono::{DateTime, Utc};
use kernel::id::{AdminId, BuyerId};
use uuid::Uuid;

use crate::domain::entity::{AccessDenial, AdminAccount, AdminSession, Buyer, BuyerSession};
use crate::domain::value_object::{admin_role::AdminRole, email::Email};
use crate::error::AuthResult;

/// Buyer credential records
#[trait_variant::make(BuyerRepository: Send)]
pub trait LocalBuyerRepository {
    /// Insert a buyer; `DuplicateIdentity` if email or user name is taken
    async fn insert_buyer(&self, buyer: &Buyer) -> AuthResult<()>;

    async fn find_buyer_by_id(&self, buyer_id: &BuyerId) -> AuthResult<Option<Buyer>>;

    async fn find_buyer_by_email(&self, email: &Email) -> AuthResult<Option<Buyer>>;

    /// Whether the email or canonical user name is already used by a buyer
    async fn buyer_identity_exists(&self, email: &Email, user_name_canonical: &str)
    -> AuthResult<bool>;

    async fn update_buyer_password_hash(&self, buyer_id: &BuyerId, phc: &str) -> AuthResult<()>;

    async fn record_buyer_login(&self, buyer_id: &BuyerId, at: DateTime<Utc>) -> AuthResult<()>;
}

/// Admin / super-admin credential records
#[trait_variant::make(AdminRepository: Send)]
pub trait LocalAdminRepository {
    /// Insert an admin; `DuplicateIdentity` if email or user name is taken
    async fn insert_admin(&self, admin: &AdminAccount) -> AuthResult<()>;

    async fn find_admin_by_id(&self, admin_id: &AdminId) -> AuthResult<Option<AdminAccount>>;

    async fn find_admin_by_user_name(
        &self,
        user_name_canonical: &str,
    ) -> AuthResult<Option<AdminAccount>>;

    async fn find_admin_by_email(&self, email: &Email) -> AuthResult<Option<AdminAccount>>;

    async fn admin_identity_exists(&self, email: &Email, user_name_canonical: &str)
    -> AuthResult<bool>;

    /// Self-service edit; never touches the role
    async fn update_admin_email(&self, admin_id: &AdminId, email: &Email) -> AuthResult<()>;

    async fn update_admin_role(&self, admin_id: &AdminId, role: AdminRole) -> AuthResult<()>;

    async fn update_admin_password_hash(&self, admin_id: &AdminId, phc: &str) -> AuthResult<()>;

    async fn record_admin_login(&self, admin_id: &AdminId, at: DateTime<Utc>) -> AuthResult<()>;

    async fn count_admins(&self) -> AuthResult<i64>;
}

/// Buyer session rows, keyed by namespaced token digest
#[trait_variant::make(BuyerSessionRepository: Send)]
pub trait LocalBuyerSessionRepository {
    async fn insert_buyer_session(&self, session: &BuyerSession) -> AuthResult<()>;

    async fn find_buyer_session(&self, token_digest: &[u8]) -> AuthResult<Option<BuyerSession>>;

    /// Persist a slid expiry
    async fn touch_buyer_session(
        &self,
        session_id: Uuid,
        last_activity_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<()>;

    /// Returns whether a row was deleted
    async fn delete_buyer_session(&self, token_digest: &[u8]) -> AuthResult<bool>;

    async fn delete_buyer_sessions_for(&self, buyer_id: &BuyerId) -> AuthResult<u64>;

    async fn delete_expired_buyer_sessions(&self, now: DateTime<Utc>) -> AuthResult<u64>;
}

/// Admin session rows, keyed by namespaced token digest
#[trait_variant::make(AdminSessionRepository: Send)]
pub trait LocalAdminSessionRepository {
    async fn insert_admin_session(&self, session: &AdminSession) -> AuthResult<()>;

    async fn find_admin_session(&self, token_digest: &[u8]) -> AuthResult<Option<AdminSession>>;

    async fn touch_admin_session(
        &self,
        session_id: Uuid,
        last_activity_at: DateTime<Utc>,
    ) -> AuthResult<()>;

    async fn delete_admin_session(&self, token_digest: &[u8]) -> AuthResult<bool>;

    async fn delete_admin_sessions_for(&self, admin_id: &AdminId) -> AuthResult<u64>;

    async fn delete_expired_admin_sessions(&self, now: DateTime<Utc>) -> AuthResult<u64>;
}

/// Append-only access-denial log
#[trait_variant::make(AuditRepository: Send)]
pub trait LocalAuditRepository {
    async fn record_denial(&self, denial: &AccessDenial) -> AuthResult<()>;

    /// Newest first
    async fn recent_denials(&self, limit: i64) -> AuthResult<Vec<AccessDenial>>;
}

/// Everything the auth layer persists, as one bound
pub trait AuthStore:
    BuyerRepository
    + AdminRepository
    + BuyerSessionRepository
    + AdminSessionRepository
    + AuditRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> AuthStore for T where
    T: BuyerRepository
        + AdminRepository
        + BuyerSessionRepository
        + AdminSessionRepository
        + AuditRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}
