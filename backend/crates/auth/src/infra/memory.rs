//! In-memory repository for tests and local wiring
//!
//! Enforces the same uniqueness rules as the PostgreSQL schema.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::id::{AdminId, BuyerId};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::entity::{AccessDenial, AdminAccount, AdminSession, Buyer, BuyerSession};
use crate::domain::repository::{
    AdminRepository, AdminSessionRepository, AuditRepository, BuyerRepository,
    BuyerSessionRepository,
};
use crate::domain::value_object::{AdminRole, Email};
use crate::error::{AuthError, AuthResult};

#[derive(Default)]
struct State {
    buyers: Vec<Buyer>,
    admins: Vec<AdminAccount>,
    buyer_sessions: Vec<BuyerSession>,
    admin_sessions: Vec<AdminSession>,
    denials: Vec<AccessDenial>,
}

#[derive(Clone, Default)]
pub struct MemoryAuthRepository {
    state: Arc<Mutex<State>>,
}

impl MemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded denial, oldest first
    pub async fn denials(&self) -> Vec<AccessDenial> {
        self.state.lock().await.denials.clone()
    }

    pub async fn set_buyer_active(&self, buyer_id: &BuyerId, active: bool) {
        let mut state = self.state.lock().await;
        if let Some(buyer) = state.buyers.iter_mut().find(|b| b.buyer_id == *buyer_id) {
            buyer.is_active = active;
        }
    }

    pub async fn set_admin_active(&self, admin_id: &AdminId, active: bool) {
        let mut state = self.state.lock().await;
        if let Some(admin) = state.admins.iter_mut().find(|a| a.admin_id == *admin_id) {
            admin.is_active = active;
        }
    }

    /// Move every session's expiry into the past
    pub async fn expire_all_sessions(&self) {
        let past = Utc::now() - chrono::Duration::seconds(1);
        let mut state = self.state.lock().await;
        for s in &mut state.buyer_sessions {
            s.expires_at = past;
        }
        for s in &mut state.admin_sessions {
            s.expires_at = past;
        }
    }

    pub async fn session_counts(&self) -> (usize, usize) {
        let state = self.state.lock().await;
        (state.buyer_sessions.len(), state.admin_sessions.len())
    }

    /// Stored buyer sessions, for asserting on what was persisted
    pub async fn buyer_sessions(&self) -> Vec<BuyerSession> {
        self.state.lock().await.buyer_sessions.clone()
    }
}

impl BuyerRepository for MemoryAuthRepository {
    async fn insert_buyer(&self, buyer: &Buyer) -> AuthResult<()> {
        let mut state = self.state.lock().await;
        let taken = state.buyers.iter().any(|b| {
            b.email == buyer.email || b.user_name.canonical() == buyer.user_name.canonical()
        });
        if taken {
            return Err(AuthError::DuplicateIdentity);
        }
        state.buyers.push(buyer.clone());
        Ok(())
    }

    async fn find_buyer_by_id(&self, buyer_id: &BuyerId) -> AuthResult<Option<Buyer>> {
        let state = self.state.lock().await;
        Ok(state.buyers.iter().find(|b| b.buyer_id == *buyer_id).cloned())
    }

    async fn find_buyer_by_email(&self, email: &Email) -> AuthResult<Option<Buyer>> {
        let state = self.state.lock().await;
        Ok(state.buyers.iter().find(|b| b.email == *email).cloned())
    }

    async fn buyer_identity_exists(
        &self,
        email: &Email,
        user_name_canonical: &str,
    ) -> AuthResult<bool> {
        let state = self.state.lock().await;
        Ok(state
            .buyers
            .iter()
            .any(|b| b.email == *email || b.user_name.canonical() == user_name_canonical))
    }

    async fn update_buyer_password_hash(&self, buyer_id: &BuyerId, phc: &str) -> AuthResult<()> {
        let hash = platform::password::HashedPassword::from_phc_string(phc)?;
        let mut state = self.state.lock().await;
        if let Some(buyer) = state.buyers.iter_mut().find(|b| b.buyer_id == *buyer_id) {
            buyer.password_hash = hash;
            buyer.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn record_buyer_login(&self, buyer_id: &BuyerId, at: DateTime<Utc>) -> AuthResult<()> {
        let mut state = self.state.lock().await;
        if let Some(buyer) = state.buyers.iter_mut().find(|b| b.buyer_id == *buyer_id) {
            buyer.last_login_at = Some(at);
        }
        Ok(())
    }
}

impl AdminRepository for MemoryAuthRepository {
    async fn insert_admin(&self, admin: &AdminAccount) -> AuthResult<()> {
        let mut state = self.state.lock().await;
        let taken = state.admins.iter().any(|a| {
            a.email == admin.email || a.user_name.canonical() == admin.user_name.canonical()
        });
        if taken {
            return Err(AuthError::DuplicateIdentity);
        }
        state.admins.push(admin.clone());
        Ok(())
    }

    async fn find_admin_by_id(&self, admin_id: &AdminId) -> AuthResult<Option<AdminAccount>> {
        let state = self.state.lock().await;
        Ok(state.admins.iter().find(|a| a.admin_id == *admin_id).cloned())
    }

    async fn find_admin_by_user_name(
        &self,
        user_name_canonical: &str,
    ) -> AuthResult<Option<AdminAccount>> {
        let state = self.state.lock().await;
        Ok(state
            .admins
            .iter()
            .find(|a| a.user_name.canonical() == user_name_canonical)
            .cloned())
    }

    async fn find_admin_by_email(&self, email: &Email) -> AuthResult<Option<AdminAccount>> {
        let state = self.state.lock().await;
        Ok(state.admins.iter().find(|a| a.email == *email).cloned())
    }

    async fn admin_identity_exists(
        &self,
        email: &Email,
        user_name_canonical: &str,
    ) -> AuthResult<bool> {
        let state = self.state.lock().await;
        Ok(state
            .admins
            .iter()
            .any(|a| a.email == *email || a.user_name.canonical() == user_name_canonical))
    }

    async fn update_admin_email(&self, admin_id: &AdminId, email: &Email) -> AuthResult<()> {
        let mut state = self.state.lock().await;
        if state
            .admins
            .iter()
            .any(|a| a.admin_id != *admin_id && a.email == *email)
        {
            return Err(AuthError::DuplicateIdentity);
        }
        if let Some(admin) = state.admins.iter_mut().find(|a| a.admin_id == *admin_id) {
            admin.email = email.clone();
            admin.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_admin_role(&self, admin_id: &AdminId, role: AdminRole) -> AuthResult<()> {
        let mut state = self.state.lock().await;
        if let Some(admin) = state.admins.iter_mut().find(|a| a.admin_id == *admin_id) {
            admin.role = role;
            admin.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_admin_password_hash(&self, admin_id: &AdminId, phc: &str) -> AuthResult<()> {
        let hash = platform::password::HashedPassword::from_phc_string(phc)?;
        let mut state = self.state.lock().await;
        if let Some(admin) = state.admins.iter_mut().find(|a| a.admin_id == *admin_id) {
            admin.password_hash = hash;
            admin.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn record_admin_login(&self, admin_id: &AdminId, at: DateTime<Utc>) -> AuthResult<()> {
        let mut state = self.state.lock().await;
        if let Some(admin) = state.admins.iter_mut().find(|a| a.admin_id == *admin_id) {
            admin.last_login_at = Some(at);
        }
        Ok(())
    }

    async fn count_admins(&self) -> AuthResult<i64> {
        Ok(self.state.lock().await.admins.len() as i64)
    }
}

impl BuyerSessionRepository for MemoryAuthRepository {
    async fn insert_buyer_session(&self, session: &BuyerSession) -> AuthResult<()> {
        self.state.lock().await.buyer_sessions.push(session.clone());
        Ok(())
    }

    async fn find_buyer_session(&self, token_digest: &[u8]) -> AuthResult<Option<BuyerSession>> {
        let state = self.state.lock().await;
        Ok(state
            .buyer_sessions
            .iter()
            .find(|s| s.token_digest == token_digest)
            .cloned())
    }

    async fn touch_buyer_session(
        &self,
        session_id: Uuid,
        last_activity_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<()> {
        let mut state = self.state.lock().await;
        if let Some(s) = state
            .buyer_sessions
            .iter_mut()
            .find(|s| s.session_id == session_id)
        {
            s.last_activity_at = last_activity_at;
            s.expires_at = expires_at;
        }
        Ok(())
    }

    async fn delete_buyer_session(&self, token_digest: &[u8]) -> AuthResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.buyer_sessions.len();
        state.buyer_sessions.retain(|s| s.token_digest != token_digest);
        Ok(state.buyer_sessions.len() < before)
    }

    async fn delete_buyer_sessions_for(&self, buyer_id: &BuyerId) -> AuthResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.buyer_sessions.len();
        state.buyer_sessions.retain(|s| s.buyer_id != *buyer_id);
        Ok((before - state.buyer_sessions.len()) as u64)
    }

    async fn delete_expired_buyer_sessions(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.buyer_sessions.len();
        state.buyer_sessions.retain(|s| !s.is_expired_at(now));
        Ok((before - state.buyer_sessions.len()) as u64)
    }
}

impl AdminSessionRepository for MemoryAuthRepository {
    async fn insert_admin_session(&self, session: &AdminSession) -> AuthResult<()> {
        self.state.lock().await.admin_sessions.push(session.clone());
        Ok(())
    }

    async fn find_admin_session(&self, token_digest: &[u8]) -> AuthResult<Option<AdminSession>> {
        let state = self.state.lock().await;
        Ok(state
            .admin_sessions
            .iter()
            .find(|s| s.token_digest == token_digest)
            .cloned())
    }

    async fn touch_admin_session(
        &self,
        session_id: Uuid,
        last_activity_at: DateTime<Utc>,
    ) -> AuthResult<()> {
        let mut state = self.state.lock().await;
        if let Some(s) = state
            .admin_sessions
            .iter_mut()
            .find(|s| s.session_id == session_id)
        {
            s.last_activity_at = last_activity_at;
        }
        Ok(())
    }

    async fn delete_admin_session(&self, token_digest: &[u8]) -> AuthResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.admin_sessions.len();
        state.admin_sessions.retain(|s| s.token_digest != token_digest);
        Ok(state.admin_sessions.len() < before)
    }

    async fn delete_admin_sessions_for(&self, admin_id: &AdminId) -> AuthResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.admin_sessions.len();
        state.admin_sessions.retain(|s| s.admin_id != *admin_id);
        Ok((before - state.admin_sessions.len()) as u64)
    }

    async fn delete_expired_admin_sessions(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.admin_sessions.len();
        state.admin_sessions.retain(|s| !s.is_expired_at(now));
        Ok((before - state.admin_sessions.len()) as u64)
    }
}

impl AuditRepository for MemoryAuthRepository {
    async fn record_denial(&self, denial: &AccessDenial) -> AuthResult<()> {
        self.state.lock().await.denials.push(denial.clone());
        Ok(())
    }

    async fn recent_denials(&self, limit: i64) -> AuthResult<Vec<AccessDenial>> {
        let state = self.state.lock().await;
        let limit = usize::try_from(limit.max(0)).unwrap_or(0);
        Ok(state.denials.iter().rev().take(limit).cloned().collect())
    }
}
