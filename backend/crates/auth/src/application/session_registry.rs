//! Session Registries
//!
//! Two independent registries, one per token namespace. Each owns its own
//! repository trait and digest label, so a token issued by one can never
//! resolve in the other.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::id::{AdminId, BuyerId};
use platform::client::ClientContext;

use crate::application::config::AuthConfig;
use crate::domain::entity::{AdminSession, BuyerSession};
use crate::domain::repository::{AdminSessionRepository, BuyerSessionRepository};
use crate::domain::value_object::{AdminRole, SessionToken, TokenNamespace};
use crate::error::{AuthError, AuthResult};

/// Freshly issued session; the only place the raw token exists server-side
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: SessionToken,
    pub expires_at: DateTime<Utc>,
}

// ============================================================================
// Buyer
// ============================================================================

/// Buyer sessions: 7-day sliding TTL
pub struct BuyerSessionRegistry<S>
where
    S: BuyerSessionRepository,
{
    repo: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<S> Clone for BuyerSessionRegistry<S>
where
    S: BuyerSessionRepository,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S> BuyerSessionRegistry<S>
where
    S: BuyerSessionRepository,
{
    const NAMESPACE: TokenNamespace = TokenNamespace::Buyer;

    pub fn new(repo: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    fn digest(&self, token: &SessionToken) -> Vec<u8> {
        token.digest(&self.config.session_secret, Self::NAMESPACE)
    }

    pub async fn issue(
        &self,
        buyer_id: BuyerId,
        client: &ClientContext,
    ) -> AuthResult<IssuedSession> {
        let token = SessionToken::generate();
        let session = BuyerSession::new(
            self.digest(&token),
            buyer_id,
            client.ip_string(),
            client.user_agent.clone(),
            self.config.buyer_session_ttl_chrono(),
        );
        self.repo.insert_buyer_session(&session).await?;

        tracing::debug!(
            session_id = %session.session_id,
            buyer_id = %buyer_id,
            "Buyer session issued"
        );
        Ok(IssuedSession {
            token,
            expires_at: session.expires_at,
        })
    }

    /// Resolve and slide
    ///
    /// Expired sessions are deleted on sight.
    pub async fn resolve(&self, token: &SessionToken) -> AuthResult<BuyerSession> {
        let digest = self.digest(token);
        let mut session = self
            .repo
            .find_buyer_session(&digest)
            .await?
            .ok_or(AuthError::SessionInvalid)?;

        let now = Utc::now();
        if session.is_expired_at(now) {
            self.repo.delete_buyer_session(&digest).await?;
            return Err(AuthError::SessionExpired);
        }

        session.slide(now, self.config.buyer_session_ttl_chrono());
        self.repo
            .touch_buyer_session(session.session_id, session.last_activity_at, session.expires_at)
            .await?;
        Ok(session)
    }

    /// Read-only lookup: live session or `None`, no sliding, no deletes
    pub async fn peek(&self, token: &SessionToken) -> AuthResult<Option<BuyerSession>> {
        let session = self.repo.find_buyer_session(&self.digest(token)).await?;
        Ok(session.filter(|s| !s.is_expired_at(Utc::now())))
    }

    /// Idempotent
    pub async fn revoke(&self, token: &SessionToken) -> AuthResult<()> {
        if self.repo.delete_buyer_session(&self.digest(token)).await? {
            tracing::debug!("Buyer session revoked");
        }
        Ok(())
    }

    pub async fn revoke_all(&self, buyer_id: &BuyerId) -> AuthResult<u64> {
        self.repo.delete_buyer_sessions_for(buyer_id).await
    }

    pub async fn cleanup_expired(&self) -> AuthResult<u64> {
        self.repo.delete_expired_buyer_sessions(Utc::now()).await
    }
}

// ============================================================================
// Admin
// ============================================================================

/// Admin sessions: hard TTL, bound to the issuing IP
pub struct AdminSessionRegistry<S>
where
    S: AdminSessionRepository,
{
    repo: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<S> Clone for AdminSessionRegistry<S>
where
    S: AdminSessionRepository,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S> AdminSessionRegistry<S>
where
    S: AdminSessionRepository,
{
    const NAMESPACE: TokenNamespace = TokenNamespace::Admin;

    pub fn new(repo: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    fn digest(&self, token: &SessionToken) -> Vec<u8> {
        token.digest(&self.config.session_secret, Self::NAMESPACE)
    }

    pub async fn issue(
        &self,
        admin_id: AdminId,
        role: AdminRole,
        client: &ClientContext,
    ) -> AuthResult<IssuedSession> {
        let token = SessionToken::generate();
        let session = AdminSession::new(
            self.digest(&token),
            admin_id,
            role,
            client.ip_string(),
            client.user_agent.clone(),
            self.config.admin_session_ttl_chrono(),
        );
        self.repo.insert_admin_session(&session).await?;

        tracing::info!(
            session_id = %session.session_id,
            admin_id = %admin_id,
            role = %role,
            "Admin session issued"
        );
        Ok(IssuedSession {
            token,
            expires_at: session.expires_at,
        })
    }

    /// Resolve without extending; checks the bound IP
    ///
    /// An IP mismatch revokes the session before returning the error.
    pub async fn resolve(
        &self,
        token: &SessionToken,
        client: &ClientContext,
    ) -> AuthResult<AdminSession> {
        let digest = self.digest(token);
        let session = self
            .repo
            .find_admin_session(&digest)
            .await?
            .ok_or(AuthError::SessionInvalid)?;

        let now = Utc::now();
        if session.is_expired_at(now) {
            self.repo.delete_admin_session(&digest).await?;
            return Err(AuthError::SessionExpired);
        }

        let seen_ip = client.ip_string();
        if self.config.admin_ip_binding && !session.ip_matches(seen_ip.as_deref()) {
            self.repo.delete_admin_session(&digest).await?;
            tracing::warn!(
                session_id = %session.session_id,
                admin_id = %session.admin_id,
                bound_ip = ?session.client_ip,
                seen_ip = ?seen_ip,
                "Admin session IP mismatch, session revoked"
            );
            return Err(AuthError::SessionIpMismatch);
        }

        self.repo
            .touch_admin_session(session.session_id, now)
            .await?;
        Ok(session)
    }

    /// Read-only lookup: live session or `None`, no IP check, no deletes
    pub async fn peek(&self, token: &SessionToken) -> AuthResult<Option<AdminSession>> {
        let session = self.repo.find_admin_session(&self.digest(token)).await?;
        Ok(session.filter(|s| !s.is_expired_at(Utc::now())))
    }

    /// Idempotent
    pub async fn revoke(&self, token: &SessionToken) -> AuthResult<()> {
        if self.repo.delete_admin_session(&self.digest(token)).await? {
            tracing::info!("Admin session revoked");
        }
        Ok(())
    }

    pub async fn revoke_all(&self, admin_id: &AdminId) -> AuthResult<u64> {
        let deleted = self.repo.delete_admin_sessions_for(admin_id).await?;
        tracing::info!(admin_id = %admin_id, deleted, "Admin sessions revoked");
        Ok(deleted)
    }

    pub async fn cleanup_expired(&self) -> AuthResult<u64> {
        self.repo.delete_expired_admin_sessions(Utc::now()).await
    }
}
