//! Authentication Guard
//!
//! Resolves the credentials a request presents into exactly one principal,
//! or a rejection. Buyer-facing and admin-facing gates each resolve only in
//! their own namespace and probe the other one read-only, so a cross-role
//! token is recognized and refused instead of looking like "no session".
//!
//! Every rejection is logged on the `audit` target and appended to the
//! access-denial log.

use std::sync::Arc;

use platform::client::ClientContext;
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::application::session_registry::{AdminSessionRegistry, BuyerSessionRegistry};
use crate::domain::entity::AccessDenial;
use crate::domain::repository::AuthStore;
use crate::domain::value_object::{
    AdminPrincipal, AdminRole, BuyerPrincipal, DenialReason, Principal, PrincipalKind,
    SessionToken,
};
use crate::error::{AuthError, AuthResult};

/// What a request brought with it
#[derive(Debug, Clone, Default)]
pub struct PresentedCredentials {
    /// `Authorization: Bearer` value
    pub bearer: Option<String>,
    pub buyer_cookie: Option<String>,
    pub admin_cookie: Option<String>,
    pub client: ClientContext,
    /// `METHOD path`, for the audit log
    pub operation: String,
}

impl PresentedCredentials {
    fn bearer_token(&self) -> Option<SessionToken> {
        self.bearer.as_deref().and_then(SessionToken::from_presented)
    }

    fn buyer_token(&self) -> Option<SessionToken> {
        self.bearer_token().or_else(|| {
            self.buyer_cookie
                .as_deref()
                .and_then(SessionToken::from_presented)
        })
    }

    fn admin_token(&self) -> Option<SessionToken> {
        self.bearer_token().or_else(|| {
            self.admin_cookie
                .as_deref()
                .and_then(SessionToken::from_presented)
        })
    }
}

/// Guard outcome
#[derive(Debug, Clone)]
pub enum GuardDecision {
    Authenticated(Principal),
    /// No usable buyer credentials on an optional-auth operation
    Anonymous,
    Rejected(DenialReason),
}

pub struct AuthGuard<R>
where
    R: AuthStore,
{
    repo: Arc<R>,
    buyer_sessions: BuyerSessionRegistry<R>,
    admin_sessions: AdminSessionRegistry<R>,
    config: Arc<AuthConfig>,
}

impl<R> Clone for AuthGuard<R>
where
    R: AuthStore,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            buyer_sessions: self.buyer_sessions.clone(),
            admin_sessions: self.admin_sessions.clone(),
            config: self.config.clone(),
        }
    }
}

impl<R> AuthGuard<R>
where
    R: AuthStore,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self {
            buyer_sessions: BuyerSessionRegistry::new(repo.clone(), config.clone()),
            admin_sessions: AdminSessionRegistry::new(repo.clone(), config.clone()),
            repo,
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Buyer-only operations: anonymous and admin callers are refused
    pub async fn require_buyer(&self, creds: &PresentedCredentials) -> AuthResult<GuardDecision> {
        self.evaluate_buyer(creds, true).await
    }

    /// Optional auth: anonymous or buyer; admin tokens are still refused
    pub async fn optional_buyer(&self, creds: &PresentedCredentials) -> AuthResult<GuardDecision> {
        self.evaluate_buyer(creds, false).await
    }

    /// Admin operations gated at `required`
    ///
    /// Account status and role come from the account row on every call, so
    /// deactivation and demotion take effect on the next request.
    pub async fn require_admin(
        &self,
        creds: &PresentedCredentials,
        required: AdminRole,
    ) -> AuthResult<GuardDecision> {
        let Some(token) = creds.admin_token() else {
            if let Some((kind, id)) = self.presented_buyer(creds).await? {
                return self
                    .reject(creds, DenialReason::BuyerAccessDenied, Some((kind, id)))
                    .await;
            }
            return self
                .reject(creds, DenialReason::MissingCredentials, None)
                .await;
        };

        let session = match self.admin_sessions.resolve(&token, &creds.client).await {
            Ok(session) => session,
            Err(AuthError::SessionInvalid) => {
                // Not an admin token; maybe a buyer one sent to the wrong place
                if let Some(buyer) = self.buyer_sessions.peek(&token).await? {
                    let presented = (PrincipalKind::Buyer, buyer.buyer_id.into_uuid());
                    return self
                        .reject(creds, DenialReason::BuyerAccessDenied, Some(presented))
                        .await;
                }
                return self.reject(creds, DenialReason::InvalidSession, None).await;
            }
            Err(AuthError::SessionExpired) => {
                return self.reject(creds, DenialReason::InvalidSession, None).await;
            }
            Err(AuthError::SessionIpMismatch) => {
                return self
                    .reject(creds, DenialReason::SessionIpMismatch, None)
                    .await;
            }
            Err(e) => return Err(e),
        };

        let presented = (
            PrincipalKind::for_admin_role(session.role_at_issue),
            session.admin_id.into_uuid(),
        );

        let account = self.repo.find_admin_by_id(&session.admin_id).await?;
        let Some(account) = account.filter(|a| a.is_active) else {
            self.admin_sessions.revoke_all(&session.admin_id).await?;
            return self
                .reject(creds, DenialReason::AccountDisabled, Some(presented))
                .await;
        };

        if !account.role.satisfies(required) {
            let presented = (PrincipalKind::for_admin_role(account.role), presented.1);
            return self
                .reject(creds, DenialReason::InsufficientRole, Some(presented))
                .await;
        }

        Ok(GuardDecision::Authenticated(Principal::from_admin(
            AdminPrincipal {
                admin_id: account.admin_id,
                user_name: account.user_name.original().to_string(),
                email: account.email,
                role: account.role,
                session_expires_at: session.expires_at,
            },
        )))
    }

    async fn evaluate_buyer(
        &self,
        creds: &PresentedCredentials,
        required: bool,
    ) -> AuthResult<GuardDecision> {
        if let Some(presented) = self.presented_admin(creds).await? {
            return self
                .reject(creds, DenialReason::AdminAccessDenied, Some(presented))
                .await;
        }

        let Some(token) = creds.buyer_token() else {
            return if required {
                self.reject(creds, DenialReason::MissingCredentials, None)
                    .await
            } else {
                Ok(GuardDecision::Anonymous)
            };
        };

        let session = match self.buyer_sessions.resolve(&token).await {
            Ok(session) => session,
            Err(AuthError::SessionInvalid | AuthError::SessionExpired) => {
                return if required {
                    self.reject(creds, DenialReason::InvalidSession, None).await
                } else {
                    Ok(GuardDecision::Anonymous)
                };
            }
            Err(e) => return Err(e),
        };

        let buyer = self.repo.find_buyer_by_id(&session.buyer_id).await?;
        let Some(buyer) = buyer.filter(|b| b.is_active) else {
            self.buyer_sessions.revoke_all(&session.buyer_id).await?;
            let presented = (PrincipalKind::Buyer, session.buyer_id.into_uuid());
            return if required {
                self.reject(creds, DenialReason::AccountDisabled, Some(presented))
                    .await
            } else {
                Ok(GuardDecision::Anonymous)
            };
        };

        Ok(GuardDecision::Authenticated(Principal::Buyer(
            BuyerPrincipal {
                buyer_id: buyer.buyer_id,
                email: buyer.email,
                user_name: buyer.user_name.original().to_string(),
                session_expires_at: session.expires_at,
            },
        )))
    }

    /// Live admin session behind the bearer token or the admin cookie
    async fn presented_admin(
        &self,
        creds: &PresentedCredentials,
    ) -> AuthResult<Option<(PrincipalKind, Uuid)>> {
        for raw in [&creds.bearer, &creds.admin_cookie].into_iter().flatten() {
            let Some(token) = SessionToken::from_presented(raw) else {
                continue;
            };
            if let Some(session) = self.admin_sessions.peek(&token).await? {
                return Ok(Some((
                    PrincipalKind::for_admin_role(session.role_at_issue),
                    session.admin_id.into_uuid(),
                )));
            }
        }
        Ok(None)
    }

    /// Live buyer session behind the buyer cookie
    async fn presented_buyer(
        &self,
        creds: &PresentedCredentials,
    ) -> AuthResult<Option<(PrincipalKind, Uuid)>> {
        let Some(token) = creds
            .buyer_cookie
            .as_deref()
            .and_then(SessionToken::from_presented)
        else {
            return Ok(None);
        };
        Ok(self
            .buyer_sessions
            .peek(&token)
            .await?
            .map(|s| (PrincipalKind::Buyer, s.buyer_id.into_uuid())))
    }

    async fn reject(
        &self,
        creds: &PresentedCredentials,
        reason: DenialReason,
        presented: Option<(PrincipalKind, Uuid)>,
    ) -> AuthResult<GuardDecision> {
        tracing::warn!(
            target: "audit",
            operation = %creds.operation,
            reason = %reason,
            source_ip = ?creds.client.ip,
            presented_kind = ?presented.map(|(kind, _)| kind),
            presented_id = ?presented.map(|(_, id)| id),
            "Access denied"
        );

        let denial = AccessDenial::new(
            creds.client.ip_string(),
            creds.client.user_agent.clone(),
            creds.operation.clone(),
            reason,
            presented,
        );
        // The request is refused either way; a lost audit row must not turn
        // a 403 into a 500.
        if let Err(e) = self.repo.record_denial(&denial).await {
            tracing::error!(error = %e, "Failed to persist access denial");
        }

        Ok(GuardDecision::Rejected(reason))
    }
}
