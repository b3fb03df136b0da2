//! Admin Account Management
//!
//! Self-service profile edit, super-admin account creation and role change,
//! environment bootstrap of the first super admin, and the audit view.

use std::sync::Arc;

use kernel::id::AdminId;

use crate::application::credential_store::CredentialStore;
use crate::application::session_registry::AdminSessionRegistry;
use crate::domain::entity::{AccessDenial, AdminAccount};
use crate::domain::repository::AuthStore;
use crate::domain::value_object::{AdminPrincipal, AdminRole, Email};
use crate::error::{AuthError, AuthResult};

/// Largest page the audit view returns
pub const MAX_DENIALS_PAGE: i64 = 500;

/// Input for creating a staff account
pub struct CreateAdminInput {
    pub user_name: String,
    pub email: String,
    pub password: String,
    pub role: AdminRole,
}

pub struct AdminAccountsUseCase<R>
where
    R: AuthStore,
{
    repo: Arc<R>,
    credentials: CredentialStore<R>,
    sessions: AdminSessionRegistry<R>,
}

impl<R> AdminAccountsUseCase<R>
where
    R: AuthStore,
{
    pub fn new(
        repo: Arc<R>,
        credentials: CredentialStore<R>,
        sessions: AdminSessionRegistry<R>,
    ) -> Self {
        Self {
            repo,
            credentials,
            sessions,
        }
    }

    pub async fn get(&self, admin_id: &AdminId) -> AuthResult<AdminAccount> {
        self.repo
            .find_admin_by_id(admin_id)
            .await?
            .ok_or(AuthError::AdminNotFound)
    }

    /// Self-service edit. Only the email can change here; role changes go
    /// through [`Self::change_role`].
    pub async fn update_own_email(
        &self,
        actor: &AdminPrincipal,
        email: &str,
    ) -> AuthResult<AdminAccount> {
        let email = Email::new(email)?;
        if email != actor.email {
            if let Some(other) = self.repo.find_admin_by_email(&email).await? {
                if other.admin_id != actor.admin_id {
                    return Err(AuthError::DuplicateIdentity);
                }
            }
            self.repo.update_admin_email(&actor.admin_id, &email).await?;
            tracing::info!(admin_id = %actor.admin_id, "Admin updated own email");
        }
        self.get(&actor.admin_id).await
    }

    /// Super-admin only (enforced by the guard)
    pub async fn create(
        &self,
        actor: &AdminPrincipal,
        input: CreateAdminInput,
    ) -> AuthResult<AdminAccount> {
        let admin = self
            .credentials
            .create_admin(&input.user_name, &input.email, input.password, input.role)
            .await?;
        tracing::info!(
            target: "audit",
            actor = %actor.admin_id,
            admin_id = %admin.admin_id,
            role = %admin.role,
            "Admin account created"
        );
        Ok(admin)
    }

    /// Super-admin only (enforced by the guard)
    ///
    /// The target's admin sessions are revoked so the new role applies from
    /// their next login.
    pub async fn change_role(
        &self,
        actor: &AdminPrincipal,
        target: &AdminId,
        role: AdminRole,
    ) -> AuthResult<AdminAccount> {
        if *target == actor.admin_id {
            return Err(AuthError::CannotChangeOwnRole);
        }

        let current = self.get(target).await?;
        if current.role != role {
            self.repo.update_admin_role(target, role).await?;
            self.sessions.revoke_all(target).await?;
            tracing::info!(
                target: "audit",
                actor = %actor.admin_id,
                admin_id = %target,
                from = %current.role,
                to = %role,
                "Admin role changed"
            );
        }
        self.get(target).await
    }

    /// Create the first super admin if no staff account exists yet
    ///
    /// Returns `None` when accounts already exist.
    pub async fn bootstrap_super_admin(
        &self,
        user_name: &str,
        email: &str,
        password: String,
    ) -> AuthResult<Option<AdminAccount>> {
        if self.repo.count_admins().await? > 0 {
            return Ok(None);
        }
        let admin = self
            .credentials
            .create_admin(user_name, email, password, AdminRole::SuperAdmin)
            .await?;
        tracing::info!(admin_id = %admin.admin_id, "Bootstrap super admin created");
        Ok(Some(admin))
    }

    /// Newest access denials, for the super-admin audit view
    pub async fn recent_denials(&self, limit: i64) -> AuthResult<Vec<AccessDenial>> {
        self.repo
            .recent_denials(limit.clamp(1, MAX_DENIALS_PAGE))
            .await
    }
}
