//! Application Layer
//!
//! Use cases and application services.

pub mod admin_accounts;
pub mod config;
pub mod credential_store;
pub mod guard;
pub mod session_registry;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;

use std::sync::Arc;

use crate::domain::repository::AuthStore;
use crate::error::AuthResult;

// Re-exports
pub use admin_accounts::{AdminAccountsUseCase, CreateAdminInput};
pub use config::AuthConfig;
pub use credential_store::CredentialStore;
pub use guard::{AuthGuard, GuardDecision, PresentedCredentials};
pub use session_registry::{AdminSessionRegistry, BuyerSessionRegistry, IssuedSession};
pub use sign_in::{
    AdminSignInInput, AdminSignInOutput, AdminSignInUseCase, SignInInput, SignInOutput,
    SignInUseCase,
};
pub use sign_out::SignOutUseCase;
pub use sign_up::{SignUpInput, SignUpOutput, SignUpUseCase};

/// Everything the auth layer needs, wired once at startup
pub struct AuthServices<R>
where
    R: AuthStore,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
    pub credentials: CredentialStore<R>,
    pub buyer_sessions: BuyerSessionRegistry<R>,
    pub admin_sessions: AdminSessionRegistry<R>,
    pub guard: AuthGuard<R>,
}

impl<R> Clone for AuthServices<R>
where
    R: AuthStore,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            config: self.config.clone(),
            credentials: self.credentials.clone(),
            buyer_sessions: self.buyer_sessions.clone(),
            admin_sessions: self.admin_sessions.clone(),
            guard: self.guard.clone(),
        }
    }
}

impl<R> AuthServices<R>
where
    R: AuthStore,
{
    pub fn new(repo: R, config: AuthConfig) -> AuthResult<Self> {
        let repo = Arc::new(repo);
        let hasher = config.password_hasher()?;
        let config = Arc::new(config);

        Ok(Self {
            credentials: CredentialStore::new(repo.clone(), hasher),
            buyer_sessions: BuyerSessionRegistry::new(repo.clone(), config.clone()),
            admin_sessions: AdminSessionRegistry::new(repo.clone(), config.clone()),
            guard: AuthGuard::new(repo.clone(), config.clone()),
            repo,
            config,
        })
    }

    pub fn sign_up(&self) -> SignUpUseCase<R> {
        SignUpUseCase::new(self.credentials.clone(), self.buyer_sessions.clone())
    }

    pub fn sign_in(&self) -> SignInUseCase<R> {
        SignInUseCase::new(self.credentials.clone(), self.buyer_sessions.clone())
    }

    pub fn admin_sign_in(&self) -> AdminSignInUseCase<R> {
        AdminSignInUseCase::new(self.credentials.clone(), self.admin_sessions.clone())
    }

    pub fn sign_out(&self) -> SignOutUseCase<R> {
        SignOutUseCase::new(self.buyer_sessions.clone(), self.admin_sessions.clone())
    }

    pub fn admin_accounts(&self) -> AdminAccountsUseCase<R> {
        AdminAccountsUseCase::new(
            self.repo.clone(),
            self.credentials.clone(),
            self.admin_sessions.clone(),
        )
    }

    /// Delete expired sessions in both namespaces
    pub async fn cleanup_expired_sessions(&self) -> AuthResult<(u64, u64)> {
        let buyers = self.buyer_sessions.cleanup_expired().await?;
        let admins = self.admin_sessions.cleanup_expired().await?;
        tracing::info!(
            buyer_sessions_deleted = buyers,
            admin_sessions_deleted = admins,
            "Cleaned up expired sessions"
        );
        Ok((buyers, admins))
    }
}
