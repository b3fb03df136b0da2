//! Sign In Use Cases
//!
//! Buyer login (email + password) and admin login (user name or email +
//! password). Each issues a session in its own namespace only.

use platform::client::ClientContext;

use crate::application::credential_store::CredentialStore;
use crate::application::session_registry::{
    AdminSessionRegistry, BuyerSessionRegistry, IssuedSession,
};
use crate::domain::entity::{AdminAccount, Buyer};
use crate::domain::repository::AuthStore;
use crate::error::AuthResult;

/// Buyer sign in input
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

/// Buyer sign in output
pub struct SignInOutput {
    pub buyer: Buyer,
    pub session: IssuedSession,
}

/// Buyer sign in use case
pub struct SignInUseCase<R>
where
    R: AuthStore,
{
    credentials: CredentialStore<R>,
    sessions: BuyerSessionRegistry<R>,
}

impl<R> SignInUseCase<R>
where
    R: AuthStore,
{
    pub fn new(credentials: CredentialStore<R>, sessions: BuyerSessionRegistry<R>) -> Self {
        Self {
            credentials,
            sessions,
        }
    }

    pub async fn execute(
        &self,
        input: SignInInput,
        client: &ClientContext,
    ) -> AuthResult<SignInOutput> {
        let buyer = self
            .credentials
            .verify_buyer(&input.email, input.password)
            .await?;
        let session = self.sessions.issue(buyer.buyer_id, client).await?;

        tracing::info!(buyer_id = %buyer.buyer_id, "Buyer signed in");
        Ok(SignInOutput { buyer, session })
    }
}

/// Admin sign in input
pub struct AdminSignInInput {
    /// User name or email
    pub identifier: String,
    pub password: String,
}

/// Admin sign in output
pub struct AdminSignInOutput {
    pub admin: AdminAccount,
    pub session: IssuedSession,
}

/// Admin sign in use case
pub struct AdminSignInUseCase<R>
where
    R: AuthStore,
{
    credentials: CredentialStore<R>,
    sessions: AdminSessionRegistry<R>,
}

impl<R> AdminSignInUseCase<R>
where
    R: AuthStore,
{
    pub fn new(credentials: CredentialStore<R>, sessions: AdminSessionRegistry<R>) -> Self {
        Self {
            credentials,
            sessions,
        }
    }

    pub async fn execute(
        &self,
        input: AdminSignInInput,
        client: &ClientContext,
    ) -> AuthResult<AdminSignInOutput> {
        let admin = self
            .credentials
            .verify_admin(&input.identifier, input.password)
            .await?;
        let session = self
            .sessions
            .issue(admin.admin_id, admin.role, client)
            .await?;

        tracing::info!(
            admin_id = %admin.admin_id,
            role = %admin.role,
            source_ip = ?client.ip,
            "Admin signed in"
        );
        Ok(AdminSignInOutput { admin, session })
    }
}
