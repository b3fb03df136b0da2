//! Sign Up Use Case
//!
//! Registers a buyer and opens their first session.

use platform::client::ClientContext;

use crate::application::credential_store::CredentialStore;
use crate::application::session_registry::{BuyerSessionRegistry, IssuedSession};
use crate::domain::entity::Buyer;
use crate::domain::repository::AuthStore;
use crate::error::AuthResult;

/// Sign up input
pub struct SignUpInput {
    pub email: String,
    pub user_name: String,
    pub password: String,
}

/// Sign up output
pub struct SignUpOutput {
    pub buyer: Buyer,
    pub session: IssuedSession,
}

/// Sign up use case
pub struct SignUpUseCase<R>
where
    R: AuthStore,
{
    credentials: CredentialStore<R>,
    sessions: BuyerSessionRegistry<R>,
}

impl<R> SignUpUseCase<R>
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
        input: SignUpInput,
        client: &ClientContext,
    ) -> AuthResult<SignUpOutput> {
        let buyer = self
            .credentials
            .create_buyer(&input.email, &input.user_name, input.password)
            .await?;
        let session = self.sessions.issue(buyer.buyer_id, client).await?;

        Ok(SignUpOutput { buyer, session })
    }
}
