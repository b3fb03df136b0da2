//! Sign Out Use Case
//!
//! Revokes the presented session. Idempotent: unknown or malformed tokens
//! are ignored so logout always succeeds.

use crate::application::session_registry::{AdminSessionRegistry, BuyerSessionRegistry};
use crate::domain::repository::AuthStore;
use crate::domain::value_object::SessionToken;
use crate::error::AuthResult;

/// Sign out use case
pub struct SignOutUseCase<R>
where
    R: AuthStore,
{
    buyer_sessions: BuyerSessionRegistry<R>,
    admin_sessions: AdminSessionRegistry<R>,
}

impl<R> SignOutUseCase<R>
where
    R: AuthStore,
{
    pub fn new(
        buyer_sessions: BuyerSessionRegistry<R>,
        admin_sessions: AdminSessionRegistry<R>,
    ) -> Self {
        Self {
            buyer_sessions,
            admin_sessions,
        }
    }

    /// Sign a buyer out of the current session
    pub async fn buyer(&self, raw_token: Option<&str>) -> AuthResult<()> {
        match raw_token.and_then(SessionToken::from_presented) {
            Some(token) => self.buyer_sessions.revoke(&token).await,
            None => Ok(()),
        }
    }

    /// Sign an admin out of the current session
    pub async fn admin(&self, raw_token: Option<&str>) -> AuthResult<()> {
        match raw_token.and_then(SessionToken::from_presented) {
            Some(token) => self.admin_sessions.revoke(&token).await,
            None => Ok(()),
        }
    }
}
