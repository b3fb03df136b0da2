//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Business logic, entities, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - Database implementations
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Features
//! - Buyer registration/login by email + password
//! - Admin / super-admin login by user name or email
//! - Server-side sessions in two disjoint namespaces (buyer, admin)
//! - Route gates that keep buyer and admin principals apart, with an
//!   access-denial audit log
//!
//! ## Security Model
//! - Passwords hashed with Argon2id (NIST SP 800-63B compliant)
//! - Only namespaced HMAC digests of session tokens are stored
//! - Buyer sessions slide (7 days); admin sessions are short, fixed and
//!   bound to the issuing IP
//! - Admin status and role are re-read on every admin request

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::AuthServices;
pub use application::config::AuthConfig;
pub use domain::repository::AuthStore;
pub use domain::value_object::{AdminPrincipal, BuyerPrincipal, Principal};
pub use error::{AuthError, AuthResult};
pub use infra::postgres::PgAuthRepository;
pub use presentation::router::{admin_router, auth_router};

#[cfg(any(test, feature = "test-util"))]
pub use infra::memory::MemoryAuthRepository;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
