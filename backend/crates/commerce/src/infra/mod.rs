//! Infrastructure Layer
//!
//! PostgreSQL persistence, the Stripe gateway and in-memory doubles.

#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod postgres;
pub mod stripe;

#[cfg(any(test, feature = "test-util"))]
pub use memory::{FakeGateway, MemoryCommerceRepository, MemoryProfileStore};
pub use postgres::{PgCommerceRepository, PgProfileStore};
pub use stripe::{StripeConfig, StripeGateway};
