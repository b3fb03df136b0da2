//! Commerce Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, the fulfillment state machine, ports
//! - `application/` - Checkout, fulfillment, favorites, order history
//! - `infra/` - PostgreSQL, Stripe, in-memory doubles
//! - `presentation/` - HTTP handlers, DTOs, routers
//!
//! ## Flow
//! 1. `POST /api/checkout` re-prices the basket and opens a gateway session
//! 2. The buyer pays on the gateway's hosted page
//! 3. `POST /api/checkout/confirm` materializes the order exactly once per
//!    payment reference, with a contact snapshot per purchased profile

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


pub use application::{CommerceConfig, CommerceServices};
pub use domain::{CommerceStore, PaymentGateway, ProfileStore};
pub use error::{CommerceError, CommerceResult};
pub use infra::{PgCommerceRepository, PgProfileStore, StripeConfig, StripeGateway};
pub use presentation::{admin_orders_router, commerce_router};

#[cfg(any(test, feature = "test-util"))]
pub use infra::{FakeGateway, MemoryCommerceRepository, MemoryProfileStore};
