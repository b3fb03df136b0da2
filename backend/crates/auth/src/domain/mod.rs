//! Domain Layer
//!
//! Contains entities, value objects, and repository traits.

pub mod entity;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{AccessDenial, AdminAccount, AdminSession, Buyer, BuyerSession};
pub use repository::{
    AdminRepository, AdminSessionRepository, AuditRepository, AuthStore, BuyerRepository,
    BuyerSessionRepository,
};
