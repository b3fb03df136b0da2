//! Domain Layer
//!
//! Entities, value objects, the fulfillment state machine and the traits
//! for persistence and external collaborators.

pub mod checkout;
pub mod entity;
pub mod fulfillment;
pub mod port;
pub mod repository;
pub mod value_object;

pub use port::{PaymentGateway, ProfileStore};
pub use repository::{CommerceStore, FavoriteRepository, InsertOutcome, OrderRepository};
