//! Presentation Layer

pub mod dto;
pub mod handlers;
pub mod router;

pub use router::{admin_orders_router, commerce_router};
