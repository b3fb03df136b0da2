//! Presentation Layer
//!
//! HTTP handlers, DTOs, routers, and middleware.

pub mod admin_handlers;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use middleware::{
    ClientInfo, optional_buyer, presented_credentials, require_admin, require_buyer,
    require_super_admin,
};
pub use router::{admin_router, auth_router};
