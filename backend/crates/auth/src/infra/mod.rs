//! Infrastructure Layer
//!
//! Database implementations of the repository traits.

#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod postgres;

#[cfg(any(test, feature = "test-util"))]
pub use memory::MemoryAuthRepository;
pub use postgres::PgAuthRepository;
