//! Domain Entities

pub mod access_denial;
pub mod account;
pub mod session;

pub use access_denial::AccessDenial;
pub use account::{AdminAccount, Buyer};
pub use session::{AdminSession, BuyerSession};
