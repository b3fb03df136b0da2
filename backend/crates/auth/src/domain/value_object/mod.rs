//! Value Objects

pub mod admin_role;
pub mod email;
pub mod principal;
pub mod session_token;
pub mod user_name;

pub use admin_role::AdminRole;
pub use email::Email;
pub use principal::{AdminPrincipal, BuyerPrincipal, DenialReason, Principal, PrincipalKind};
pub use session_token::{SessionToken, TokenNamespace};
pub use user_name::{UserName, UserNameError};
