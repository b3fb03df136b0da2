//! Shared Kernel
//!
//! Vocabulary every bounded context agrees on:
//! - [`error::app_error::AppError`], the client-facing error every context
//!   renders into, and its RFC 7807 response
//! - Typed identifiers for buyers, admins and sessions

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
