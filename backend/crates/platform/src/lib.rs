//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (session tokens, keyed HMAC-SHA256 digests)
//! - Password hashing (Argon2id, NIST SP 800-63B compliant)
//! - Cookie and bearer-token extraction
//! - Client identification (source IP, User-Agent)

pub mod client;
pub mod cookie;
pub mod crypto;
pub mod password;
