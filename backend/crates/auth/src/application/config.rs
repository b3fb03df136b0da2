//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::time::Duration;

use platform::cookie::CookieConfig;
use platform::crypto::SecretKey;
use platform::password::{Argon2Config, PasswordHasher};

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Key for session-token digests (32 bytes)
    pub session_secret: SecretKey,
    /// Buyer session TTL, slid forward on every authenticated request
    pub buyer_session_ttl: Duration,
    /// Admin session TTL, never extended
    pub admin_session_ttl: Duration,
    /// Reject admin sessions presented from another IP
    pub admin_ip_binding: bool,
    pub buyer_cookie_name: String,
    pub admin_cookie_name: String,
    /// Path for the admin cookie, so browsers never attach it to buyer routes
    pub admin_cookie_path: String,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    /// Argon2id cost parameters
    pub argon2: Argon2Config,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_secret: SecretKey::generate(),
            buyer_session_ttl: Duration::from_secs(7 * 24 * 3600), // 1 week
            admin_session_ttl: Duration::from_secs(8 * 3600),      // 8 hours
            admin_ip_binding: true,
            buyer_cookie_name: "buyer_session".to_string(),
            admin_cookie_name: "admin_session".to_string(),
            admin_cookie_path: "/api/admin".to_string(),
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            argon2: Argon2Config::default(),
            password_pepper: None,
        }
    }
}

impl AuthConfig {
    /// Create config for development (insecure cookie, random secret)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::default()
        }
    }

    /// Cheap hashing and insecure cookies for tests
    pub fn testing() -> Self {
        Self {
            argon2: Argon2Config::insecure_fast(),
            ..Self::development()
        }
    }

    pub fn buyer_session_ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.buyer_session_ttl).unwrap_or(chrono::Duration::days(7))
    }

    pub fn admin_session_ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.admin_session_ttl).unwrap_or(chrono::Duration::hours(8))
    }

    pub fn buyer_cookie(&self) -> CookieConfig {
        CookieConfig {
            same_site: self.cookie_same_site,
            ..CookieConfig::session(
                &self.buyer_cookie_name,
                self.buyer_session_ttl.as_secs() as i64,
                self.cookie_secure,
            )
        }
    }

    pub fn admin_cookie(&self) -> CookieConfig {
        CookieConfig {
            same_site: SameSite::Strict,
            path: self.admin_cookie_path.clone(),
            ..CookieConfig::session(
                &self.admin_cookie_name,
                self.admin_session_ttl.as_secs() as i64,
                self.cookie_secure,
            )
        }
    }

    /// Build the password hasher (runs one hash to prepare the dummy)
    pub fn password_hasher(&self) -> Result<PasswordHasher, platform::password::PasswordHashError> {
        PasswordHasher::new(self.argon2, self.password_pepper.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.buyer_session_ttl_chrono(), chrono::Duration::days(7));
        assert_eq!(config.admin_session_ttl_chrono(), chrono::Duration::hours(8));
        assert!(config.admin_ip_binding);
        assert_eq!(config.argon2, Argon2Config::default());
    }

    #[test]
    fn test_admin_cookie_is_scoped() {
        let cookie = AuthConfig::development().admin_cookie();
        let header = cookie.build_set_cookie("t");
        assert!(header.contains("Path=/api/admin"));
        assert!(header.contains("SameSite=Strict"));
        assert!(!header.contains("Secure"));
    }
}
