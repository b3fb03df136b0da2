//! Session Entities
//!
//! One struct per namespace. The raw token is never part of either; rows are
//! keyed by the namespaced token digest.

use chrono::{DateTime, Duration, Utc};
use kernel::id::{AdminId, BuyerId};
use uuid::Uuid;

use crate::domain::value_object::admin_role::AdminRole;

/// Buyer session (sliding expiry)
#[derive(Debug, Clone)]
pub struct BuyerSession {
    pub session_id: Uuid,
    pub token_digest: Vec<u8>,
    pub buyer_id: BuyerId,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl BuyerSession {
    pub fn new(
        token_digest: Vec<u8>,
        buyer_id: BuyerId,
        client_ip: Option<String>,
        user_agent: Option<String>,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4(),
            token_digest,
            buyer_id,
            client_ip,
            user_agent,
            created_at: now,
            expires_at: now + ttl,
            last_activity_at: now,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Record activity and push expiry out to `now + ttl`
    pub fn slide(&mut self, now: DateTime<Utc>, ttl: Duration) {
        self.last_activity_at = now;
        self.expires_at = now + ttl;
    }
}

/// Admin session (hard expiry, bound to the issuing IP)
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub session_id: Uuid,
    pub token_digest: Vec<u8>,
    pub admin_id: AdminId,
    /// Role at login; informational only, the guard re-reads the account
    pub role_at_issue: AdminRole,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl AdminSession {
    pub fn new(
        token_digest: Vec<u8>,
        admin_id: AdminId,
        role_at_issue: AdminRole,
        client_ip: Option<String>,
        user_agent: Option<String>,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4(),
            token_digest,
            admin_id,
            role_at_issue,
            client_ip,
            user_agent,
            created_at: now,
            expires_at: now + ttl,
            last_activity_at: now,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether a request from `ip` may use this session
    ///
    /// A session issued without a known IP cannot be bound and always
    /// matches; a request without a known IP never matches a bound session.
    pub fn ip_matches(&self, ip: Option<&str>) -> bool {
        match (&self.client_ip, ip) {
            (None, _) => true,
            (Some(bound), Some(seen)) => bound == seen,
            (Some(_), None) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buyer_session_slides() {
        let mut session = BuyerSession::new(vec![1], BuyerId::new(), None, None, Duration::days(7));
        let later = session.created_at + Duration::days(3);
        session.slide(later, Duration::days(7));
        assert_eq!(session.expires_at, later + Duration::days(7));
        assert_eq!(session.last_activity_at, later);
        assert!(!session.is_expired_at(later + Duration::days(6)));
        assert!(session.is_expired_at(later + Duration::days(7)));
    }

    #[test]
    fn test_admin_ip_binding() {
        let bound = AdminSession::new(
            vec![1],
            AdminId::new(),
            AdminRole::Admin,
            Some("10.0.0.1".into()),
            None,
            Duration::hours(8),
        );
        assert!(bound.ip_matches(Some("10.0.0.1")));
        assert!(!bound.ip_matches(Some("10.0.0.2")));
        assert!(!bound.ip_matches(None));

        let unbound = AdminSession {
            client_ip: None,
            ..bound
        };
        assert!(unbound.ip_matches(Some("192.0.2.1")));
    }
}
