//! Credential Records
//!
//! Buyers and staff are separate entities backed by separate tables. Neither
//! carries session state; sessions reference them by id.

use chrono::{DateTime, Utc};
use kernel::id::{AdminId, BuyerId};
use platform::password::HashedPassword;

use crate::domain::value_object::{admin_role::AdminRole, email::Email, user_name::UserName};

/// Buyer account
#[derive(Debug, Clone)]
pub struct Buyer {
    pub buyer_id: BuyerId,
    pub email: Email,
    pub user_name: UserName,
    pub password_hash: HashedPassword,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl Buyer {
    pub fn new(email: Email, user_name: UserName, password_hash: HashedPassword) -> Self {
        let now = Utc::now();
        Self {
            buyer_id: BuyerId::new(),
            email,
            user_name,
            password_hash,
            is_active: true,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }
}

/// Admin or super-admin account
///
/// `role` only changes through the super-admin role-change operation;
/// self-service edits touch `email` and nothing else.
#[derive(Debug, Clone)]
pub struct AdminAccount {
    pub admin_id: AdminId,
    pub user_name: UserName,
    pub email: Email,
    pub password_hash: HashedPassword,
    pub role: AdminRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl AdminAccount {
    pub fn new(
        user_name: UserName,
        email: Email,
        password_hash: HashedPassword,
        role: AdminRole,
    ) -> Self {
        let now = Utc::now();
        Self {
            admin_id: AdminId::new(),
            user_name,
            email,
            password_hash,
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }
}
