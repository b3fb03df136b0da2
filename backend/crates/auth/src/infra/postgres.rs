//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::{AccessDenialId, AdminId, BuyerId};
use platform::password::HashedPassword;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{AccessDenial, AdminAccount, AdminSession, Buyer, BuyerSession};
use crate::domain::repository::{
    AdminRepository, AdminSessionRepository, AuditRepository, BuyerRepository,
    BuyerSessionRepository,
};
use crate::domain::value_object::{
    AdminRole, DenialReason, Email, PrincipalKind, UserName,
};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map a unique-index violation to `DuplicateIdentity`
fn map_unique(err: sqlx::Error) -> AuthError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AuthError::DuplicateIdentity,
        _ => AuthError::Database(err),
    }
}

// ============================================================================
// Buyer Repository Implementation
// ============================================================================

const BUYER_COLUMNS: &str = r#"
    buyer_id,
    email,
    user_name,
    password_hash,
    is_active,
    created_at,
    updated_at,
    last_login_at
"#;

impl BuyerRepository for PgAuthRepository {
    async fn insert_buyer(&self, buyer: &Buyer) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO buyers (
                buyer_id,
                email,
                user_name,
                user_name_canonical,
                password_hash,
                is_active,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(buyer.buyer_id.as_uuid())
        .bind(buyer.email.as_str())
        .bind(buyer.user_name.original())
        .bind(buyer.user_name.canonical())
        .bind(buyer.password_hash.as_phc_string())
        .bind(buyer.is_active)
        .bind(buyer.created_at)
        .bind(buyer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_unique)?;

        Ok(())
    }

    async fn find_buyer_by_id(&self, buyer_id: &BuyerId) -> AuthResult<Option<Buyer>> {
        let row = sqlx::query_as::<_, BuyerRow>(&format!(
            "SELECT {BUYER_COLUMNS} FROM buyers WHERE buyer_id = $1"
        ))
        .bind(buyer_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(BuyerRow::into_buyer).transpose()
    }

    async fn find_buyer_by_email(&self, email: &Email) -> AuthResult<Option<Buyer>> {
        let row = sqlx::query_as::<_, BuyerRow>(&format!(
            "SELECT {BUYER_COLUMNS} FROM buyers WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(BuyerRow::into_buyer).transpose()
    }

    async fn buyer_identity_exists(
        &self,
        email: &Email,
        user_name_canonical: &str,
    ) -> AuthResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM buyers WHERE email = $1 OR user_name_canonical = $2)",
        )
        .bind(email.as_str())
        .bind(user_name_canonical)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn update_buyer_password_hash(&self, buyer_id: &BuyerId, phc: &str) -> AuthResult<()> {
        sqlx::query("UPDATE buyers SET password_hash = $2, updated_at = now() WHERE buyer_id = $1")
            .bind(buyer_id.as_uuid())
            .bind(phc)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn record_buyer_login(&self, buyer_id: &BuyerId, at: DateTime<Utc>) -> AuthResult<()> {
        sqlx::query("UPDATE buyers SET last_login_at = $2 WHERE buyer_id = $1")
            .bind(buyer_id.as_uuid())
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// ============================================================================
// Admin Repository Implementation
// ============================================================================

const ADMIN_COLUMNS: &str = r#"
    admin_id,
    user_name,
    email,
    password_hash,
    role,
    is_active,
    created_at,
    updated_at,
    last_login_at
"#;

impl AdminRepository for PgAuthRepository {
    async fn insert_admin(&self, admin: &AdminAccount) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO admin_accounts (
                admin_id,
                user_name,
                user_name_canonical,
                email,
                password_hash,
                role,
                is_active,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(admin.admin_id.as_uuid())
        .bind(admin.user_name.original())
        .bind(admin.user_name.canonical())
        .bind(admin.email.as_str())
        .bind(admin.password_hash.as_phc_string())
        .bind(admin.role.id())
        .bind(admin.is_active)
        .bind(admin.created_at)
        .bind(admin.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_unique)?;

        Ok(())
    }

    async fn find_admin_by_id(&self, admin_id: &AdminId) -> AuthResult<Option<AdminAccount>> {
        let row = sqlx::query_as::<_, AdminRow>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admin_accounts WHERE admin_id = $1"
        ))
        .bind(admin_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(AdminRow::into_admin).transpose()
    }

    async fn find_admin_by_user_name(
        &self,
        user_name_canonical: &str,
    ) -> AuthResult<Option<AdminAccount>> {
        let row = sqlx::query_as::<_, AdminRow>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admin_accounts WHERE user_name_canonical = $1"
        ))
        .bind(user_name_canonical)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AdminRow::into_admin).transpose()
    }

    async fn find_admin_by_email(&self, email: &Email) -> AuthResult<Option<AdminAccount>> {
        let row = sqlx::query_as::<_, AdminRow>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admin_accounts WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(AdminRow::into_admin).transpose()
    }

    async fn admin_identity_exists(
        &self,
        email: &Email,
        user_name_canonical: &str,
    ) -> AuthResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM admin_accounts WHERE email = $1 OR user_name_canonical = $2)",
        )
        .bind(email.as_str())
        .bind(user_name_canonical)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn update_admin_email(&self, admin_id: &AdminId, email: &Email) -> AuthResult<()> {
        sqlx::query("UPDATE admin_accounts SET email = $2, updated_at = now() WHERE admin_id = $1")
            .bind(admin_id.as_uuid())
            .bind(email.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_unique)?;
        Ok(())
    }

    async fn update_admin_role(&self, admin_id: &AdminId, role: AdminRole) -> AuthResult<()> {
        sqlx::query("UPDATE admin_accounts SET role = $2, updated_at = now() WHERE admin_id = $1")
            .bind(admin_id.as_uuid())
            .bind(role.id())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_admin_password_hash(&self, admin_id: &AdminId, phc: &str) -> AuthResult<()> {
        sqlx::query(
            "UPDATE admin_accounts SET password_hash = $2, updated_at = now() WHERE admin_id = $1",
        )
        .bind(admin_id.as_uuid())
        .bind(phc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn record_admin_login(&self, admin_id: &AdminId, at: DateTime<Utc>) -> AuthResult<()> {
        sqlx::query("UPDATE admin_accounts SET last_login_at = $2 WHERE admin_id = $1")
            .bind(admin_id.as_uuid())
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn count_admins(&self) -> AuthResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admin_accounts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// ============================================================================
// Buyer Session Repository Implementation
// ============================================================================

impl BuyerSessionRepository for PgAuthRepository {
    async fn insert_buyer_session(&self, session: &BuyerSession) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO buyer_sessions (
                session_id,
                token_digest,
                buyer_id,
                client_ip,
                user_agent,
                created_at,
                expires_at,
                last_activity_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(session.session_id)
        .bind(&session.token_digest)
        .bind(session.buyer_id.as_uuid())
        .bind(&session.client_ip)
        .bind(&session.user_agent)
        .bind(session.created_at)
        .bind(session.expires_at)
        .bind(session.last_activity_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_buyer_session(&self, token_digest: &[u8]) -> AuthResult<Option<BuyerSession>> {
        let row = sqlx::query_as::<_, BuyerSessionRow>(
            r#"
            SELECT
                session_id,
                token_digest,
                buyer_id,
                client_ip,
                user_agent,
                created_at,
                expires_at,
                last_activity_at
            FROM buyer_sessions
            WHERE token_digest = $1
            "#,
        )
        .bind(token_digest)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(BuyerSessionRow::into_session))
    }

    async fn touch_buyer_session(
        &self,
        session_id: Uuid,
        last_activity_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<()> {
        sqlx::query(
            "UPDATE buyer_sessions SET last_activity_at = $2, expires_at = $3 WHERE session_id = $1",
        )
        .bind(session_id)
        .bind(last_activity_at)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_buyer_session(&self, token_digest: &[u8]) -> AuthResult<bool> {
        let deleted = sqlx::query("DELETE FROM buyer_sessions WHERE token_digest = $1")
            .bind(token_digest)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }

    async fn delete_buyer_sessions_for(&self, buyer_id: &BuyerId) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM buyer_sessions WHERE buyer_id = $1")
            .bind(buyer_id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted)
    }

    async fn delete_expired_buyer_sessions(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM buyer_sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted)
    }
}

// ============================================================================
// Admin Session Repository Implementation
// ============================================================================

impl AdminSessionRepository for PgAuthRepository {
    async fn insert_admin_session(&self, session: &AdminSession) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO admin_sessions (
                session_id,
                token_digest,
                admin_id,
                role_at_issue,
                client_ip,
                user_agent,
                created_at,
                expires_at,
                last_activity_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(session.session_id)
        .bind(&session.token_digest)
        .bind(session.admin_id.as_uuid())
        .bind(session.role_at_issue.id())
        .bind(&session.client_ip)
        .bind(&session.user_agent)
        .bind(session.created_at)
        .bind(session.expires_at)
        .bind(session.last_activity_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_admin_session(&self, token_digest: &[u8]) -> AuthResult<Option<AdminSession>> {
        let row = sqlx::query_as::<_, AdminSessionRow>(
            r#"
            SELECT
                session_id,
                token_digest,
                admin_id,
                role_at_issue,
                client_ip,
                user_agent,
                created_at,
                expires_at,
                last_activity_at
            FROM admin_sessions
            WHERE token_digest = $1
            "#,
        )
        .bind(token_digest)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AdminSessionRow::into_session).transpose()
    }

    async fn touch_admin_session(
        &self,
        session_id: Uuid,
        last_activity_at: DateTime<Utc>,
    ) -> AuthResult<()> {
        sqlx::query("UPDATE admin_sessions SET last_activity_at = $2 WHERE session_id = $1")
            .bind(session_id)
            .bind(last_activity_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_admin_session(&self, token_digest: &[u8]) -> AuthResult<bool> {
        let deleted = sqlx::query("DELETE FROM admin_sessions WHERE token_digest = $1")
            .bind(token_digest)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }

    async fn delete_admin_sessions_for(&self, admin_id: &AdminId) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM admin_sessions WHERE admin_id = $1")
            .bind(admin_id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted)
    }

    async fn delete_expired_admin_sessions(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM admin_sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted)
    }
}

// ============================================================================
// Audit Repository Implementation
// ============================================================================

impl AuditRepository for PgAuthRepository {
    async fn record_denial(&self, denial: &AccessDenial) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO access_denials (
                denial_id,
                occurred_at,
                source_ip,
                user_agent,
                operation,
                reason,
                presented_kind,
                presented_principal_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(denial.denial_id.as_uuid())
        .bind(denial.occurred_at)
        .bind(&denial.source_ip)
        .bind(&denial.user_agent)
        .bind(&denial.operation)
        .bind(denial.reason.code())
        .bind(denial.presented_kind.map(|k| k.code()))
        .bind(denial.presented_principal_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent_denials(&self, limit: i64) -> AuthResult<Vec<AccessDenial>> {
        let rows = sqlx::query_as::<_, AccessDenialRow>(
            r#"
            SELECT
                denial_id,
                occurred_at,
                source_ip,
                user_agent,
                operation,
                reason,
                presented_kind,
                presented_principal_id
            FROM access_denials
            ORDER BY occurred_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AccessDenialRow::into_denial).collect()
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

fn parse_hash(phc: String) -> AuthResult<HashedPassword> {
    HashedPassword::from_phc_string(phc)
        .map_err(|e| AuthError::Internal(format!("Invalid password hash: {e}")))
}

#[derive(sqlx::FromRow)]
struct BuyerRow {
    buyer_id: Uuid,
    email: String,
    user_name: String,
    password_hash: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_login_at: Option<DateTime<Utc>>,
}

impl BuyerRow {
    fn into_buyer(self) -> AuthResult<Buyer> {
        Ok(Buyer {
            buyer_id: BuyerId::from_uuid(self.buyer_id),
            email: Email::from_db(self.email),
            user_name: UserName::from_db(&self.user_name),
            password_hash: parse_hash(self.password_hash)?,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
            last_login_at: self.last_login_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AdminRow {
    admin_id: Uuid,
    user_name: String,
    email: String,
    password_hash: String,
    role: i16,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_login_at: Option<DateTime<Utc>>,
}

impl AdminRow {
    fn into_admin(self) -> AuthResult<AdminAccount> {
        let role = AdminRole::from_id(self.role)
            .ok_or_else(|| AuthError::Internal(format!("Invalid admin role id: {}", self.role)))?;

        Ok(AdminAccount {
            admin_id: AdminId::from_uuid(self.admin_id),
            user_name: UserName::from_db(&self.user_name),
            email: Email::from_db(self.email),
            password_hash: parse_hash(self.password_hash)?,
            role,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
            last_login_at: self.last_login_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BuyerSessionRow {
    session_id: Uuid,
    token_digest: Vec<u8>,
    buyer_id: Uuid,
    client_ip: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
}

impl BuyerSessionRow {
    fn into_session(self) -> BuyerSession {
        BuyerSession {
            session_id: self.session_id,
            token_digest: self.token_digest,
            buyer_id: BuyerId::from_uuid(self.buyer_id),
            client_ip: self.client_ip,
            user_agent: self.user_agent,
            created_at: self.created_at,
            expires_at: self.expires_at,
            last_activity_at: self.last_activity_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AdminSessionRow {
    session_id: Uuid,
    token_digest: Vec<u8>,
    admin_id: Uuid,
    role_at_issue: i16,
    client_ip: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
}

impl AdminSessionRow {
    fn into_session(self) -> AuthResult<AdminSession> {
        let role_at_issue = AdminRole::from_id(self.role_at_issue).ok_or_else(|| {
            AuthError::Internal(format!("Invalid admin role id: {}", self.role_at_issue))
        })?;

        Ok(AdminSession {
            session_id: self.session_id,
            token_digest: self.token_digest,
            admin_id: AdminId::from_uuid(self.admin_id),
            role_at_issue,
            client_ip: self.client_ip,
            user_agent: self.user_agent,
            created_at: self.created_at,
            expires_at: self.expires_at,
            last_activity_at: self.last_activity_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AccessDenialRow {
    denial_id: Uuid,
    occurred_at: DateTime<Utc>,
    source_ip: Option<String>,
    user_agent: Option<String>,
    operation: String,
    reason: String,
    presented_kind: Option<String>,
    presented_principal_id: Option<Uuid>,
}

impl AccessDenialRow {
    fn into_denial(self) -> AuthResult<AccessDenial> {
        let reason = DenialReason::from_code(&self.reason)
            .ok_or_else(|| AuthError::Internal(format!("Invalid denial reason: {}", self.reason)))?;

        Ok(AccessDenial {
            denial_id: AccessDenialId::from_uuid(self.denial_id),
            occurred_at: self.occurred_at,
            source_ip: self.source_ip,
            user_agent: self.user_agent,
            operation: self.operation,
            reason,
            presented_kind: self.presented_kind.as_deref().and_then(PrincipalKind::from_code),
            presented_principal_id: self.presented_principal_id,
        })
    }
}
