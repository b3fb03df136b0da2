//! Credential Store
//!
//! Creates and verifies buyer and admin credentials. Hashing happens on the
//! blocking pool. Never issues sessions.

use std::sync::Arc;

use chrono::Utc;
use platform::password::{ClearTextPassword, HashedPassword, PasswordHasher};

use crate::domain::entity::{AdminAccount, Buyer};
use crate::domain::repository::{AdminRepository, BuyerRepository};
use crate::domain::value_object::{AdminRole, Email, UserName};
use crate::error::{AuthError, AuthResult};

pub struct CredentialStore<R>
where
    R: BuyerRepository + AdminRepository,
{
    repo: Arc<R>,
    hasher: PasswordHasher,
}

impl<R> Clone for CredentialStore<R>
where
    R: BuyerRepository + AdminRepository,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            hasher: self.hasher.clone(),
        }
    }
}

impl<R> CredentialStore<R>
where
    R: BuyerRepository + AdminRepository,
{
    pub fn new(repo: Arc<R>, hasher: PasswordHasher) -> Self {
        Self { repo, hasher }
    }

    /// Register a buyer
    ///
    /// Identity is checked before hashing so a duplicate fails fast; the
    /// unique indexes catch the race between check and insert.
    pub async fn create_buyer(
        &self,
        email: &str,
        user_name: &str,
        raw_password: String,
    ) -> AuthResult<Buyer> {
        let email = Email::new(email)?;
        let user_name = UserName::new(user_name)?;
        let password = ClearTextPassword::new(raw_password)?;

        if self
            .repo
            .buyer_identity_exists(&email, user_name.canonical())
            .await?
        {
            return Err(AuthError::DuplicateIdentity);
        }

        let password_hash = self.hasher.hash_blocking(password).await?;
        let buyer = Buyer::new(email, user_name, password_hash);
        self.repo.insert_buyer(&buyer).await?;

        tracing::info!(
            buyer_id = %buyer.buyer_id,
            email = %buyer.email.masked(),
            "Buyer registered"
        );
        Ok(buyer)
    }

    /// Check a buyer's email and password
    ///
    /// Unknown email, malformed email and wrong password all cost one Argon2
    /// verification and all return `InvalidCredentials`.
    pub async fn verify_buyer(&self, email: &str, raw_password: String) -> AuthResult<Buyer> {
        let password = ClearTextPassword::for_verification(raw_password);
        let buyer = match Email::new(email) {
            Ok(email) => self.repo.find_buyer_by_email(&email).await?,
            Err(_) => None,
        };

        let hash = buyer.as_ref().map(|b| b.password_hash.clone());
        let (valid, password) = self.check(hash, password).await?;
        let Some(buyer) = buyer.filter(|_| valid) else {
            return Err(AuthError::InvalidCredentials);
        };

        if !buyer.is_active {
            return Err(AuthError::AccountDisabled);
        }

        if self.hasher.needs_rehash(&buyer.password_hash) {
            let rehashed = self.hasher.hash_blocking(password).await?;
            self.repo
                .update_buyer_password_hash(&buyer.buyer_id, rehashed.as_phc_string())
                .await?;
            tracing::info!(buyer_id = %buyer.buyer_id, "Buyer password rehashed");
        }
        self.repo
            .record_buyer_login(&buyer.buyer_id, Utc::now())
            .await?;

        Ok(buyer)
    }

    /// Create a staff account
    pub async fn create_admin(
        &self,
        user_name: &str,
        email: &str,
        raw_password: String,
        role: AdminRole,
    ) -> AuthResult<AdminAccount> {
        let user_name = UserName::new(user_name)?;
        let email = Email::new(email)?;
        let password = ClearTextPassword::new(raw_password)?;

        if self
            .repo
            .admin_identity_exists(&email, user_name.canonical())
            .await?
        {
            return Err(AuthError::DuplicateIdentity);
        }

        let password_hash = self.hasher.hash_blocking(password).await?;
        let admin = AdminAccount::new(user_name, email, password_hash, role);
        self.repo.insert_admin(&admin).await?;

        tracing::info!(
            admin_id = %admin.admin_id,
            role = %admin.role,
            "Admin account created"
        );
        Ok(admin)
    }

    /// Check an admin's user name (or email) and password
    pub async fn verify_admin(
        &self,
        identifier: &str,
        raw_password: String,
    ) -> AuthResult<AdminAccount> {
        let password = ClearTextPassword::for_verification(raw_password);
        let admin = if identifier.contains('@') {
            match Email::new(identifier) {
                Ok(email) => self.repo.find_admin_by_email(&email).await?,
                Err(_) => None,
            }
        } else {
            self.repo
                .find_admin_by_user_name(&UserName::canonicalize(identifier))
                .await?
        };

        let hash = admin.as_ref().map(|a| a.password_hash.clone());
        let (valid, password) = self.check(hash, password).await?;
        let Some(admin) = admin.filter(|_| valid) else {
            return Err(AuthError::InvalidCredentials);
        };

        if !admin.is_active {
            return Err(AuthError::AccountDisabled);
        }

        if self.hasher.needs_rehash(&admin.password_hash) {
            let rehashed = self.hasher.hash_blocking(password).await?;
            self.repo
                .update_admin_password_hash(&admin.admin_id, rehashed.as_phc_string())
                .await?;
            tracing::info!(admin_id = %admin.admin_id, "Admin password rehashed");
        }
        self.repo
            .record_admin_login(&admin.admin_id, Utc::now())
            .await?;

        Ok(admin)
    }

    async fn check(
        &self,
        hash: Option<HashedPassword>,
        password: ClearTextPassword,
    ) -> AuthResult<(bool, ClearTextPassword)> {
        Ok(self.hasher.verify_blocking(hash, password).await?)
    }
}
