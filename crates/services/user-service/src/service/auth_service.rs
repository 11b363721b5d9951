//! Authentication lookups.
//!
//! SOLID (SRP): Builds principals for the authentication layer and verifies
//! login credentials. Session and token handling live elsewhere.

use async_trait::async_trait;
use std::sync::Arc;

use common::{AppError, AppResult};
use domain::{CredentialHasher, Principal, User};

use super::role_service::RoleResolver;
use super::user_service::UserService;

// Verified against when the login is unknown, so both paths cost one hash.
const DUMMY_PASSWORD: &str = "dummy-password-for-timing";

/// Principal lookup consumed by the authentication layer.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Load the principal for a login name.
    ///
    /// Fails with [`AppError::AuthLookup`] naming the username if absent.
    async fn load_principal_by_username(&self, username: &str) -> AppResult<Principal>;

    /// Load the principal for an email address.
    ///
    /// Fails with [`AppError::AuthLookup`] naming the email if absent.
    async fn load_principal_by_email(&self, email: &str) -> AppResult<Principal>;

    /// Verify login credentials. `login` is a username, or an email address
    /// when no user has that username.
    async fn authenticate(&self, login: &str, password: &str) -> AppResult<Principal>;
}

/// Concrete implementation of AuthService on top of the user directory.
pub struct Authenticator {
    users: Arc<dyn UserService>,
    roles: Arc<dyn RoleResolver>,
    hasher: Arc<dyn CredentialHasher>,
    dummy_hash: String,
}

impl Authenticator {
    pub fn new(
        users: Arc<dyn UserService>,
        roles: Arc<dyn RoleResolver>,
        hasher: Arc<dyn CredentialHasher>,
    ) -> Self {
        let dummy_hash = hasher.hash(DUMMY_PASSWORD).unwrap_or_default();
        Self {
            users,
            roles,
            hasher,
            dummy_hash,
        }
    }

    fn principal_for(&self, user: &User) -> Principal {
        Principal::new(
            user.username.clone(),
            user.password_hash.clone(),
            self.roles.to_authorities(&user.roles),
        )
    }

    async fn lookup(&self, login: &str) -> AppResult<Option<Principal>> {
        match self.load_principal_by_username(login).await {
            Ok(principal) => return Ok(Some(principal)),
            Err(AppError::AuthLookup(_)) => {}
            Err(e) => return Err(e),
        }

        if !login.contains('@') {
            return Ok(None);
        }

        match self.load_principal_by_email(login).await {
            Ok(principal) => Ok(Some(principal)),
            Err(AppError::AuthLookup(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl AuthService for Authenticator {
    async fn load_principal_by_username(&self, username: &str) -> AppResult<Principal> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::auth_lookup(format!("User '{}' not found", username)))?;

        Ok(self.principal_for(&user))
    }

    async fn load_principal_by_email(&self, email: &str) -> AppResult<Principal> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| {
                AppError::auth_lookup(format!("User with email '{}' not found", email))
            })?;

        Ok(self.principal_for(&user))
    }

    async fn authenticate(&self, login: &str, password: &str) -> AppResult<Principal> {
        let principal = self.lookup(login).await?;

        let hash = principal
            .as_ref()
            .map(|p| p.password_hash.as_str())
            .unwrap_or(self.dummy_hash.as_str());
        let password_valid = self.hasher.verify(password, hash);

        match principal {
            Some(principal) if password_valid => {
                tracing::info!(username = %principal.username, "Login succeeded");
                Ok(principal)
            }
            _ => {
                tracing::warn!(login = %login, "Login failed");
                Err(AppError::InvalidCredentials)
            }
        }
    }
}
