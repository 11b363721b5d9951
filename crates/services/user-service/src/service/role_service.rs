//! Role resolution.
//!
//! Maps authority names to role entities and roles to the authority tokens
//! consumed by the authentication layer.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;

use common::AppResult;
use domain::{Authority, Role};

use crate::repository::RoleRepository;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait RoleResolver: Send + Sync {
    /// Look up a role by authority name. `None` when no such role exists.
    async fn resolve_by_authority(&self, authority: &str) -> AppResult<Option<Role>>;

    /// Authority tokens granted by `roles`
    fn to_authorities(&self, roles: &BTreeSet<Role>) -> BTreeSet<Authority>;

    /// All known roles, ordered by authority
    async fn list_roles(&self) -> AppResult<Vec<Role>>;
}

/// Repository-backed role resolver
pub struct RoleManager {
    repo: Arc<dyn RoleRepository>,
}

impl RoleManager {
    pub fn new(repo: Arc<dyn RoleRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl RoleResolver for RoleManager {
    async fn resolve_by_authority(&self, authority: &str) -> AppResult<Option<Role>> {
        self.repo.find_by_authority(authority).await
    }

    fn to_authorities(&self, roles: &BTreeSet<Role>) -> BTreeSet<Authority> {
        roles.iter().map(Authority::from).collect()
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.repo.find_all().await
    }
}
