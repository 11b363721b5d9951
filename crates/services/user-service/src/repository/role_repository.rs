//! Role repository.

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use super::entities::role::{self, Entity as RoleEntity};
use common::AppResult;
use domain::Role;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Read access to the role table.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Find a role by its unique authority name
    async fn find_by_authority(&self, authority: &str) -> AppResult<Option<Role>>;

    /// List every role, ordered by authority
    async fn find_all(&self) -> AppResult<Vec<Role>>;
}

/// SeaORM-backed role repository
pub struct RoleStore {
    db: DatabaseConnection,
}

impl RoleStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RoleRepository for RoleStore {
    async fn find_by_authority(&self, authority: &str) -> AppResult<Option<Role>> {
        let result = RoleEntity::find()
            .filter(role::Column::Authority.eq(authority))
            .one(&self.db)
            .await?;

        Ok(result.map(Role::from))
    }

    async fn find_all(&self) -> AppResult<Vec<Role>> {
        let models = RoleEntity::find()
            .order_by_asc(role::Column::Authority)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Role::from).collect())
    }
}
