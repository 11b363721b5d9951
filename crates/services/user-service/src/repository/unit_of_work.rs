//! Unit of Work pattern implementation.
//!
//! SOLID (SRP): Manages transaction lifecycle and repository access.
//!
//! Mutating user operations open a [`TransactionScope`], run every
//! repository call through it and finish with [`complete`], which commits on
//! success and rolls back on error.

use async_trait::async_trait;
use sea_orm::{
    AccessMode, ConnectionTrait, DatabaseBackend, DatabaseConnection, DatabaseTransaction,
    IsolationLevel, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

use super::role_repository::{RoleRepository, RoleStore};
use super::user_repository::{self as users, UserRepository, UserStore};
use common::AppResult;
use domain::User;

/// Unit of Work trait for dependency injection.
///
/// Provides centralized access to all repositories and transaction management.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Get user repository (outside any transaction)
    fn users(&self) -> Arc<dyn UserRepository>;

    /// Get role repository
    fn roles(&self) -> Arc<dyn RoleRepository>;

    /// Start a transaction.
    async fn begin(&self) -> AppResult<Box<dyn TransactionScope>>;
}

/// An open transaction.
///
/// Dropping a scope without committing discards its writes.
#[async_trait]
pub trait TransactionScope: Send + Sync {
    /// User repository bound to this transaction
    fn users(&self) -> &dyn UserRepository;

    async fn commit(self: Box<Self>) -> AppResult<()>;

    async fn rollback(self: Box<Self>) -> AppResult<()>;
}

/// Commit `tx` if `result` is Ok, roll it back otherwise.
///
/// A failed rollback is logged and the original error is returned.
pub async fn complete<T: Send>(tx: Box<dyn TransactionScope>, result: AppResult<T>) -> AppResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!("Transaction rollback failed: {}", rollback_err);
            }
            Err(e)
        }
    }
}

/// Concrete implementation of UnitOfWork
pub struct Persistence {
    db: DatabaseConnection,
    user_repo: Arc<UserStore>,
    role_repo: Arc<RoleStore>,
}

impl Persistence {
    /// Create new UnitOfWork instance
    pub fn new(db: DatabaseConnection) -> Self {
        let user_repo = Arc::new(UserStore::new(db.clone()));
        let role_repo = Arc::new(RoleStore::new(db.clone()));
        Self {
            db,
            user_repo,
            role_repo,
        }
    }

    // SQLite has no per-transaction isolation or access mode settings.
    fn transaction_config(&self) -> (Option<IsolationLevel>, Option<AccessMode>) {
        match self.db.get_database_backend() {
            DatabaseBackend::Sqlite => (None, None),
            _ => (Some(IsolationLevel::ReadCommitted), Some(AccessMode::ReadWrite)),
        }
    }
}

#[async_trait]
impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repo.clone()
    }

    fn roles(&self) -> Arc<dyn RoleRepository> {
        self.role_repo.clone()
    }

    async fn begin(&self) -> AppResult<Box<dyn TransactionScope>> {
        let (isolation, access_mode) = self.transaction_config();
        let txn = self.db.begin_with_config(isolation, access_mode).await?;

        Ok(Box::new(TransactionContext {
            users: TxUserRepository { txn },
        }))
    }
}

/// SeaORM transaction scope
pub struct TransactionContext {
    users: TxUserRepository,
}

#[async_trait]
impl TransactionScope for TransactionContext {
    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let TransactionContext { users } = *self;
        users.txn.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        let TransactionContext { users } = *self;
        users.txn.rollback().await?;
        Ok(())
    }
}

/// Transaction-aware user repository.
///
/// Executes all operations within the owned transaction.
pub struct TxUserRepository {
    txn: DatabaseTransaction,
}

#[async_trait]
impl UserRepository for TxUserRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        users::find_one(&self.txn, users::by_id(id)).await
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        users::find_one(&self.txn, users::by_username(username)).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        users::find_one(&self.txn, users::by_email(email)).await
    }

    async fn find_all(&self) -> AppResult<Vec<User>> {
        users::find_all(&self.txn).await
    }

    async fn save(&self, user: User) -> AppResult<User> {
        users::save(&self.txn, user).await
    }

    async fn delete_by_id(&self, id: Uuid) -> AppResult<()> {
        users::delete_by_id(&self.txn, id).await
    }
}
