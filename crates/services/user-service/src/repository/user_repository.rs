//! User repository implementation.
//!
//! A user row and its `users_roles` rows are read and written together.
//! The query functions are generic over [`ConnectionTrait`] so the same code
//! runs on the pool and inside a transaction.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, ModelTrait, QueryFilter, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use super::entities::role::Entity as RoleEntity;
use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use super::entities::user_role::{self, Entity as UserRoleEntity};
use common::{AppError, AppResult};
use domain::User;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find user by login name
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Find user by email address
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// List all users, ordered by username
    async fn find_all(&self) -> AppResult<Vec<User>>;

    /// Insert or update the user row and replace its role associations
    /// wholesale. Returns the stored state.
    async fn save(&self, user: User) -> AppResult<User>;

    /// Remove the user row. Role associations must already be cleared.
    async fn delete_by_id(&self, id: Uuid) -> AppResult<()>;
}

/// SeaORM-backed user repository working on the connection pool.
///
/// Each `save` runs in its own transaction. Use
/// [`UnitOfWork::begin`](super::UnitOfWork::begin) to group several calls.
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        find_one(&self.db, by_id(id)).await
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        find_one(&self.db, by_username(username)).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        find_one(&self.db, by_email(email)).await
    }

    async fn find_all(&self) -> AppResult<Vec<User>> {
        find_all(&self.db).await
    }

    async fn save(&self, user: User) -> AppResult<User> {
        let txn = self.db.begin().await?;
        let saved = save(&txn, user).await?;
        txn.commit().await?;
        Ok(saved)
    }

    async fn delete_by_id(&self, id: Uuid) -> AppResult<()> {
        delete_by_id(&self.db, id).await
    }
}

pub(super) fn by_id(id: Uuid) -> Condition {
    Condition::all().add(user::Column::Id.eq(id))
}

pub(super) fn by_username(username: &str) -> Condition {
    Condition::all().add(user::Column::Username.eq(username))
}

pub(super) fn by_email(email: &str) -> Condition {
    Condition::all().add(user::Column::Email.eq(email))
}

/// Load a single user with its roles
pub(super) async fn find_one<C: ConnectionTrait>(
    conn: &C,
    condition: Condition,
) -> AppResult<Option<User>> {
    let Some(model) = UserEntity::find().filter(condition).one(conn).await? else {
        return Ok(None);
    };

    let roles = model.find_related(RoleEntity).all(conn).await?;
    Ok(Some(model.into_domain(roles)))
}

pub(super) async fn find_all<C: ConnectionTrait>(conn: &C) -> AppResult<Vec<User>> {
    // One joined query; rows come back grouped by user id
    let mut users: Vec<User> = UserEntity::find()
        .find_with_related(RoleEntity)
        .all(conn)
        .await?
        .into_iter()
        .map(|(model, roles)| model.into_domain(roles))
        .collect();

    users.sort_by(|a, b| a.username.cmp(&b.username));
    Ok(users)
}

/// Unique index violations become `Conflict` naming the column.
fn write_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            if detail.contains("email") {
                AppError::conflict("Email")
            } else {
                AppError::conflict("Username")
            }
        }
        _ => AppError::from(err),
    }
}

pub(super) async fn save<C: ConnectionTrait>(conn: &C, user: User) -> AppResult<User> {
    let existing = UserEntity::find_by_id(user.id).one(conn).await?;

    match existing {
        Some(model) => {
            let mut active: ActiveModel = model.into();
            active.username = Set(user.username.clone());
            active.email = Set(user.email.clone());
            active.first_name = Set(user.first_name.clone());
            active.last_name = Set(user.last_name.clone());
            active.password_hash = Set(user.password_hash.clone());
            active.updated_at = Set(user.updated_at);
            active.update(conn).await.map_err(write_error)?;
        }
        None => {
            let active = ActiveModel {
                id: Set(user.id),
                username: Set(user.username.clone()),
                email: Set(user.email.clone()),
                first_name: Set(user.first_name.clone()),
                last_name: Set(user.last_name.clone()),
                password_hash: Set(user.password_hash.clone()),
                created_at: Set(user.created_at),
                updated_at: Set(user.updated_at),
            };
            UserEntity::insert(active)
                .exec_without_returning(conn)
                .await
                .map_err(write_error)?;
        }
    }

    // Associations are replaced, not diffed
    UserRoleEntity::delete_many()
        .filter(user_role::Column::UserId.eq(user.id))
        .exec(conn)
        .await?;

    if !user.roles.is_empty() {
        let links = user.roles.iter().map(|role| user_role::ActiveModel {
            user_id: Set(user.id),
            role_id: Set(role.id),
        });
        UserRoleEntity::insert_many(links)
            .exec_without_returning(conn)
            .await?;
    }

    tracing::debug!(user_id = %user.id, roles = user.roles.len(), "User saved");

    find_one(conn, by_id(user.id))
        .await?
        .ok_or_else(|| AppError::internal(format!("User {} missing after save", user.id)))
}

pub(super) async fn delete_by_id<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<()> {
    let result = UserEntity::delete_by_id(id).exec(conn).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(())
}
