//! User service - Handles user-related business logic.
//!
//! SOLID (SRP): Handles user directory use cases only.
//! Mutations run inside a single Unit of Work transaction.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use common::{AppError, AppResult, OptionExt};
use domain::{CredentialHasher, DomainError, NewUser, Password, Role, UpdateUser, User};

use super::role_service::RoleResolver;
use crate::repository::{complete, UnitOfWork, UserRepository};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User directory trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserService: Send + Sync {
    /// Find user by login name
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Find user by email address
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Get user by ID, `NotFound` if absent
    async fn get_user(&self, id: Uuid) -> AppResult<User>;

    /// List all users
    async fn list_users(&self) -> AppResult<Vec<User>>;

    /// Create a user, optionally assigning roles by authority name.
    ///
    /// Unknown role names are skipped.
    async fn create_user(&self, input: NewUser, role_names: Option<Vec<String>>)
        -> AppResult<User>;

    /// Overwrite profile fields, optionally replace the role set and the
    /// password.
    ///
    /// `Some(names)` replaces the role set entirely (unknown names are
    /// skipped, an empty list clears it); `None` leaves roles untouched.
    async fn update_user(
        &self,
        id: Uuid,
        patch: UpdateUser,
        role_names: Option<Vec<String>>,
    ) -> AppResult<User>;

    /// Delete user and its role associations. No-op if absent.
    async fn delete_user(&self, id: Uuid) -> AppResult<()>;
}

/// Concrete implementation of UserService using Unit of Work.
pub struct UserManager<U: UnitOfWork> {
    uow: Arc<U>,
    roles: Arc<dyn RoleResolver>,
    hasher: Arc<dyn CredentialHasher>,
}

impl<U: UnitOfWork> UserManager<U> {
    pub fn new(uow: Arc<U>, roles: Arc<dyn RoleResolver>, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self { uow, roles, hasher }
    }

    /// Resolve authority names into a role set, skipping unknown names.
    async fn resolve_roles(&self, names: &[String]) -> AppResult<BTreeSet<Role>> {
        let mut roles = BTreeSet::new();
        for name in names {
            match self.roles.resolve_by_authority(name).await? {
                Some(role) => {
                    roles.insert(role);
                }
                None => tracing::warn!(authority = %name, "Skipping unknown role"),
            }
        }
        Ok(roles)
    }

    async fn apply_update(
        repo: &dyn UserRepository,
        id: Uuid,
        patch: &UpdateUser,
        roles: Option<BTreeSet<Role>>,
        password: Option<Password>,
    ) -> AppResult<User> {
        let mut user = repo.find_by_id(id).await?.ok_or_not_found()?;

        let username = (user.username != patch.username).then_some(patch.username.as_str());
        let email = patch
            .email
            .as_deref()
            .filter(|email| user.email.as_deref() != Some(*email));
        Self::ensure_unique(repo, id, username, email).await?;

        user.apply_profile(patch);
        if let Some(roles) = roles {
            user.replace_roles(roles);
        }
        if let Some(password) = password {
            user.set_password_hash(password.into_string());
        }

        repo.save(user).await
    }

    /// Reject a username or email already held by a user other than `owner`.
    async fn ensure_unique(
        repo: &dyn UserRepository,
        owner: Uuid,
        username: Option<&str>,
        email: Option<&str>,
    ) -> AppResult<()> {
        if let Some(username) = username {
            if let Some(other) = repo.find_by_username(username).await? {
                if other.id != owner {
                    return Err(AppError::conflict("Username"));
                }
            }
        }
        if let Some(email) = email {
            if let Some(other) = repo.find_by_email(email).await? {
                if other.id != owner {
                    return Err(AppError::conflict("Email"));
                }
            }
        }
        Ok(())
    }

    async fn insert(repo: &dyn UserRepository, user: User) -> AppResult<User> {
        Self::ensure_unique(repo, user.id, Some(&user.username), user.email.as_deref()).await?;
        repo.save(user).await
    }

    /// Clear associations and persist that state before removing the row,
    /// so the join table never references a missing user.
    async fn remove(repo: &dyn UserRepository, id: Uuid) -> AppResult<bool> {
        let Some(mut user) = repo.find_by_id(id).await? else {
            return Ok(false);
        };

        user.clear_roles();
        repo.save(user).await?;
        repo.delete_by_id(id).await?;
        Ok(true)
    }
}

#[async_trait]
impl<U: UnitOfWork> UserService for UserManager<U> {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.uow.users().find_by_username(username).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.uow.users().find_by_email(email).await
    }

    async fn get_user(&self, id: Uuid) -> AppResult<User> {
        self.uow.users().find_by_id(id).await?.ok_or_not_found()
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        self.uow.users().find_all().await
    }

    async fn create_user(
        &self,
        input: NewUser,
        role_names: Option<Vec<String>>,
    ) -> AppResult<User> {
        let input = input.normalized();
        input.validate().map_err(DomainError::from)?;
        if input.password.trim().is_empty() {
            return Err(AppError::validation("Password must not be blank"));
        }

        let roles = match role_names {
            Some(names) => self.resolve_roles(&names).await?,
            None => BTreeSet::new(),
        };
        let password = Password::encode(&input.password, self.hasher.as_ref())?;

        let mut user = User::new(
            Uuid::new_v4(),
            input.username,
            input.email,
            input.first_name,
            input.last_name,
            password.into_string(),
        );
        user.replace_roles(roles);

        let tx = self.uow.begin().await?;
        let result = Self::insert(tx.users(), user).await;
        let user = complete(tx, result).await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User created");
        Ok(user)
    }

    async fn update_user(
        &self,
        id: Uuid,
        patch: UpdateUser,
        role_names: Option<Vec<String>>,
    ) -> AppResult<User> {
        let patch = patch.normalized();
        patch.validate().map_err(DomainError::from)?;

        // Resolve and hash before the transaction opens
        let roles = match role_names {
            Some(names) => Some(self.resolve_roles(&names).await?),
            None => None,
        };
        let password = match patch.new_password() {
            Some(raw) => Some(Password::encode(raw, self.hasher.as_ref())?),
            None => None,
        };

        let tx = self.uow.begin().await?;
        let result = Self::apply_update(tx.users(), id, &patch, roles, password).await;
        let user = complete(tx, result).await?;

        tracing::info!(user_id = %user.id, "User updated");
        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<()> {
        let tx = self.uow.begin().await?;
        let result = Self::remove(tx.users(), id).await;
        let removed = complete(tx, result).await?;

        if removed {
            tracing::info!(user_id = %id, "User deleted");
        } else {
            tracing::debug!(user_id = %id, "Delete skipped, user not found");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;
    use mockall::predicate::eq;
    use mockall::Sequence;

    use super::*;
    use crate::repository::{MockUserRepository, RoleRepository, TransactionScope};
    use crate::service::MockRoleResolver;
    use domain::{is_hashed, Argon2Hasher, ROLE_ADMIN, ROLE_USER};

    /// Unit of Work double: every call, in or out of a transaction, goes to
    /// the same mock repository. Commits and rollbacks are counted.
    struct TestUnitOfWork {
        users: Arc<MockUserRepository>,
        commits: Arc<AtomicUsize>,
        rollbacks: Arc<AtomicUsize>,
    }

    impl TestUnitOfWork {
        fn new(users: MockUserRepository) -> Self {
            Self {
                users: Arc::new(users),
                commits: Arc::new(AtomicUsize::new(0)),
                rollbacks: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    struct TestScope {
        users: Arc<MockUserRepository>,
        commits: Arc<AtomicUsize>,
        rollbacks: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TransactionScope for TestScope {
        fn users(&self) -> &dyn UserRepository {
            self.users.as_ref()
        }

        async fn commit(self: Box<Self>) -> AppResult<()> {
            self.commits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> AppResult<()> {
            self.rollbacks.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[async_trait]
    impl UnitOfWork for TestUnitOfWork {
        fn users(&self) -> Arc<dyn UserRepository> {
            self.users.clone()
        }

        fn roles(&self) -> Arc<dyn RoleRepository> {
            unreachable!("roles are resolved through RoleResolver")
        }

        async fn begin(&self) -> AppResult<Box<dyn TransactionScope>> {
            Ok(Box::new(TestScope {
                users: self.users.clone(),
                commits: self.commits.clone(),
                rollbacks: self.rollbacks.clone(),
            }))
        }
    }

    fn role(authority: &str) -> Role {
        Role::new(Uuid::new_v4(), authority)
    }

    fn stored_user(id: Uuid) -> User {
        User {
            id,
            username: "bob".to_string(),
            email: Some("bob@example.com".to_string()),
            first_name: "Bob".to_string(),
            last_name: "Builder".to_string(),
            password_hash: "$argon2id$existing".to_string(),
            roles: [role(ROLE_ADMIN)].into_iter().collect(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn new_bob(password: &str) -> NewUser {
        NewUser {
            username: "bob".to_string(),
            email: Some("bob@example.com".to_string()),
            first_name: "Bob".to_string(),
            last_name: "Builder".to_string(),
            password: password.to_string(),
        }
    }

    /// Resolver knowing only ROLE_USER and ROLE_ADMIN
    fn resolver(user_role: Role, admin_role: Role) -> MockRoleResolver {
        let mut roles = MockRoleResolver::new();
        roles.expect_resolve_by_authority().returning(move |name| {
            Ok(match name {
                ROLE_USER => Some(user_role.clone()),
                ROLE_ADMIN => Some(admin_role.clone()),
                _ => None,
            })
        });
        roles
    }

    fn manager(
        uow: TestUnitOfWork,
        roles: MockRoleResolver,
    ) -> (UserManager<TestUnitOfWork>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let commits = uow.commits.clone();
        let rollbacks = uow.rollbacks.clone();
        let service = UserManager::new(Arc::new(uow), Arc::new(roles), Arc::new(Argon2Hasher::new()));
        (service, commits, rollbacks)
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let (service, _, _) = manager(TestUnitOfWork::new(repo), MockRoleResolver::new());
        let result = service.get_user(Uuid::new_v4()).await;

        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_create_user_hashes_and_assigns_roles() {
        let user_role = role(ROLE_USER);
        let expected_role = user_role.clone();

        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username().returning(|_| Ok(None));
        repo.expect_find_by_email().returning(|_| Ok(None));
        repo.expect_save().times(1).returning(|user| Ok(user));

        let (service, commits, _) = manager(
            TestUnitOfWork::new(repo),
            resolver(user_role, role(ROLE_ADMIN)),
        );
        let user = service
            .create_user(
                new_bob("pw123"),
                Some(vec![ROLE_USER.to_string(), ROLE_USER.to_string()]),
            )
            .await
            .unwrap();

        assert_eq!(user.roles, [expected_role].into_iter().collect());
        assert_ne!(user.password_hash, "pw123");
        assert!(Argon2Hasher::new().verify("pw123", &user.password_hash));
        assert_eq!(commits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_create_user_skips_unknown_roles() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username().returning(|_| Ok(None));
        repo.expect_find_by_email().returning(|_| Ok(None));
        repo.expect_save().returning(|user| Ok(user));

        let (service, _, _) = manager(TestUnitOfWork::new(repo), resolver(role(ROLE_USER), role(ROLE_ADMIN)));
        let user = service
            .create_user(
                new_bob("pw123"),
                Some(vec!["ROLE_GHOST".to_string(), ROLE_ADMIN.to_string()]),
            )
            .await
            .unwrap();

        assert_eq!(user.roles.len(), 1);
        assert!(user.has_role(ROLE_ADMIN));
    }

    #[tokio::test]
    async fn test_create_user_keeps_prehashed_password() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username().returning(|_| Ok(None));
        repo.expect_find_by_email().returning(|_| Ok(None));
        repo.expect_save().returning(|user| Ok(user));

        let (service, _, _) = manager(TestUnitOfWork::new(repo), MockRoleResolver::new());
        let user = service
            .create_user(new_bob("$2a$10$alreadyhashed"), None)
            .await
            .unwrap();

        assert_eq!(user.password_hash, "$2a$10$alreadyhashed");
        assert!(user.roles.is_empty());
    }

    #[tokio::test]
    async fn test_create_user_rejects_blank_password() {
        let repo = MockUserRepository::new();

        let (service, commits, _) = manager(TestUnitOfWork::new(repo), MockRoleResolver::new());
        let result = service.create_user(new_bob("  "), None).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(commits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_create_user_rejects_invalid_email() {
        let repo = MockUserRepository::new();

        let (service, _, _) = manager(TestUnitOfWork::new(repo), MockRoleResolver::new());
        let mut input = new_bob("pw123");
        input.email = Some("nope".to_string());

        let result = service.create_user(input, None).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_user_duplicate_username() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username()
            .returning(|_| Ok(Some(stored_user(Uuid::new_v4()))));
        repo.expect_save().never();

        let (service, commits, rollbacks) =
            manager(TestUnitOfWork::new(repo), MockRoleResolver::new());
        let result = service.create_user(new_bob("pw123"), None).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
        // The check ran inside the create transaction
        assert_eq!(commits.load(Ordering::SeqCst), 0);
        assert_eq!(rollbacks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_create_user_store_conflict_rolls_back() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username().returning(|_| Ok(None));
        repo.expect_find_by_email().returning(|_| Ok(None));
        repo.expect_save()
            .times(1)
            .returning(|_| Err(AppError::conflict("Username")));

        let (service, commits, rollbacks) =
            manager(TestUnitOfWork::new(repo), MockRoleResolver::new());
        let result = service.create_user(new_bob("pw123"), None).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(commits.load(Ordering::SeqCst), 0);
        assert_eq!(rollbacks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_create_user_without_email() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username()
            .with(eq("bob"))
            .returning(|_| Ok(None));
        repo.expect_find_by_email().never();
        repo.expect_save().times(1).returning(|user| Ok(user));

        let (service, commits, _) = manager(
            TestUnitOfWork::new(repo),
            resolver(role(ROLE_USER), role(ROLE_ADMIN)),
        );
        let input = NewUser {
            username: "bob".to_string(),
            email: None,
            first_name: String::new(),
            last_name: String::new(),
            password: "pw123".to_string(),
        };
        let user = service
            .create_user(input, Some(vec![ROLE_USER.to_string()]))
            .await
            .unwrap();

        assert_eq!(user.email, None);
        assert!(user.has_role(ROLE_USER));
        assert!(Argon2Hasher::new().verify("pw123", &user.password_hash));
        assert_eq!(commits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_update_user_keeps_hash_on_blank_password() {
        let id = Uuid::new_v4();

        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .with(eq(id))
            .returning(|id| Ok(Some(stored_user(id))));
        repo.expect_save().returning(|user| Ok(user));

        let (service, commits, _) = manager(TestUnitOfWork::new(repo), MockRoleResolver::new());
        let mut patch = UpdateUser::from(&stored_user(id));
        patch.first_name = "Robert".to_string();
        patch.password = Some(String::new());

        let user = service.update_user(id, patch, None).await.unwrap();

        assert_eq!(user.password_hash, "$argon2id$existing");
        assert_eq!(user.first_name, "Robert");
        // Roles untouched when no list is given
        assert!(user.has_role(ROLE_ADMIN));
        assert_eq!(commits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_update_user_stores_marked_password_verbatim() {
        let id = Uuid::new_v4();

        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|id| Ok(Some(stored_user(id))));
        repo.expect_save().returning(|user| Ok(user));

        let (service, _, _) = manager(TestUnitOfWork::new(repo), MockRoleResolver::new());
        let mut patch = UpdateUser::from(&stored_user(id));
        patch.password = Some("$2a$10$fromanothersystem".to_string());

        let user = service.update_user(id, patch, None).await.unwrap();
        assert_eq!(user.password_hash, "$2a$10$fromanothersystem");
    }

    #[tokio::test]
    async fn test_update_user_hashes_new_password() {
        let id = Uuid::new_v4();

        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|id| Ok(Some(stored_user(id))));
        repo.expect_save().returning(|user| Ok(user));

        let (service, _, _) = manager(TestUnitOfWork::new(repo), MockRoleResolver::new());
        let mut patch = UpdateUser::from(&stored_user(id));
        patch.password = Some("new-secret".to_string());

        let user = service.update_user(id, patch, None).await.unwrap();

        assert!(is_hashed(&user.password_hash));
        assert!(Argon2Hasher::new().verify("new-secret", &user.password_hash));
    }

    #[tokio::test]
    async fn test_update_user_replaces_roles() {
        let id = Uuid::new_v4();
        let user_role = role(ROLE_USER);
        let expected = user_role.clone();

        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|id| Ok(Some(stored_user(id))));
        repo.expect_save().returning(|user| Ok(user));

        let (service, _, _) = manager(TestUnitOfWork::new(repo), resolver(user_role, role(ROLE_ADMIN)));
        let patch = UpdateUser::from(&stored_user(id));

        let user = service
            .update_user(id, patch, Some(vec![ROLE_USER.to_string(), "ROLE_GHOST".to_string()]))
            .await
            .unwrap();

        // ROLE_ADMIN was dropped, the unknown name skipped
        assert_eq!(user.roles, [expected].into_iter().collect());
    }

    #[tokio::test]
    async fn test_update_user_empty_role_list_clears_roles() {
        let id = Uuid::new_v4();

        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|id| Ok(Some(stored_user(id))));
        repo.expect_save().returning(|user| Ok(user));

        let (service, _, _) = manager(TestUnitOfWork::new(repo), MockRoleResolver::new());
        let patch = UpdateUser::from(&stored_user(id));

        let user = service.update_user(id, patch, Some(vec![])).await.unwrap();
        assert!(user.roles.is_empty());
    }

    #[tokio::test]
    async fn test_update_user_not_found_rolls_back() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));
        repo.expect_save().never();

        let (service, commits, rollbacks) = manager(TestUnitOfWork::new(repo), MockRoleResolver::new());
        let patch = UpdateUser::from(&stored_user(Uuid::new_v4()));

        let result = service.update_user(Uuid::new_v4(), patch, None).await;

        assert!(matches!(result, Err(AppError::NotFound)));
        assert_eq!(commits.load(Ordering::SeqCst), 0);
        assert_eq!(rollbacks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_update_user_email_taken_by_other() {
        let id = Uuid::new_v4();

        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|id| Ok(Some(stored_user(id))));
        repo.expect_find_by_email()
            .returning(|_| Ok(Some(stored_user(Uuid::new_v4()))));
        repo.expect_save().never();

        let (service, _, _) = manager(TestUnitOfWork::new(repo), MockRoleResolver::new());
        let mut patch = UpdateUser::from(&stored_user(id));
        patch.email = Some("taken@example.com".to_string());

        let result = service.update_user(id, patch, None).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_delete_clears_roles_before_removing_row() {
        let id = Uuid::new_v4();
        let mut seq = Sequence::new();

        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|id| Ok(Some(stored_user(id))));
        repo.expect_save()
            .withf(|user| user.roles.is_empty())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|user| Ok(user));
        repo.expect_delete_by_id()
            .with(eq(id))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let (service, commits, _) = manager(TestUnitOfWork::new(repo), MockRoleResolver::new());
        tokio_test::assert_ok!(service.delete_user(id).await);
        assert_eq!(commits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_user_is_noop() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));
        repo.expect_save().never();
        repo.expect_delete_by_id().never();

        let (service, _, _) = manager(TestUnitOfWork::new(repo), MockRoleResolver::new());
        tokio_test::assert_ok!(service.delete_user(Uuid::new_v4()).await);
    }
}
