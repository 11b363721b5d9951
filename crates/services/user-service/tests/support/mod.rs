//! Shared test doubles.
//!
//! `InMemoryUnitOfWork` keeps users in a map. Transactions work on a copy of
//! the state that replaces the committed state on commit. Deleting a user
//! whose role set is not empty fails, like the join table's foreign key.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use ::common::{AppError, AppResult};
use domain::{Argon2Hasher, NewUser, Role, UpdateUser, User, ROLE_ADMIN, ROLE_USER};
use user_service_lib::repository::{RoleRepository, TransactionScope, UnitOfWork, UserRepository};
use user_service_lib::Services;

#[derive(Clone, Default)]
struct State {
    users: HashMap<Uuid, User>,
}

pub struct MemoryUsers {
    state: Arc<Mutex<State>>,
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.state.lock().unwrap().users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().unwrap();
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .values()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned())
    }

    async fn find_all(&self) -> AppResult<Vec<User>> {
        let state = self.state.lock().unwrap();
        let mut users: Vec<User> = state.users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn save(&self, user: User) -> AppResult<User> {
        let mut state = self.state.lock().unwrap();
        for other in state.users.values().filter(|u| u.id != user.id) {
            if other.username == user.username {
                return Err(AppError::conflict("Username"));
            }
            if other.email.is_some() && other.email == user.email {
                return Err(AppError::conflict("Email"));
            }
        }
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete_by_id(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        match state.users.get(&id) {
            None => Err(AppError::NotFound),
            Some(user) if !user.roles.is_empty() => Err(AppError::internal(
                "foreign key violated: users_roles still references user",
            )),
            Some(_) => {
                state.users.remove(&id);
                Ok(())
            }
        }
    }
}

pub struct MemoryRoles {
    roles: Vec<Role>,
}

#[async_trait]
impl RoleRepository for MemoryRoles {
    async fn find_by_authority(&self, authority: &str) -> AppResult<Option<Role>> {
        Ok(self.roles.iter().find(|r| r.authority == authority).cloned())
    }

    async fn find_all(&self) -> AppResult<Vec<Role>> {
        let mut roles = self.roles.clone();
        roles.sort();
        Ok(roles)
    }
}

pub struct MemoryScope {
    staged: MemoryUsers,
    target: Arc<Mutex<State>>,
}

#[async_trait]
impl TransactionScope for MemoryScope {
    fn users(&self) -> &dyn UserRepository {
        &self.staged
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let staged = self.staged.state.lock().unwrap().clone();
        *self.target.lock().unwrap() = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}

pub struct InMemoryUnitOfWork {
    state: Arc<Mutex<State>>,
    roles: Arc<MemoryRoles>,
}

impl InMemoryUnitOfWork {
    /// Store seeded with ROLE_USER and ROLE_ADMIN
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            roles: Arc::new(MemoryRoles {
                roles: vec![
                    Role::new(Uuid::new_v4(), ROLE_USER),
                    Role::new(Uuid::new_v4(), ROLE_ADMIN),
                ],
            }),
        }
    }

    /// Committed state of a user
    pub fn stored(&self, id: Uuid) -> Option<User> {
        self.state.lock().unwrap().users.get(&id).cloned()
    }

    pub fn role(&self, authority: &str) -> Role {
        self.roles
            .roles
            .iter()
            .find(|r| r.authority == authority)
            .cloned()
            .unwrap()
    }

    /// Put a user straight into the committed state
    pub fn insert(&self, user: User) {
        self.state.lock().unwrap().users.insert(user.id, user);
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    fn users(&self) -> Arc<dyn UserRepository> {
        Arc::new(MemoryUsers {
            state: self.state.clone(),
        })
    }

    fn roles(&self) -> Arc<dyn RoleRepository> {
        self.roles.clone()
    }

    async fn begin(&self) -> AppResult<Box<dyn TransactionScope>> {
        let snapshot = self.state.lock().unwrap().clone();
        Ok(Box::new(MemoryScope {
            staged: MemoryUsers {
                state: Arc::new(Mutex::new(snapshot)),
            },
            target: self.state.clone(),
        }))
    }
}

/// Services over a fresh in-memory store
pub fn services() -> (Services, Arc<InMemoryUnitOfWork>) {
    let uow = Arc::new(InMemoryUnitOfWork::new());
    let services = Services::new(uow.clone(), Arc::new(Argon2Hasher::new()));
    (services, uow)
}

pub fn new_user(username: &str, password: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: Some(format!("{}@example.com", username)),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        password: password.to_string(),
    }
}

pub fn patch_for(user: &User) -> UpdateUser {
    UpdateUser::from(user)
}

pub fn user_without_roles(username: &str) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: Some(format!("{}@example.com", username)),
        first_name: String::new(),
        last_name: String::new(),
        password_hash: "$argon2id$placeholder".to_string(),
        roles: Default::default(),
        created_at: now,
        updated_at: now,
    }
}
