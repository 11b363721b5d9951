//! User Service Library
//!
//! User account management: lookup by id, username or email, credential
//! verification, CRUD of user records and role-set reconciliation.
//!
//! # Layers
//!
//! - **service**: `UserService` (directory), `RoleResolver`, `AuthService`
//! - **repository**: store traits, Unit of Work and the SeaORM stores
//! - **infra**: connection management and migrations
//! - **cli** / **commands**: the `user-service` admin binary

pub mod cli;
pub mod commands;
pub mod config;
pub mod infra;
pub mod repository;
pub mod service;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use domain::{Argon2Hasher, CredentialHasher};

use crate::repository::{Persistence, UnitOfWork};
use crate::service::{AuthService, Authenticator, RoleManager, RoleResolver, UserManager, UserService};

/// Wired service graph.
#[derive(Clone)]
pub struct Services {
    pub users: Arc<dyn UserService>,
    pub roles: Arc<dyn RoleResolver>,
    pub auth: Arc<dyn AuthService>,
}

impl Services {
    /// Build the services over an existing Unit of Work.
    pub fn new<U: UnitOfWork + 'static>(uow: Arc<U>, hasher: Arc<dyn CredentialHasher>) -> Self {
        let roles: Arc<dyn RoleResolver> = Arc::new(RoleManager::new(uow.roles()));
        let users: Arc<dyn UserService> =
            Arc::new(UserManager::new(uow, roles.clone(), hasher.clone()));
        let auth: Arc<dyn AuthService> =
            Arc::new(Authenticator::new(users.clone(), roles.clone(), hasher));

        Self { users, roles, auth }
    }

    /// Build the services on a SeaORM connection with Argon2 hashing.
    pub fn from_connection(db: DatabaseConnection) -> Self {
        Self::new(Arc::new(Persistence::new(db)), Arc::new(Argon2Hasher::new()))
    }
}
