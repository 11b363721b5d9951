//! Repository layer for data access.
//!
//! Services only see the traits defined here; the SeaORM stores are the
//! shipped implementation.

pub mod entities;
mod role_repository;
mod unit_of_work;
mod user_repository;

pub use role_repository::{RoleRepository, RoleStore};
pub use unit_of_work::{complete, Persistence, TransactionContext, TransactionScope, TxUserRepository, UnitOfWork};
pub use user_repository::{UserRepository, UserStore};

// Export mocks for unit tests and downstream test helpers
#[cfg(any(test, feature = "test-utils"))]
pub use role_repository::MockRoleRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
