//! Domain layer - Core business entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies:
//! users, roles, authorities, principals and the password hashing policy.

pub mod constants;
pub mod error;
pub mod password;
pub mod principal;
pub mod role;
pub mod user;

pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use password::{is_hashed, Argon2Hasher, CredentialHasher, Password};
pub use principal::Principal;
pub use role::{Authority, Role};
pub use user::{NewUser, UpdateUser, User, UserResponse};
