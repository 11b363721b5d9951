//! Application services.
//!
//! Services orchestrate domain logic and repositories. They depend on
//! traits only, so any store or hasher can be plugged in.

mod auth_service;
mod role_service;
mod user_service;

pub use auth_service::{AuthService, Authenticator};
pub use role_service::{RoleManager, RoleResolver};
pub use user_service::{UserManager, UserService};

#[cfg(any(test, feature = "test-utils"))]
pub use role_service::MockRoleResolver;
#[cfg(any(test, feature = "test-utils"))]
pub use user_service::MockUserService;
