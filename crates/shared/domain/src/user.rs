//! User domain entity and related types.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::role::{Authority, Role};

/// User domain entity
#[derive(Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub roles: BTreeSet<Role>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Don't expose hash in debug output (security)
impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password_hash", &"[REDACTED]")
            .field("roles", &self.roles)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl User {
    /// Create a new user without roles
    pub fn new(
        id: Uuid,
        username: String,
        email: Option<String>,
        first_name: String,
        last_name: String,
        password_hash: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            username,
            email,
            first_name,
            last_name,
            password_hash,
            roles: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if user holds the given authority
    pub fn has_role(&self, authority: &str) -> bool {
        self.roles.iter().any(|r| r.authority == authority)
    }

    /// Check if user has admin role
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(Role::is_admin)
    }

    /// Authorities granted through this user's roles
    pub fn authorities(&self) -> BTreeSet<Authority> {
        self.roles.iter().map(Authority::from).collect()
    }

    /// Overwrite the profile fields from an update patch.
    ///
    /// Password and roles are handled separately by the caller.
    pub fn apply_profile(&mut self, patch: &UpdateUser) {
        self.username = patch.username.clone();
        self.email = patch.email.clone();
        self.first_name = patch.first_name.clone();
        self.last_name = patch.last_name.clone();
        self.updated_at = Utc::now();
    }

    /// Replace the role set wholesale
    pub fn replace_roles(&mut self, roles: BTreeSet<Role>) {
        self.roles = roles;
        self.updated_at = Utc::now();
    }

    /// Drop every role association
    pub fn clear_roles(&mut self) {
        self.replace_roles(BTreeSet::new());
    }

    /// Update the stored password hash
    pub fn set_password_hash(&mut self, password_hash: String) {
        self.password_hash = password_hash;
        self.updated_at = Utc::now();
    }
}

/// User creation data transfer object
#[derive(Clone, Deserialize, Validate)]
pub struct NewUser {
    /// Login name
    #[validate(length(min = 1, max = 255, message = "Username is required"))]
    pub username: String,
    /// Optional email address, checked for format when present
    #[serde(default)]
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(max = 255))]
    pub first_name: String,
    #[validate(length(max = 255))]
    pub last_name: String,
    /// Plaintext password, or an already encoded hash
    pub password: String,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// User update data transfer object.
///
/// Profile fields always overwrite the stored ones. A missing or blank
/// password keeps the stored hash.
#[derive(Clone, Deserialize, Validate)]
pub struct UpdateUser {
    #[validate(length(min = 1, max = 255, message = "Username is required"))]
    pub username: String,
    /// `None` clears the stored address
    #[serde(default)]
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(max = 255))]
    pub first_name: String,
    #[validate(length(max = 255))]
    pub last_name: String,
    pub password: Option<String>,
}

impl NewUser {
    /// Treat a blank email as no email
    pub fn normalized(mut self) -> Self {
        self.email = non_blank(self.email);
        self
    }
}

impl UpdateUser {
    /// Treat a blank email as no email
    pub fn normalized(mut self) -> Self {
        self.email = non_blank(self.email);
        self
    }

    /// New password, if one was actually supplied
    pub fn new_password(&self) -> Option<&str> {
        self.password
            .as_deref()
            .filter(|p| !p.trim().is_empty())
    }
}

impl std::fmt::Debug for UpdateUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl From<&User> for UpdateUser {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            password: None,
        }
    }
}

/// User view safe to print or return to a client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            roles: user.roles.iter().map(|r| r.authority.clone()).collect(),
            created_at: user.created_at,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse::from(&user)
    }
}
