//! Authentication principal.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::role::Authority;
use crate::user::User;

/// Identity handed to the authentication layer after a successful lookup.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub authorities: BTreeSet<Authority>,
}

impl Principal {
    pub fn new(username: String, password_hash: String, authorities: BTreeSet<Authority>) -> Self {
        Self {
            username,
            password_hash,
            authorities,
        }
    }

    /// Check if the principal holds the given authority
    pub fn has_authority(&self, name: &str) -> bool {
        self.authorities.iter().any(|a| a.as_str() == name)
    }
}

impl std::fmt::Debug for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Principal")
            .field("username", &self.username)
            .field("password_hash", &"[REDACTED]")
            .field("authorities", &self.authorities)
            .finish()
    }
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self::new(
            user.username.clone(),
            user.password_hash.clone(),
            user.authorities(),
        )
    }
}
