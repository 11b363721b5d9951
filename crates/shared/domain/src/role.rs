//! Role entity and authority tokens.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::ROLE_ADMIN;

/// Role entity, identified by a unique authority name such as `ROLE_ADMIN`.
///
/// Roles are immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub authority: String,
}

impl Role {
    pub fn new(id: Uuid, authority: impl Into<String>) -> Self {
        Self {
            id,
            authority: authority.into(),
        }
    }

    /// Check if this role grants admin privileges
    pub fn is_admin(&self) -> bool {
        self.authority == ROLE_ADMIN
    }

    /// Authority token granted by this role
    pub fn to_authority(&self) -> Authority {
        Authority::new(self.authority.clone())
    }
}

// Sets of roles iterate by authority name.
impl Ord for Role {
    fn cmp(&self, other: &Self) -> Ordering {
        self.authority
            .cmp(&other.authority)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for Role {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.authority)
    }
}

/// Capability token consumed by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Authority(String);

impl Authority {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&Role> for Authority {
    fn from(role: &Role) -> Self {
        role.to_authority()
    }
}

impl From<Authority> for String {
    fn from(authority: Authority) -> Self {
        authority.0
    }
}

impl std::fmt::Display for Authority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
