//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

// =============================================================================
// Roles
// =============================================================================

/// Authority granted to every regular account
pub const ROLE_USER: &str = "ROLE_USER";

/// Administrator authority with elevated privileges
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";

/// Authorities seeded into a fresh database
pub const DEFAULT_ROLES: &[&str] = &[ROLE_USER, ROLE_ADMIN];

// =============================================================================
// Passwords
// =============================================================================

/// Leading character of PHC / BCrypt hash strings.
///
/// A password beginning with this marker is stored as-is instead of being
/// hashed again.
pub const HASH_MARKER: char = '$';
