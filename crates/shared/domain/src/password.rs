//! Password hashing policy.
//!
//! DDD: Encapsulates password hashing as a domain value object.
//! The hasher itself sits behind [`CredentialHasher`] so services can be
//! handed any one-way hash implementation.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::constants::HASH_MARKER;
use crate::error::{DomainError, DomainResult};

/// Returns true when `value` already looks like an encoded hash.
///
/// PHC strings (`$argon2id$...`) and BCrypt strings (`$2a$...`) both start
/// with [`HASH_MARKER`]. This is a heuristic: a plaintext password that
/// happens to start with `$` is stored verbatim.
pub fn is_hashed(value: &str) -> bool {
    value.starts_with(HASH_MARKER)
}

/// One-way password hashing.
pub trait CredentialHasher: Send + Sync {
    /// Hash a plaintext password into an encoded hash string.
    fn hash(&self, plain_text: &str) -> DomainResult<String>;

    /// Check a plaintext password against an encoded hash.
    ///
    /// Malformed hashes never verify.
    fn verify(&self, plain_text: &str, hash: &str) -> bool;
}

/// Argon2id hasher with the crate's default parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

impl Argon2Hasher {
    pub fn new() -> Self {
        Self
    }

    #[inline]
    fn argon2() -> Argon2<'static> {
        Argon2::default()
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plain_text: &str) -> DomainResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Self::argon2()
            .hash_password(plain_text.as_bytes(), &salt)
            .map_err(|e| DomainError::password(format!("Password hash failed: {}", e)))?;
        Ok(hash.to_string())
    }

    fn verify(&self, plain_text: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => Self::argon2()
                .verify_password(plain_text.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

/// Stored password value object.
///
/// Always holds an encoded hash, never plaintext.
#[derive(Clone)]
pub struct Password {
    hash: String,
}

// Don't expose hash in debug output (security)
impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

impl Password {
    /// Encode raw input for storage.
    ///
    /// Input that already carries the hash marker is kept verbatim so a hash
    /// is never hashed twice; anything else goes through `hasher`.
    pub fn encode(raw: &str, hasher: &dyn CredentialHasher) -> DomainResult<Self> {
        if is_hashed(raw) {
            return Ok(Self::from_hash(raw));
        }

        Ok(Self {
            hash: hasher.hash(raw)?,
        })
    }

    /// Wrap an existing hash (from the store).
    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }

    /// Get the hash string for storage.
    pub fn as_str(&self) -> &str {
        &self.hash
    }

    /// Consume and return the hash string.
    pub fn into_string(self) -> String {
        self.hash
    }

    /// Verify a plain text password against this hash.
    pub fn verify(&self, plain_text: &str, hasher: &dyn CredentialHasher) -> bool {
        hasher.verify(plain_text, &self.hash)
    }
}

impl From<Password> for String {
    fn from(password: Password) -> Self {
        password.hash
    }
}

impl PartialEq for Password {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Password {}
