//! Credential hashing and verification.

use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use zeroize::Zeroizing;

/// Memory used while hashing, in KiB.
const MEMORY_COST: u32 = 19 * 1024;
const ITERATIONS: u32 = 2;
const PARALLELISM: u32 = 1;
const HASH_LENGTH: usize = 32;

type Result<T> = std::result::Result<T, CryptoError>;

#[derive(thiserror::Error, Debug)]
pub enum CryptoError {
    #[error("argon2 error: {0}")]
    Argon2(String),
    #[error("secret suffix must not be empty")]
    EmptySecret,
}

/// Supplied password does not match the stored hash.
///
/// Also returned when the stored hash cannot be parsed, so callers
/// cannot tell a corrupted hash from a wrong password.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("password does not match")]
pub struct Mismatch;

/// Password manager that uses Argon2id and PHC string format for hashing and
/// verification.
///
/// Every password gets the process-wide secret suffix appended before it is
/// hashed or checked.
pub struct PasswordManager {
    params: Params,
    secret: Zeroizing<Vec<u8>>,
}

impl PasswordManager {
    /// Create a new [`PasswordManager`] using `secret` as password suffix.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(CryptoError::EmptySecret);
        }

        let params =
            Params::new(MEMORY_COST, ITERATIONS, PARALLELISM, Some(HASH_LENGTH))
                .map_err(|err| CryptoError::Argon2(err.to_string()))?;

        Ok(Self {
            params,
            secret: Zeroizing::new(secret.to_vec()),
        })
    }

    fn argon2(&self) -> Argon2<'_> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    fn season(&self, password: &[u8]) -> Zeroizing<Vec<u8>> {
        let mut seasoned =
            Zeroizing::new(Vec::with_capacity(password.len() + self.secret.len()));
        seasoned.extend_from_slice(password);
        seasoned.extend_from_slice(&self.secret);
        seasoned
    }

    /// Hash password using Argon2id with a fresh random salt.
    pub fn hash_password(&self, password: impl AsRef<[u8]>) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let seasoned = self.season(password.as_ref());

        let hash = self
            .argon2()
            .hash_password(&seasoned, &salt)
            .map_err(|err| CryptoError::Argon2(err.to_string()))?;

        Ok(hash.to_string())
    }

    /// Verify password against a PHC string.
    pub fn verify_password(
        &self,
        phc_hash: &str,
        password: impl AsRef<[u8]>,
    ) -> std::result::Result<(), Mismatch> {
        let parsed = PasswordHash::new(phc_hash).map_err(|_| Mismatch)?;
        let seasoned = self.season(password.as_ref());

        self.argon2()
            .verify_password(&seasoned, &parsed)
            .map_err(|_| Mismatch)
    }
}

impl std::fmt::Debug for PasswordManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordManager")
            .field("params", &self.params)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
