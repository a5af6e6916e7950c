//! Salted Argon2id credentials with constant-time verification.
//!
//! Work factor: Argon2id v1.3, 19 MiB memory, 2 passes, 1 lane, 32-byte
//! output, 32-byte random salt per credential. Hash and salt are stored as
//! lowercase hex.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use argon2::{Algorithm, Argon2, Params, Version};
use subtle::ConstantTimeEq;

use galaxy_core::error::AppError;
use galaxy_core::result::AppResult;

use super::validator::PasswordValidator;

/// Salt length in bytes.
pub const SALT_LEN: usize = 32;
/// Derived hash length in bytes.
pub const HASH_LEN: usize = 32;

const MEMORY_KIB: u32 = 19 * 1024;
const ITERATIONS: u32 = 2;
const PARALLELISM: u32 = 1;

/// Salt used only to burn the same CPU time for unknown accounts.
const DUMMY_SALT: [u8; SALT_LEN] = [0x5a; SALT_LEN];

/// A stored credential: hex hash and hex salt.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Hex-encoded derived key.
    pub hash: String,
    /// Hex-encoded salt.
    pub salt: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential").finish_non_exhaustive()
    }
}

/// Creates and verifies password credentials.
#[derive(Debug, Clone)]
pub struct PasswordCredential {
    validator: PasswordValidator,
}

impl PasswordCredential {
    /// Creates a credential service that enforces `validator` on creation.
    pub fn new(validator: PasswordValidator) -> Self {
        Self { validator }
    }

    /// Returns the policy applied by [`Self::create`].
    pub fn validator(&self) -> &PasswordValidator {
        &self.validator
    }

    /// Validates the password and derives a credential with a fresh salt.
    pub fn create(&self, password: &str) -> AppResult<Credential> {
        self.validator.validate(password)?;

        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        let hash = derive(password, &salt)?;

        Ok(Credential {
            hash: hex::encode(hash),
            salt: hex::encode(salt),
        })
    }

    /// Checks a password against a stored hash and salt.
    ///
    /// Returns `false` for any malformed stored data.
    pub fn verify(&self, password: &str, stored_hash: &str, stored_salt: &str) -> bool {
        let (Ok(expected), Ok(salt)) = (hex::decode(stored_hash), hex::decode(stored_salt)) else {
            return false;
        };
        if expected.len() != HASH_LEN || salt.len() != SALT_LEN {
            return false;
        }
        match derive(password, &salt) {
            Ok(actual) => actual[..].ct_eq(&expected[..]).into(),
            Err(_) => false,
        }
    }

    /// Runs one derivation and discards it.
    pub fn burn(&self, password: &str) {
        let _ = derive(password, &DUMMY_SALT);
    }

    /// [`Self::create`] on the blocking pool.
    pub async fn create_async(&self, password: String) -> AppResult<Credential> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.create(&password))
            .await
            .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
    }

    /// [`Self::verify`] on the blocking pool.
    pub async fn verify_async(
        &self,
        password: String,
        stored_hash: String,
        stored_salt: String,
    ) -> AppResult<bool> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.verify(&password, &stored_hash, &stored_salt))
            .await
            .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))
    }

    /// [`Self::burn`] on the blocking pool.
    pub async fn burn_async(&self, password: String) {
        let this = self.clone();
        let _ = tokio::task::spawn_blocking(move || this.burn(&password)).await;
    }
}

fn derive(password: &str, salt: &[u8]) -> AppResult<[u8; HASH_LEN]> {
    let params = Params::new(MEMORY_KIB, ITERATIONS, PARALLELISM, Some(HASH_LEN))
        .map_err(|e| AppError::internal(format!("Invalid Argon2 parameters: {e}")))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut out = [0u8; HASH_LEN];
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut out)
        .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;
    Ok(out)
}
