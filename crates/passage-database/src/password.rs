//! Argon2id password hashing and verification.

use std::sync::{Arc, OnceLock};

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use passage_core::config::AuthConfig;
use passage_core::error::{AppError, ErrorKind};
use passage_core::result::AppResult;

/// Handles password hashing and verification using Argon2id.
///
/// Hashing is CPU-bound; the async helpers run it on the blocking pool so
/// request tasks are never stalled.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
    decoy: Arc<OnceLock<String>>,
}

/// Plaintext behind the decoy hash. Never stored for any user.
const DECOY_PASSWORD: &str = "passage-decoy-password";

impl PasswordHasher {
    /// Create a hasher with explicit cost parameters.
    pub fn new(memory_kib: u32, iterations: u32) -> AppResult<Self> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| AppError::configuration(format!("Invalid Argon2 parameters: {e}")))?;
        Ok(Self {
            params,
            decoy: Arc::new(OnceLock::new()),
        })
    }

    /// Create a hasher from the auth configuration.
    pub fn from_config(config: &AuthConfig) -> AppResult<Self> {
        Self::new(config.password_hash_memory_kib, config.password_hash_iterations)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a plaintext password with a random salt.
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;
        Ok(hash.to_string())
    }

    /// Verify a plaintext password against a stored hash.
    ///
    /// Returns `Ok(false)` on mismatch. The cost parameters are read from
    /// the stored hash, so hashes made under older settings still verify.
    pub fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::internal(format!("Invalid password hash format: {e}")))?;

        match self.argon2().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::internal(format!(
                "Password verification failed: {e}"
            ))),
        }
    }

    /// Hash of a fixed password under the current parameters, made once.
    fn decoy_hash(&self) -> AppResult<String> {
        if let Some(hash) = self.decoy.get() {
            return Ok(hash.clone());
        }
        let hash = self.hash_password(DECOY_PASSWORD)?;
        Ok(self.decoy.get_or_init(|| hash).clone())
    }

    /// Spend one verification's worth of work without a real hash.
    ///
    /// Used when a login identifier matches nobody, so that path costs the
    /// same as a wrong password.
    pub fn verify_decoy(&self, password: &str) -> AppResult<()> {
        let hash = self.decoy_hash()?;
        self.verify_password(password, &hash).map(|_| ())
    }

    /// [`Self::verify_decoy`] on the blocking pool.
    pub async fn verify_decoy_async(&self, password: String) -> AppResult<()> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify_decoy(&password))
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Verification task failed", e))?
    }

    /// [`Self::hash_password`] on the blocking pool.
    pub async fn hash_async(&self, password: String) -> AppResult<String> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash_password(&password))
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Hashing task failed", e))?
    }

    /// [`Self::verify_password`] on the blocking pool.
    pub async fn verify_async(&self, password: String, hash: String) -> AppResult<bool> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Verification task failed", e))?
    }
}
