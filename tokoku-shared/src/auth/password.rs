/// Password hashing module using Argon2id
///
/// This module provides one-way salted password hashing with the Argon2id
/// algorithm, plus [`HashingPool`], which runs the CPU-heavy work on the
/// blocking thread pool behind a semaphore so request handling is never
/// starved by concurrent logins.
///
/// # Security
///
/// - **Algorithm**: Argon2id (hybrid of Argon2i and Argon2d)
/// - **Memory**: 64 MB (65536 KB) by default
/// - **Iterations**: 3 passes by default
/// - **Parallelism**: 4 lanes by default
/// - **Output**: 32-byte hash in PHC string format
///
/// Verification never distinguishes a malformed stored hash from a wrong
/// password: both are a plain `false`.
///
/// # Example
///
/// ```
/// use tokoku_shared::auth::password::{hash_password, verify_password, HashingConfig};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = HashingConfig::default();
/// let hash = hash_password("pw123", &config)?;
///
/// assert!(verify_password("pw123", &hash));
/// assert!(!verify_password("wrong", &hash));
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params, ParamsBuilder, Version,
};
use tokio::sync::{OnceCell, Semaphore};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// The hashing worker could not be scheduled or panicked
    #[error("Hashing worker unavailable: {0}")]
    WorkerUnavailable(String),
}

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingConfig {
    /// Memory cost in KiB
    pub memory_kib: u32,

    /// Number of passes
    pub iterations: u32,

    /// Degree of parallelism (lanes)
    pub parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: 65536, // 64 MB
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl HashingConfig {
    fn params(&self) -> Result<Params, PasswordError> {
        ParamsBuilder::new()
            .m_cost(self.memory_kib)
            .t_cost(self.iterations)
            .p_cost(self.parallelism)
            .output_len(32)
            .build()
            .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))
    }
}

/// Hashes a password using Argon2id with the given cost parameters
///
/// A fresh 16-byte salt is drawn from the OS RNG on every call, so hashing
/// the same password twice yields two different strings.
///
/// Example output:
/// ```text
/// $argon2id$v=19$m=65536,t=3,p=4$c2FsdHNhbHRzYWx0$hash...
/// ```
///
/// # Errors
///
/// Returns `PasswordError::HashError` if the parameters are rejected or the
/// hash cannot be computed.
pub fn hash_password(password: &str, config: &HashingConfig) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, config.params()?);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a stored PHC hash
///
/// The cost parameters are read from the hash itself and the final
/// comparison is constant-time. Returns `false` for a wrong password *and*
/// for a hash string that cannot be parsed.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        tracing::warn!("Stored password hash is not a valid PHC string");
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Bounded executor for password hashing
///
/// Each operation takes a semaphore permit and then runs on tokio's
/// blocking pool, so at most `max_concurrency` hashes are in flight. The
/// permit moves into the blocking task and is released only when the hash
/// finishes, even if the caller was cancelled in the meantime.
/// Cloning is cheap; clones share the same permits.
#[derive(Debug, Clone)]
pub struct HashingPool {
    config: HashingConfig,
    permits: Arc<Semaphore>,
    dummy_hash: Arc<OnceCell<String>>,
}

impl HashingPool {
    /// Creates a pool allowing `max_concurrency` simultaneous operations
    pub fn new(config: HashingConfig, max_concurrency: usize) -> Self {
        Self {
            config,
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Cost parameters used for new hashes
    pub fn config(&self) -> &HashingConfig {
        &self.config
    }

    /// Hashes `password` on the blocking pool
    pub async fn hash(&self, password: String) -> Result<String, PasswordError> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| PasswordError::WorkerUnavailable(e.to_string()))?;

        let config = self.config;
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            hash_password(&password, &config)
        })
        .await
        .map_err(|e| PasswordError::WorkerUnavailable(e.to_string()))?
    }

    /// Verifies `password` against `hash` on the blocking pool
    ///
    /// Scheduling failures are logged and reported as a failed verification.
    pub async fn verify(&self, password: String, hash: String) -> bool {
        let Ok(permit) = self.permits.clone().acquire_owned().await else {
            tracing::error!("Hashing semaphore closed during verification");
            return false;
        };

        let task = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            verify_password(&password, &hash)
        });

        match task.await {
            Ok(valid) => valid,
            Err(e) => {
                tracing::error!(error = %e, "Password verification worker failed");
                false
            }
        }
    }

    /// Builds the throwaway hash used by [`verify_dummy`](Self::verify_dummy)
    ///
    /// Call once at startup so no login request pays for building it.
    pub async fn warm(&self) -> Result<(), PasswordError> {
        self.dummy_hash().await.map(|_| ())
    }

    async fn dummy_hash(&self) -> Result<&String, PasswordError> {
        self.dummy_hash
            .get_or_try_init(|| self.hash("tokoku-dummy-password".to_string()))
            .await
    }

    /// Burns one verification against a throwaway hash
    ///
    /// Used when the account being checked does not exist, so that the
    /// "unknown user" path costs the same as the "wrong password" path.
    pub async fn verify_dummy(&self, password: String) {
        match self.dummy_hash().await {
            Ok(hash) => {
                let _ = self.verify(password, hash.clone()).await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to prepare dummy password hash"),
        }
    }
}
