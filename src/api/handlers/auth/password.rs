//! Password hashing and verification using Argon2id.
//!
//! Hashes are PHC strings, so the salt and cost parameters travel with the hash
//! and verification always uses the parameters the hash was created with.

use anyhow::{Context, Result, anyhow};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString, rand_core::OsRng,
    },
};

#[derive(Clone, Default)]
pub struct Hasher {
    argon2: Argon2<'static>,
    // Argon2 verifications that actually ran.
    #[cfg(test)]
    verifications: std::sync::Arc<std::sync::atomic::AtomicUsize>,
}

impl Hasher {
    /// Argon2id with custom cost parameters.
    #[must_use]
    pub fn with_params(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            #[cfg(test)]
            verifications: std::sync::Arc::default(),
        }
    }

    /// Hash a password with a fresh random salt.
    ///
    /// # Errors
    /// Returns an error if Argon2 rejects the input.
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| anyhow!("failed to hash password: {e}"))
    }

    /// Check a password against a stored PHC string.
    ///
    /// A malformed hash is reported as a mismatch.
    #[must_use]
    pub fn verify(&self, password: &str, secret: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(secret) else {
            return false;
        };
        #[cfg(test)]
        self.verifications
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    #[cfg(test)]
    pub(crate) fn verification_count(&self) -> usize {
        self.verifications.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// [`Hasher::hash`] on the blocking pool.
    pub(crate) async fn hash_blocking(&self, password: String) -> Result<String> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .context("password hashing task failed")?
    }

    /// [`Hasher::verify`] on the blocking pool.
    pub(crate) async fn verify_blocking(&self, password: String, secret: String) -> Result<bool> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &secret))
            .await
            .context("password verification task failed")
    }
}

impl std::fmt::Debug for Hasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hasher").finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) fn test_hasher() -> Hasher {
    // Minimum Argon2 cost so tests stay fast; production uses the crate defaults.
    Params::new(Params::MIN_M_COST, Params::MIN_T_COST, Params::MIN_P_COST, None)
        .map(Hasher::with_params)
        .unwrap_or_default()
}
