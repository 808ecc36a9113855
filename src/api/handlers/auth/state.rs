//! Auth state and configuration.

use anyhow::Result;
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{RngCore, rngs::OsRng};

use super::{
    password::Hasher,
    token::{DEFAULT_SESSION_TTL_SECONDS, SigningKey, TokenCodec},
};

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    session_ttl_seconds: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    pub(crate) fn session_cookie_secure(&self) -> bool {
        self.frontend_base_url.starts_with("https://")
    }
}

/// Read-only auth state shared by every request.
pub struct AuthState {
    config: AuthConfig,
    codec: TokenCodec,
    hasher: Hasher,
    // verified against when the email is unknown
    dummy_hash: String,
}

impl AuthState {
    /// # Errors
    /// Returns an error if the dummy password hash cannot be computed.
    pub fn new(config: AuthConfig, key: SigningKey) -> Result<Self> {
        Self::with_hasher(config, key, Hasher::default())
    }

    /// # Errors
    /// Returns an error if the dummy password hash cannot be computed.
    pub fn with_hasher(config: AuthConfig, key: SigningKey, hasher: Hasher) -> Result<Self> {
        let mut filler = [0u8; 32];
        OsRng.fill_bytes(&mut filler);
        let dummy_hash = hasher.hash(&Base64UrlUnpadded::encode_string(&filler))?;
        let codec = TokenCodec::new(key, config.session_ttl_seconds());

        Ok(Self {
            config,
            codec,
            hasher,
            dummy_hash,
        })
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub(crate) fn hasher(&self) -> &Hasher {
        &self.hasher
    }

    pub(crate) fn dummy_hash(&self) -> &str {
        &self.dummy_hash
    }
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
