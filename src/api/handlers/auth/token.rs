//! Signed session tokens.
//!
//! Format: `base64url(payload) "." base64url(HMAC-SHA256(payload segment))`, both
//! unpadded. The payload is JSON `{"username", "iat", "exp"}` in unix seconds. The
//! MAC covers the encoded payload segment exactly as sent, so any change to the
//! claim or expiry invalidates the token.

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use rand::{RngCore, rngs::OsRng};
use secrecy::{ExposeSecret, SecretSlice, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;
pub const MIN_SIGNING_KEY_LEN: usize = 32;
const SIGNATURE_LEN: usize = 32;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid token format")]
    Format,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid signature")]
    Signature,
    #[error("invalid payload")]
    Payload,
    #[error("token expired")]
    Expired,
    #[error("signing key must be at least 32 bytes")]
    KeyLength,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// Process-wide HMAC key. Rotating it invalidates every outstanding token.
#[derive(Debug)]
pub struct SigningKey(SecretSlice<u8>);

impl SigningKey {
    /// # Errors
    /// Returns [`TokenError::KeyLength`] for keys shorter than 32 bytes.
    pub fn new(bytes: Vec<u8>) -> Result<Self, TokenError> {
        if bytes.len() < MIN_SIGNING_KEY_LEN {
            return Err(TokenError::KeyLength);
        }
        Ok(Self(SecretSlice::from(bytes)))
    }

    /// Use the UTF-8 bytes of a configured secret as the key.
    ///
    /// # Errors
    /// Returns [`TokenError::KeyLength`] for secrets shorter than 32 bytes.
    pub fn from_secret(secret: &SecretString) -> Result<Self, TokenError> {
        Self::new(secret.expose_secret().as_bytes().to_vec())
    }

    /// Random key, for tests and throwaway deployments.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; MIN_SIGNING_KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(SecretSlice::from(bytes))
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(self.0.expose_secret()).map_err(|_| TokenError::KeyLength)
    }
}

#[derive(Debug)]
pub struct TokenCodec {
    key: SigningKey,
    ttl_seconds: i64,
}

impl TokenCodec {
    #[must_use]
    pub fn new(key: SigningKey, ttl_seconds: i64) -> Self {
        Self { key, ttl_seconds }
    }

    #[must_use]
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Mint a token for `username`, valid for `[now, now + ttl)`.
    ///
    /// # Errors
    /// Returns an error if the claims cannot be serialized.
    pub fn issue(&self, username: &str, now: i64) -> Result<String, TokenError> {
        let claims = SessionClaims {
            username: username.to_string(),
            iat: now,
            exp: now.saturating_add(self.ttl_seconds),
        };
        let payload = serde_json::to_vec(&claims).map_err(|_| TokenError::Payload)?;
        let payload = Base64UrlUnpadded::encode_string(&payload);

        let mut mac = self.key.mac()?;
        mac.update(payload.as_bytes());
        let signature = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());

        Ok(format!("{payload}.{signature}"))
    }

    /// Check signature and expiry, returning the claims.
    ///
    /// `now == exp` is already expired.
    ///
    /// # Errors
    /// Returns the reason the token was rejected. Callers must not surface it.
    pub fn validate(&self, token: &str, now: i64) -> Result<SessionClaims, TokenError> {
        let (payload, encoded_signature) = token.split_once('.').ok_or(TokenError::Format)?;
        if payload.is_empty() || encoded_signature.is_empty() {
            return Err(TokenError::Format);
        }

        let signature =
            Base64UrlUnpadded::decode_vec(encoded_signature).map_err(|_| TokenError::Base64)?;
        // reject alternate encodings of the same signature bytes
        if signature.len() != SIGNATURE_LEN
            || Base64UrlUnpadded::encode_string(&signature) != encoded_signature
        {
            return Err(TokenError::Signature);
        }

        let mut mac = self.key.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::Signature)?;

        let payload = Base64UrlUnpadded::decode_vec(payload).map_err(|_| TokenError::Base64)?;
        let claims: SessionClaims =
            serde_json::from_slice(&payload).map_err(|_| TokenError::Payload)?;

        if now >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}
