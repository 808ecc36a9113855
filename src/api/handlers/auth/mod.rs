//! Auth handlers and supporting modules.
//!
//! This module covers password registration, login, session verification and
//! logout.
//!
//! ## Session tokens
//!
//! A login mints a token signed with HMAC-SHA256 under a process-wide key and
//! sends it in the `token` cookie (`HttpOnly`, `SameSite=Strict`, `Secure` when
//! the frontend is served over HTTPS). The server keeps no session table, so
//! logout only clears the cookie.
//!
//! > **Warning:** Rotating the signing key invalidates every outstanding session.
//!
//! ## Passwords
//!
//! Passwords are hashed with Argon2id on the blocking pool. Logins for unknown
//! emails verify against a dummy hash generated at startup so both failure
//! paths take the same time.

mod cookie;
pub(crate) mod gate;
pub(crate) mod login;
mod password;
pub(crate) mod principal;
pub(crate) mod register;
pub(crate) mod session;
mod state;
mod token;
pub(crate) mod types;
mod utils;

pub use cookie::SESSION_COOKIE_NAME;
pub use gate::{AuthOutcome, LoginOutcome, Registration};
pub use password::Hasher;
pub use principal::Principal;
pub use state::{AuthConfig, AuthState};
pub use token::{
    DEFAULT_SESSION_TTL_SECONDS, MIN_SIGNING_KEY_LEN, SessionClaims, SigningKey, TokenCodec,
    TokenError,
};

#[cfg(test)]
pub(crate) use password::test_hasher;
#[cfg(test)]
pub(crate) use utils::now_unix_seconds;

#[cfg(test)]
mod tests;
