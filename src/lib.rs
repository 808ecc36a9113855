//! # FocusMate
//!
//! `focusmate` is the backend of a personal productivity dashboard: tasks, mood
//! logging and journaling, behind a cookie session.
//!
//! ## Authentication
//!
//! Passwords are stored as Argon2id PHC strings and never leave the server in any
//! form. A successful login mints a signed session token (HMAC-SHA256 over a
//! base64url JSON payload) carried in an `HttpOnly`, `SameSite=Strict` cookie named
//! `token`. Tokens are not tracked server-side: logout clears the cookie, and a
//! copied token stays valid until it expires (7 days by default).
//!
//! Authentication failures are never distinguished to the caller. Unknown email
//! and wrong password produce the same response, and a missing cookie looks the
//! same as a forged or expired one.
//!
//! ## Records
//!
//! Tasks, moods and journal entries are owned by the user that created them.
//! Anonymous callers get `401`, and records owned by someone else answer `404`
//! so that identifiers cannot be enumerated.

pub mod api;
pub mod cli;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
