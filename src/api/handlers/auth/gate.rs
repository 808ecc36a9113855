//! Registration, login and session verification.
//!
//! Flow Overview:
//! 1) `register` validates input, hashes the password and persists the user.
//! 2) `login` verifies the password and issues a signed token.
//! 3) `verify` resolves the request cookie to [`AuthOutcome`].
//!
//! Every failure on the login and verify paths collapses to a single outcome so
//! callers cannot tell an unknown email from a wrong password, or a missing
//! cookie from a forged or expired one.

use anyhow::anyhow;
use axum::http::HeaderMap;
use tracing::{debug, instrument};

use super::{
    cookie::extract_session_token,
    state::AuthState,
    utils::{normalize_email, valid_email, valid_username},
};
use crate::{
    api::handlers::error::ApiError,
    store::{CredentialStore, NewUser, SignupOutcome},
};

pub(crate) const USER_EXISTS: &str = "User already exists";
const MIN_PASSWORD_LEN: usize = 8;

/// Result of resolving a request's session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated(String),
    Anonymous,
}

#[derive(Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated { username: String, token: String },
    InvalidCredentials,
}

/// Create a user. No session is issued.
///
/// # Errors
/// `Validation` for malformed input, `Conflict` when the email or username is
/// taken, `Internal` for storage or hashing failures.
#[instrument(skip(store, auth, registration), fields(username = %registration.username))]
pub async fn register<S>(
    store: &S,
    auth: &AuthState,
    registration: Registration,
) -> Result<(), ApiError>
where
    S: CredentialStore + ?Sized,
{
    let username = registration.username.trim().to_string();
    let email = normalize_email(&registration.email);

    if !valid_username(&username) {
        return Err(ApiError::Validation("Invalid username".to_string()));
    }
    if !valid_email(&email) {
        return Err(ApiError::Validation("Invalid email".to_string()));
    }
    if registration.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    // Skip the expensive hash for the common duplicate case; the store still
    // decides races.
    if store.find_by_email(&email).await?.is_some() {
        debug!("Email already registered");
        return Err(ApiError::Conflict(USER_EXISTS.to_string()));
    }

    let password_hash = auth.hasher().hash_blocking(registration.password).await?;
    let outcome = store
        .insert_user(NewUser {
            username,
            email,
            password_hash,
        })
        .await?;

    match outcome {
        SignupOutcome::Created => Ok(()),
        SignupOutcome::Conflict => Err(ApiError::Conflict(USER_EXISTS.to_string())),
    }
}

/// Check credentials and mint a session token.
///
/// # Errors
/// Only storage, hashing or token encoding failures. Bad credentials are an
/// `Ok(LoginOutcome::InvalidCredentials)`.
#[instrument(skip_all)]
pub async fn login<S>(
    store: &S,
    auth: &AuthState,
    email: &str,
    password: String,
    now: i64,
) -> Result<LoginOutcome, ApiError>
where
    S: CredentialStore + ?Sized,
{
    let email = normalize_email(email);
    let record = store.find_by_email(&email).await?;

    // Unknown emails still pay for one verification.
    let (stored_hash, username) = match record {
        Some(record) => (record.password_hash, Some(record.username)),
        None => (auth.dummy_hash().to_string(), None),
    };
    let matches = auth.hasher().verify_blocking(password, stored_hash).await?;

    let Some(username) = username.filter(|_| matches) else {
        debug!("Login rejected");
        return Ok(LoginOutcome::InvalidCredentials);
    };

    let token = auth
        .codec()
        .issue(&username, now)
        .map_err(|err| ApiError::Internal(anyhow!("failed to issue session token: {err}")))?;

    Ok(LoginOutcome::Authenticated { username, token })
}

/// Resolve the session cookie on a request.
#[must_use]
pub fn verify(auth: &AuthState, headers: &HeaderMap, now: i64) -> AuthOutcome {
    let Some(token) = extract_session_token(headers) else {
        return AuthOutcome::Anonymous;
    };
    match auth.codec().validate(&token, now) {
        Ok(claims) => AuthOutcome::Authenticated(claims.username),
        Err(err) => {
            debug!("Session token rejected: {err}");
            AuthOutcome::Anonymous
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::handlers::auth::{
            cookie::SESSION_COOKIE_NAME, password::test_hasher, state::AuthConfig,
            token::SigningKey,
        },
        store::MemoryStore,
    };
    use anyhow::{Result, bail};
    use axum::http::{HeaderValue, header::COOKIE};

    const T0: i64 = 1_700_000_000;
    const WEEK: i64 = 604_800;

    fn auth_state() -> Result<AuthState> {
        AuthState::with_hasher(
            AuthConfig::new("http://localhost:3000".to_string()),
            SigningKey::generate(),
            test_hasher(),
        )
    }

    fn registration(username: &str, email: &str, password: &str) -> Registration {
        Registration {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn cookie_headers(token: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("{SESSION_COOKIE_NAME}={token}"))?,
        );
        Ok(headers)
    }

    async fn login_token(
        store: &MemoryStore,
        auth: &AuthState,
        email: &str,
        password: &str,
    ) -> Result<String> {
        match login(store, auth, email, password.to_string(), T0).await? {
            LoginOutcome::Authenticated { token, .. } => Ok(token),
            LoginOutcome::InvalidCredentials => bail!("login rejected"),
        }
    }

    #[tokio::test]
    async fn register_then_login_authenticates() -> Result<()> {
        let store = MemoryStore::new();
        let auth = auth_state()?;
        register(
            &store,
            &auth,
            registration("alice", "alice@example.com", "correct horse"),
        )
        .await?;

        let outcome = login(
            &store,
            &auth,
            "alice@example.com",
            "correct horse".to_string(),
            T0,
        )
        .await?;
        let LoginOutcome::Authenticated { username, token } = outcome else {
            bail!("expected authenticated login");
        };
        assert_eq!(username, "alice");
        assert_eq!(
            verify(&auth, &cookie_headers(&token)?, T0 + 1),
            AuthOutcome::Authenticated("alice".to_string())
        );
        Ok(())
    }

    #[tokio::test]
    async fn stored_secret_is_not_the_password() -> Result<()> {
        let store = MemoryStore::new();
        let auth = auth_state()?;
        register(
            &store,
            &auth,
            registration("alice", "alice@example.com", "correct horse"),
        )
        .await?;
        let record = store.find_by_email("alice@example.com").await?;
        let Some(record) = record else {
            bail!("user not stored");
        };
        assert_ne!(record.password_hash, "correct horse");
        assert!(record.password_hash.starts_with("$argon2id$"));
        Ok(())
    }

    #[tokio::test]
    async fn login_normalizes_email() -> Result<()> {
        let store = MemoryStore::new();
        let auth = auth_state()?;
        register(
            &store,
            &auth,
            registration("alice", " Alice@Example.com ", "correct horse"),
        )
        .await?;
        login_token(&store, &auth, "ALICE@example.com", "correct horse").await?;
        Ok(())
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_indistinguishable() -> Result<()> {
        let store = MemoryStore::new();
        let auth = auth_state()?;
        register(
            &store,
            &auth,
            registration("alice", "alice@example.com", "correct horse"),
        )
        .await?;

        let wrong_password = login(
            &store,
            &auth,
            "alice@example.com",
            "battery staple".to_string(),
            T0,
        )
        .await?;
        let unknown_email = login(
            &store,
            &auth,
            "nobody@example.com",
            "correct horse".to_string(),
            T0,
        )
        .await?;
        let empty = login(&store, &auth, "", String::new(), T0).await?;

        assert_eq!(wrong_password, LoginOutcome::InvalidCredentials);
        assert_eq!(unknown_email, wrong_password);
        assert_eq!(empty, wrong_password);
        Ok(())
    }

    #[tokio::test]
    async fn every_failed_login_runs_one_verification() -> Result<()> {
        let store = MemoryStore::new();
        let auth = auth_state()?;
        register(
            &store,
            &auth,
            registration("alice", "alice@example.com", "correct horse"),
        )
        .await?;
        assert_eq!(auth.hasher().verification_count(), 0);

        for (attempt, (email, password)) in [
            ("alice@example.com", "battery staple"),
            ("nobody@example.com", "correct horse"),
            ("", ""),
        ]
        .into_iter()
        .enumerate()
        {
            let outcome = login(&store, &auth, email, password.to_string(), T0).await?;
            assert_eq!(outcome, LoginOutcome::InvalidCredentials);
            assert_eq!(auth.hasher().verification_count(), attempt + 1, "{email:?}");
        }

        // The unknown-email path verifies against the startup dummy hash.
        assert!(auth.dummy_hash().starts_with("$argon2id$"));
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_email_conflicts_and_keeps_one_record() -> Result<()> {
        let store = MemoryStore::new();
        let auth = auth_state()?;
        register(
            &store,
            &auth,
            registration("alice", "alice@example.com", "correct horse"),
        )
        .await?;

        let second = register(
            &store,
            &auth,
            registration("alice2", "ALICE@example.com", "another password"),
        )
        .await;
        assert!(matches!(second, Err(ApiError::Conflict(message)) if message == USER_EXISTS));
        assert_eq!(store.user_count().await, 1);

        // original password still works
        login_token(&store, &auth, "alice@example.com", "correct horse").await?;
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() -> Result<()> {
        let store = MemoryStore::new();
        let auth = auth_state()?;
        register(
            &store,
            &auth,
            registration("alice", "alice@example.com", "correct horse"),
        )
        .await?;
        let second = register(
            &store,
            &auth,
            registration("alice", "other@example.com", "correct horse"),
        )
        .await;
        assert!(matches!(second, Err(ApiError::Conflict(_))));
        Ok(())
    }

    #[tokio::test]
    async fn register_validates_input() -> Result<()> {
        let store = MemoryStore::new();
        let auth = auth_state()?;
        for (username, email, password) in [
            ("", "alice@example.com", "correct horse"),
            ("alice", "not-an-email", "correct horse"),
            ("alice", "alice@example.com", "short"),
        ] {
            let result = register(&store, &auth, registration(username, email, password)).await;
            assert!(matches!(result, Err(ApiError::Validation(_))));
        }
        assert_eq!(store.user_count().await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn session_expires_after_window() -> Result<()> {
        let store = MemoryStore::new();
        let auth = auth_state()?;
        register(
            &store,
            &auth,
            registration("alice", "alice@example.com", "correct horse"),
        )
        .await?;
        let token = login_token(&store, &auth, "alice@example.com", "correct horse").await?;
        let headers = cookie_headers(&token)?;

        assert_eq!(
            verify(&auth, &headers, T0 + WEEK - 1),
            AuthOutcome::Authenticated("alice".to_string())
        );
        assert_eq!(verify(&auth, &headers, T0 + WEEK), AuthOutcome::Anonymous);
        Ok(())
    }

    #[test]
    fn missing_and_forged_cookies_are_anonymous() -> Result<()> {
        let auth = auth_state()?;
        assert_eq!(verify(&auth, &HeaderMap::new(), T0), AuthOutcome::Anonymous);
        assert_eq!(
            verify(&auth, &cookie_headers("eyJ1c2VybmFtZSI6ImEifQ.forged")?, T0),
            AuthOutcome::Anonymous
        );
        Ok(())
    }

    #[test]
    fn registration_debug_redacts_password() {
        let debug = format!(
            "{:?}",
            registration("alice", "alice@example.com", "hunter22-secret")
        );
        assert!(!debug.contains("hunter22-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
