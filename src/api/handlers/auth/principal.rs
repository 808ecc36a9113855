//! Authenticated principal extraction.
//!
//! Record handlers take a [`Principal`] argument; requests without a valid
//! session cookie are rejected with `401` before the handler runs.

use axum::{extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;
use tracing::error;

use super::{
    gate::{AuthOutcome, verify},
    state::AuthState,
    utils::now_unix_seconds,
};
use crate::api::handlers::error::ApiError;

/// Authenticated user context derived from the session cookie.
#[derive(Clone, Debug)]
pub struct Principal {
    pub username: String,
}

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(auth) = parts.extensions.get::<Arc<AuthState>>() else {
            error!("AuthState extension missing from router");
            return Err(ApiError::Internal(anyhow::anyhow!("auth state not configured")));
        };
        match verify(auth, &parts.headers, now_unix_seconds()) {
            AuthOutcome::Authenticated(username) => Ok(Self { username }),
            AuthOutcome::Anonymous => Err(ApiError::Unauthorized),
        }
    }
}
