//! Router harness for handler tests, backed by the in-memory store.

use anyhow::{Context, Result};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{
        Request,
        header::{CONTENT_TYPE, COOKIE, SET_COOKIE},
    },
    response::Response,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use super::auth::{
    AuthConfig, AuthState, SESSION_COOKIE_NAME, SigningKey, now_unix_seconds, test_hasher,
};
use crate::{
    api,
    store::{MemoryStore, SharedStore},
};

pub(crate) struct TestApp {
    pub(crate) router: Router,
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) auth: Arc<AuthState>,
}

impl TestApp {
    pub(crate) fn new() -> Result<Self> {
        Self::with_config(AuthConfig::new("http://localhost:3000".to_string()))
    }

    pub(crate) fn with_config(config: AuthConfig) -> Result<Self> {
        let store = Arc::new(MemoryStore::new());
        let auth = Arc::new(AuthState::with_hasher(
            config,
            SigningKey::generate(),
            test_hasher(),
        )?);
        let shared: SharedStore = store.clone();
        let router = api::app(shared, auth.clone())?;
        Ok(Self {
            router,
            store,
            auth,
        })
    }

    /// A `Cookie` header value holding a fresh token for `username`.
    pub(crate) fn signed_in(&self, username: &str) -> Result<String> {
        let token = self
            .auth
            .codec()
            .issue(username, now_unix_seconds())
            .context("issue test token")?;
        Ok(format!("{SESSION_COOKIE_NAME}={token}"))
    }

    /// Register and log in through the HTTP endpoints, returning the cookie pair.
    pub(crate) async fn register_and_login(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<String> {
        let body = json!({ "username": username, "email": email, "password": password });
        let response = self.send("POST", "/register", None, Some(body)).await?;
        anyhow::ensure!(
            response.status().is_success(),
            "register failed: {}",
            response.status()
        );

        let body = json!({ "email": email, "password": password });
        let response = self.send("POST", "/login", None, Some(body)).await?;
        cookie_pair(&response).context("login did not set a session cookie")
    }

    pub(crate) async fn send(
        &self,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> Result<Response> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };
        Ok(self.router.clone().oneshot(request).await?)
    }
}

pub(crate) async fn json_body(response: Response) -> Result<Value> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    serde_json::from_slice(&bytes).context("response body is not JSON")
}

/// The `name=value` part of the response's `Set-Cookie` header.
pub(crate) fn cookie_pair(response: &Response) -> Option<String> {
    let header = response.headers().get(SET_COOKIE)?.to_str().ok()?;
    header.split(';').next().map(str::to_string)
}
