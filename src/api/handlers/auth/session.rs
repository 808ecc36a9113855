//! Session endpoints: verify and logout.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::error;

use super::{
    cookie::clear_session_cookie,
    gate::{AuthOutcome, verify},
    state::AuthState,
    types::{SuccessResponse, VerifyResponse},
    utils::now_unix_seconds,
};

#[utoipa::path(
    get,
    path = "/auth/verify",
    responses(
        (status = 200, description = "Session is active", body = VerifyResponse),
        (status = 401, description = "No valid session", body = VerifyResponse)
    ),
    tag = "auth"
)]
pub async fn verify_session(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    match verify(&auth_state, &headers, now_unix_seconds()) {
        AuthOutcome::Authenticated(username) => (
            StatusCode::OK,
            Json(VerifyResponse {
                success: true,
                username: Some(username),
            }),
        ),
        AuthOutcome::Anonymous => (
            StatusCode::UNAUTHORIZED,
            Json(VerifyResponse {
                success: false,
                username: None,
            }),
        ),
    }
}

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 200, description = "Session cookie cleared", body = SuccessResponse)
    ),
    tag = "auth"
)]
pub async fn logout(auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    // Tokens are not tracked server-side; clearing the cookie is all there is.
    let mut headers = HeaderMap::new();
    match clear_session_cookie(auth_state.config()) {
        Ok(cookie) => {
            headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => error!("Failed to build logout cookie: {err}"),
    }
    (StatusCode::OK, headers, Json(SuccessResponse { success: true }))
}
