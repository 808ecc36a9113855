use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{error, instrument};

use super::{
    cookie::session_cookie,
    gate::{self, LoginOutcome},
    state::AuthState,
    types::{LoginRequest, LoginResponse, MessageResponse, message_error},
    utils::now_unix_seconds,
};
use crate::{api::handlers::error::ApiError, store::SharedStore};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated; session cookie set", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = MessageResponse),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login(
    store: Extension<SharedStore>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> impl IntoResponse {
    // A body that does not parse is treated like any other bad credential.
    let request = payload.map_or_else(
        |_| LoginRequest {
            email: String::new(),
            password: String::new(),
        },
        |Json(request)| request,
    );

    let outcome = gate::login(
        store.0.as_ref(),
        &auth_state,
        &request.email,
        request.password,
        now_unix_seconds(),
    )
    .await;

    match outcome {
        Ok(LoginOutcome::Authenticated { username, token }) => {
            let cookie = match session_cookie(auth_state.config(), &token) {
                Ok(cookie) => cookie,
                Err(err) => {
                    error!("Failed to build session cookie: {err}");
                    return message_error(ApiError::Internal(err.into()));
                }
            };
            let mut headers = HeaderMap::new();
            headers.insert(SET_COOKIE, cookie);
            (
                StatusCode::OK,
                headers,
                Json(LoginResponse {
                    success: true,
                    username,
                }),
            )
                .into_response()
        }
        Ok(LoginOutcome::InvalidCredentials) => (
            StatusCode::UNAUTHORIZED,
            Json(MessageResponse {
                success: false,
                message: INVALID_CREDENTIALS.to_string(),
            }),
        )
            .into_response(),
        Err(err) => message_error(err),
    }
}
