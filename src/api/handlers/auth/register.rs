use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::{
    gate::{self, Registration},
    state::AuthState,
    types::{MessageResponse, RegisterRequest, message_error},
};
use crate::{api::handlers::error::ApiError, store::SharedStore};

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = MessageResponse),
        (status = 400, description = "Invalid input", body = MessageResponse),
        (status = 409, description = "Email or username already registered", body = MessageResponse),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn register(
    store: Extension<SharedStore>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return message_error(ApiError::from(rejection)),
    };
    debug!("register: {:?}", request);

    let registration = Registration {
        username: request.username,
        email: request.email,
        password: request.password,
    };

    match gate::register(store.0.as_ref(), &auth_state, registration).await {
        Ok(()) => (
            StatusCode::CREATED,
            Json(MessageResponse {
                success: true,
                message: "User registered successfully".to_string(),
            }),
        )
            .into_response(),
        Err(err) => message_error(err),
    }
}
