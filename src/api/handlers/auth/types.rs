//! Request/response types for auth endpoints.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::handlers::error::ApiError;

#[derive(ToSchema, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(ToSchema, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub success: bool,
    pub username: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Auth endpoints report failures as `{success:false, message}`.
pub(crate) fn message_error(err: ApiError) -> Response {
    let status = err.status();
    let body = MessageResponse {
        success: false,
        message: err.public_message(),
    };
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    #[test]
    fn register_request_debug_hides_password() {
        let request = RegisterRequest {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "hunter22-secret".to_string(),
        };
        let debug = format!("{request:?}");
        assert!(debug.contains("alice@example.com"));
        assert!(!debug.contains("hunter22-secret"));
    }

    #[test]
    fn verify_response_omits_missing_username() -> Result<()> {
        let anonymous = serde_json::to_value(VerifyResponse {
            success: false,
            username: None,
        })?;
        assert_eq!(anonymous, serde_json::json!({ "success": false }));

        let authenticated = serde_json::to_value(VerifyResponse {
            success: true,
            username: Some("alice".to_string()),
        })?;
        let username = authenticated
            .get("username")
            .and_then(serde_json::Value::as_str)
            .context("missing username")?;
        assert_eq!(username, "alice");
        Ok(())
    }

    #[test]
    fn login_request_tolerates_missing_fields() -> Result<()> {
        let request: LoginRequest = serde_json::from_str("{}")?;
        assert!(request.email.is_empty());
        assert!(request.password.is_empty());
        Ok(())
    }
}
