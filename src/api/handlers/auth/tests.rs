//! Auth endpoint tests, driven through the full router.

use super::{AuthConfig, SESSION_COOKIE_NAME};
use crate::api::handlers::test_support::{TestApp, cookie_pair, json_body};
use anyhow::{Context, Result};
use axum::{
    body::to_bytes,
    http::{StatusCode, header::SET_COOKIE},
};
use serde_json::{Value, json};

fn set_cookie(response: &axum::response::Response) -> Result<String> {
    Ok(response
        .headers()
        .get(SET_COOKIE)
        .context("missing Set-Cookie")?
        .to_str()?
        .to_string())
}

#[tokio::test]
async fn register_login_verify_logout() -> Result<()> {
    let app = TestApp::new()?;

    let response = app
        .send(
            "POST",
            "/register",
            None,
            Some(json!({ "username": "alice", "email": "alice@example.com", "password": "correct horse" })),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        json_body(response).await?,
        json!({ "success": true, "message": "User registered successfully" })
    );

    let response = app
        .send(
            "POST",
            "/login",
            None,
            Some(json!({ "email": "alice@example.com", "password": "correct horse" })),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let header = set_cookie(&response)?;
    assert!(header.starts_with(&format!("{SESSION_COOKIE_NAME}=")));
    assert!(header.contains("HttpOnly"));
    assert!(header.contains("SameSite=Strict"));
    assert!(header.contains("Path=/"));
    assert!(header.contains("Max-Age=604800"));
    assert!(!header.contains("Secure"));
    let cookie = cookie_pair(&response).context("missing cookie pair")?;
    assert_eq!(
        json_body(response).await?,
        json!({ "success": true, "username": "alice" })
    );

    let response = app.send("GET", "/auth/verify", Some(&cookie), None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await?,
        json!({ "success": true, "username": "alice" })
    );

    let response = app.send("POST", "/logout", Some(&cookie), None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let cleared = cookie_pair(&response).context("logout did not clear the cookie")?;
    assert!(set_cookie(&response)?.contains("Max-Age=0"));
    assert_eq!(json_body(response).await?, json!({ "success": true }));

    // The client now holds the cleared cookie.
    let response = app.send("GET", "/auth/verify", Some(&cleared), None).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await?, json!({ "success": false }));
    Ok(())
}

#[tokio::test]
async fn failed_logins_are_byte_identical() -> Result<()> {
    let app = TestApp::new()?;
    app.register_and_login("alice", "alice@example.com", "correct horse")
        .await?;

    let mut bodies = Vec::new();
    for body in [
        json!({ "email": "alice@example.com", "password": "wrong password" }),
        json!({ "email": "nobody@example.com", "password": "correct horse" }),
        json!({ "email": "alice@example.com" }),
        json!("not an object"),
    ] {
        let response = app.send("POST", "/login", None, Some(body)).await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(SET_COOKIE).is_none());
        bodies.push(to_bytes(response.into_body(), usize::MAX).await?);
    }

    let expected = serde_json::to_vec(&json!({ "success": false, "message": "Invalid credentials" }))?;
    for body in bodies {
        assert_eq!(body.as_ref(), expected.as_slice());
    }
    Ok(())
}

#[tokio::test]
async fn duplicate_registration_conflicts() -> Result<()> {
    let app = TestApp::new()?;
    app.register_and_login("alice", "alice@example.com", "correct horse")
        .await?;

    let response = app
        .send(
            "POST",
            "/register",
            None,
            Some(json!({ "username": "alice2", "email": "alice@example.com", "password": "other password" })),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        json_body(response).await?,
        json!({ "success": false, "message": "User already exists" })
    );
    assert_eq!(app.store.user_count().await, 1);
    Ok(())
}

#[tokio::test]
async fn register_rejects_bad_input() -> Result<()> {
    let app = TestApp::new()?;
    for body in [
        json!({ "username": "alice", "email": "not-an-email", "password": "correct horse" }),
        json!({ "username": "alice", "email": "alice@example.com", "password": "short" }),
        json!({ "email": "alice@example.com", "password": "correct horse" }),
    ] {
        let response = app.send("POST", "/register", None, Some(body)).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await?;
        assert_eq!(body["success"], Value::Bool(false));
        assert!(body["message"].is_string());
    }
    assert_eq!(app.store.user_count().await, 0);
    Ok(())
}

#[tokio::test]
async fn verify_without_cookie_is_anonymous() -> Result<()> {
    let app = TestApp::new()?;
    for cookie in [None, Some("token="), Some("token=garbage"), Some("other=1")] {
        let response = app.send("GET", "/auth/verify", cookie, None).await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await?, json!({ "success": false }));
    }
    Ok(())
}

#[tokio::test]
async fn logout_without_session_still_succeeds() -> Result<()> {
    let app = TestApp::new()?;
    let response = app.send("POST", "/logout", None, None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response)?.contains("Expires=Thu, 01 Jan 1970 00:00:00 GMT"));
    Ok(())
}

#[tokio::test]
async fn logout_does_not_revoke_copied_tokens() -> Result<()> {
    let app = TestApp::new()?;
    let cookie = app
        .register_and_login("alice", "alice@example.com", "correct horse")
        .await?;
    app.send("POST", "/logout", Some(&cookie), None).await?;

    // No server-side revocation: a copy of the old cookie is still valid.
    let response = app.send("GET", "/auth/verify", Some(&cookie), None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn https_frontend_gets_secure_cookie() -> Result<()> {
    let app = TestApp::with_config(AuthConfig::new("https://focusmate.dev".to_string()))?;
    app.send(
        "POST",
        "/register",
        None,
        Some(json!({ "username": "alice", "email": "alice@example.com", "password": "correct horse" })),
    )
    .await?;
    let response = app
        .send(
            "POST",
            "/login",
            None,
            Some(json!({ "email": "alice@example.com", "password": "correct horse" })),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response)?.ends_with("; Secure"));
    Ok(())
}

#[tokio::test]
async fn session_cookie_unlocks_records() -> Result<()> {
    let app = TestApp::new()?;
    let cookie = app
        .register_and_login("alice", "alice@example.com", "correct horse")
        .await?;
    let response = app
        .send("POST", "/task", Some(&cookie), Some(json!({ "title": "Ship it" })))
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .send("POST", "/task", None, Some(json!({ "title": "Ship it" })))
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
