mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn register_login_and_inspect_session() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/auth/register",
            Some(json!({
                "email": "maria@example.com",
                "password": "correct-horse-battery",
                "display_name": "Maria",
            })),
            None,
        )
        .await;
    let tokens = TestApp::read_json(response, StatusCode::CREATED).await;
    assert_eq!(tokens["token_type"], "Bearer");

    let response = app
        .request(
            Method::POST,
            "/auth/login",
            Some(json!({
                "email": "maria@example.com",
                "password": "correct-horse-battery",
            })),
            None,
        )
        .await;
    let tokens = TestApp::read_json(response, StatusCode::OK).await;
    let access = tokens["access_token"].as_str().unwrap().to_string();

    // The session contract: who am I, what can I manage
    let response = app
        .request(Method::GET, "/auth/session", None, Some(&access))
        .await;
    let session = TestApp::read_json(response, StatusCode::OK).await;
    assert_eq!(session["role"], "owner");
    assert!(session["business_id"].is_null());
    assert!(session["user_id"].is_i64());
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/auth/register",
            Some(json!({
                "email": "sam@example.com",
                "password": "right-password",
                "display_name": "Sam",
            })),
            None,
        )
        .await;
    TestApp::read_json(response, StatusCode::CREATED).await;

    let response = app
        .request(
            Method::POST,
            "/auth/login",
            Some(json!({
                "email": "sam@example.com",
                "password": "wrong-password",
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_rotates_and_old_token_dies() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/auth/register",
            Some(json!({
                "email": "kim@example.com",
                "password": "rotating-secret",
                "display_name": "Kim",
            })),
            None,
        )
        .await;
    let tokens = TestApp::read_json(response, StatusCode::CREATED).await;
    let refresh = tokens["refresh_token"].as_str().unwrap().to_string();

    let response = app
        .request(
            Method::POST,
            "/auth/refresh",
            Some(json!({ "refresh_token": refresh })),
            None,
        )
        .await;
    let renewed = TestApp::read_json(response, StatusCode::OK).await;
    assert!(renewed["access_token"].is_string());

    // The first refresh token was single-use
    let response = app
        .request(
            Method::POST,
            "/auth/refresh",
            Some(json!({ "refresh_token": refresh })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/auth/register",
            Some(json!({
                "email": "dupe@example.com",
                "password": "first-in-wins",
                "display_name": "Dupe",
            })),
            None,
        )
        .await;
    TestApp::read_json(response, StatusCode::CREATED).await;

    let response = app
        .request(
            Method::POST,
            "/auth/register",
            Some(json!({
                "email": "dupe@example.com",
                "password": "second-too-late",
                "display_name": "Dupe Again",
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn admin_moderates_users_but_not_themselves() {
    let app = TestApp::new().await;
    let (admin, admin_token) = app.admin().await;
    let (target, _target_token) = app.owner().await;

    let response = app
        .request(Method::GET, "/api/v1/users", None, Some(&admin_token))
        .await;
    let users = TestApp::read_json(response, StatusCode::OK).await;
    assert!(users.as_array().unwrap().len() >= 2);

    // Promote the owner to admin
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/users/{}/role", target.id),
            Some(json!({ "role": "admin" })),
            Some(&admin_token),
        )
        .await;
    let updated = TestApp::read_json(response, StatusCode::OK).await;
    assert_eq!(updated["role"], "admin");

    // Deactivate the other account
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/users/{}/deactivate", target.id),
            None,
            Some(&admin_token),
        )
        .await;
    let updated = TestApp::read_json(response, StatusCode::OK).await;
    assert_eq!(updated["is_active"], false);

    // Self-demotion and self-deactivation are rejected
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/users/{}/role", admin.id),
            Some(json!({ "role": "user" })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/users/{}/deactivate", admin.id),
            None,
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn user_listing_is_admin_only() {
    let app = TestApp::new().await;
    let (_owner, owner_token) = app.owner().await;

    let response = app
        .request(Method::GET, "/api/v1/users", None, Some(&owner_token))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
