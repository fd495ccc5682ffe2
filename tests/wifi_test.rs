mod common;

use axum::http::{Method, StatusCode};
use common::{create_business_for, TestApp};
use serde_json::json;

#[tokio::test]
async fn wifi_crud_round_trip() {
    let app = TestApp::new().await;
    let (owner, token) = app.owner().await;
    let (business_id, token) =
        create_business_for(&app, &owner, &token, "wired-cafe", "Wired Cafe").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/wifi",
            Some(json!({
                "business_id": business_id,
                "ssid": "cafe-guest",
                "password": "latte-art",
                "security_type": "wpa",
            })),
            Some(&token),
        )
        .await;
    let network = TestApp::read_json(response, StatusCode::CREATED).await;
    let network_id = network["id"].as_i64().unwrap();
    assert_eq!(network["security_type"], "wpa");
    assert_eq!(network["is_hidden"], false);

    // The password is published verbatim for guests
    assert_eq!(network["password"], "latte-art");

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/wifi/{}", network_id),
            Some(json!({ "password": "new-roast", "is_hidden": true })),
            Some(&token),
        )
        .await;
    let updated = TestApp::read_json(response, StatusCode::OK).await;
    assert_eq!(updated["password"], "new-roast");
    assert_eq!(updated["is_hidden"], true);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/businesses/{}/wifi", business_id),
            None,
            None,
        )
        .await;
    let networks = TestApp::read_json(response, StatusCode::OK).await;
    assert_eq!(networks.as_array().unwrap().len(), 1);

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/wifi/{}", network_id),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/businesses/{}/wifi", business_id),
            None,
            None,
        )
        .await;
    let networks = TestApp::read_json(response, StatusCode::OK).await;
    assert_eq!(networks.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn secured_network_requires_a_password() {
    let app = TestApp::new().await;
    let (owner, token) = app.owner().await;
    let (business_id, token) =
        create_business_for(&app, &owner, &token, "secure-spot", "Secure Spot").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/wifi",
            Some(json!({
                "business_id": business_id,
                "ssid": "locked-down",
                "security_type": "wpa",
            })),
            Some(&token),
        )
        .await;
    let error = TestApp::read_json(response, StatusCode::BAD_REQUEST).await;
    assert!(error["message"].as_str().unwrap().contains("Password"));

    // Open networks skip the password entirely
    let response = app
        .request(
            Method::POST,
            "/api/v1/wifi",
            Some(json!({
                "business_id": business_id,
                "ssid": "open-door",
                "security_type": "nopass",
            })),
            Some(&token),
        )
        .await;
    let network = TestApp::read_json(response, StatusCode::CREATED).await;
    assert_eq!(network["security_type"], "nopass");
    assert!(network["password"].is_null());
}

#[tokio::test]
async fn foreign_owner_cannot_manage_wifi() {
    let app = TestApp::new().await;
    let (owner, token) = app.owner().await;
    let (business_id, _token) =
        create_business_for(&app, &owner, &token, "target-bar", "Target Bar").await;

    let (rival, rival_token) = app.owner().await;
    let (_rival_business, rival_token) =
        create_business_for(&app, &rival, &rival_token, "rival-bar", "Rival Bar").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/wifi",
            Some(json!({
                "business_id": business_id,
                "ssid": "stolen-wifi",
                "password": "hijack",
                "security_type": "wpa",
            })),
            Some(&rival_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
