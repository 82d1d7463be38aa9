#![allow(clippy::unwrap_used, clippy::panic, clippy::missing_panics_doc, missing_debug_implementations, unreachable_pub)]
use reqwest::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

mod common;

#[tokio::test]
async fn test_register_login_and_me() {
    let app = common::TestApp::spawn().await;
    let email = format!("Ada_{}@Example.com", &Uuid::new_v4().simple().to_string()[..8]);

    let resp = app
        .client
        .post(app.url("/user/register"))
        .json(&json!({ "email": email, "password": "password123", "firstName": "Ada", "lastName": "Lovelace" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = resp.json().await.unwrap();
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert!(body["expiresAt"].as_i64().unwrap() > 0);
    assert_eq!(body["user"]["email"], email.to_lowercase());
    assert_eq!(body["user"]["firstName"], "Ada");
    assert!(body["user"].get("passwordHash").is_none());

    let resp = app
        .client
        .post(app.url("/user/login"))
        .json(&json!({ "email": email.to_uppercase(), "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let login: Value = resp.json().await.unwrap();
    let token = login["token"].as_str().unwrap();

    let resp = app.get("/user/me", token).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let me: Value = resp.json().await.unwrap();
    assert_eq!(me["id"], body["user"]["id"]);
    assert_eq!(me["lastName"], "Lovelace");
    assert!(me["createdAt"].as_i64().unwrap() > 0);
    assert_eq!(me["createdAt"], body["user"]["createdAt"]);
}

#[tokio::test]
async fn test_register_accepts_lowercase_name_fields() {
    let app = common::TestApp::spawn().await;
    let email = format!("legacy_{}@example.com", &Uuid::new_v4().simple().to_string()[..8]);

    let resp = app
        .client
        .post(app.url("/user/register"))
        .json(&json!({ "email": email, "password": "password123", "firstname": "Grace", "lastname": "Hopper" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["user"]["firstName"], "Grace");
    assert_eq!(body["user"]["lastName"], "Hopper");
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_bad_input() {
    let app = common::TestApp::spawn().await;
    let user = app.register_user("dup").await;

    let resp = app
        .client
        .post(app.url("/user/register"))
        .json(&json!({ "email": user.email, "password": "password123", "firstName": "A", "lastName": "B" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "User already exists");

    let cases = [
        json!({ "email": "not-an-email", "password": "password123", "firstName": "A", "lastName": "B" }),
        json!({ "email": "short@example.com", "password": "short", "firstName": "A", "lastName": "B" }),
        json!({ "email": "noname@example.com", "password": "password123", "firstName": "  ", "lastName": "B" }),
    ];
    for payload in cases {
        let resp = app.client.post(app.url("/user/register")).json(&payload).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "payload {payload} should be rejected");
    }
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = common::TestApp::spawn().await;

    let resp = app
        .client
        .post(app.url("/user/register"))
        .header("Content-Type", "application/json")
        .body("{\"email\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());

    let resp =
        app.client.post(app.url("/user/login")).json(&json!({ "email": 42, "password": [] })).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_login_failures_are_unauthorized() {
    let app = common::TestApp::spawn().await;
    let user = app.register_user("login").await;

    for (email, password) in [(user.email.as_str(), "wrong-password"), ("nobody@example.com", "password123")] {
        let resp = app
            .client
            .post(app.url("/user/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Invalid email or password");
    }
}

#[tokio::test]
async fn test_protected_routes_require_valid_token() {
    let app = common::TestApp::spawn().await;
    let user = app.register_user("guard").await;

    let resp = app.client.get(app.url("/user/me")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app.client.get(app.url("/user/me")).header("Authorization", "Token abc").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let mut tampered = user.token.clone();
    tampered.push('x');
    let resp = app.get("/user/me", &tampered).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Invalid or expired token");
}

#[tokio::test]
async fn test_token_from_other_secret_is_rejected() {
    let app = common::TestApp::spawn().await;

    let mut config = common::get_test_config();
    config.auth.jwt_secret = "a_different_secret".to_string();
    let other = common::TestApp::spawn_with_config(config).await;
    let foreign = other.register_user("foreign").await;

    let resp = app.get("/user/me", &foreign.token).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
