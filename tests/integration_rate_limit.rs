#![allow(clippy::unwrap_used, clippy::panic, clippy::missing_panics_doc, missing_debug_implementations, unreachable_pub)]
use reqwest::StatusCode;
use serde_json::json;

mod common;

#[tokio::test]
async fn test_auth_tier_is_throttled() {
    let mut config = common::get_test_config();
    config.rate_limit.auth_per_second = 1;
    config.rate_limit.auth_burst = 2;
    let app = common::TestApp::spawn_with_config(config).await;

    let mut statuses = Vec::new();
    for _ in 0..4 {
        let resp = app
            .client
            .post(app.url("/user/login"))
            .json(&json!({ "email": "nobody@example.com", "password": "password123" }))
            .send()
            .await
            .unwrap();
        statuses.push(resp.status());
    }

    assert_eq!(statuses[0], StatusCode::UNAUTHORIZED);
    assert!(statuses.contains(&StatusCode::TOO_MANY_REQUESTS), "expected throttling, got {statuses:?}");
}

#[tokio::test]
async fn test_auth_throttling_does_not_affect_standard_tier() {
    let mut config = common::get_test_config();
    config.rate_limit.auth_per_second = 1;
    config.rate_limit.auth_burst = 1;
    let app = common::TestApp::spawn_with_config(config).await;
    let user = app.register_user("steady").await;

    let mut throttled = None;
    for _ in 0..3 {
        let resp = app
            .client
            .post(app.url("/user/login"))
            .json(&json!({ "email": "nobody@example.com", "password": "password123" }))
            .send()
            .await
            .unwrap();
        if resp.status() == StatusCode::TOO_MANY_REQUESTS {
            throttled = Some(resp);
            break;
        }
    }
    let throttled = throttled.expect("auth tier should throttle");
    assert!(throttled.headers().contains_key("retry-after"));

    let resp = app.get("/user/me", &user.token).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
