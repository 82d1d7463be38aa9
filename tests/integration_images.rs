#![allow(clippy::unwrap_used, clippy::panic, clippy::missing_panics_doc, missing_debug_implementations, unreachable_pub)]
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use uuid::Uuid;

mod common;

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-payload";

fn png_part() -> Part {
    Part::bytes(PNG_BYTES.to_vec()).file_name("photo.png").mime_str("image/png").unwrap()
}

async fn send_form(app: &common::TestApp, token: &str, form: Form) -> reqwest::Response {
    app.client.post(app.url("/messages")).bearer_auth(token).multipart(form).send().await.unwrap()
}

async fn put_group_image(app: &common::TestApp, token: &str, group_id: &str, form: Form) -> reqwest::Response {
    app.client.put(app.url(&format!("/groups/{group_id}/image"))).bearer_auth(token).multipart(form).send().await.unwrap()
}

#[tokio::test]
async fn test_direct_message_with_image() {
    let app = common::TestApp::spawn().await;
    let alice = app.register_user("alice").await;
    let bob = app.register_user("bob").await;
    let eve = app.register_user("eve").await;

    let form = Form::new()
        .text("contents", "look at this")
        .text("recipient", bob.user_id.to_string())
        .part("image", png_part());
    let resp = send_form(&app, &alice.token, form).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let message: Value = resp.json().await.unwrap();
    assert_eq!(message["contents"], "look at this");
    assert_eq!(message["image"]["contentType"], "image/png");
    assert_eq!(message["image"]["size"], PNG_BYTES.len());
    let message_id = message["id"].as_str().unwrap();

    let resp = app.get(&format!("/messages/{message_id}/image"), &bob.token).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[reqwest::header::CONTENT_TYPE], "image/png");
    assert_eq!(resp.bytes().await.unwrap().as_ref(), PNG_BYTES);

    let resp = app.get(&format!("/messages/{message_id}/image"), &eve.token).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app.get(&format!("/messages?sender={}&receiver={}", alice.user_id, bob.user_id), &bob.token).await;
    let listed: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["image"]["size"], PNG_BYTES.len());
    assert!(listed[0]["image"].get("data").is_none());
}

#[tokio::test]
async fn test_image_only_message_and_missing_image() {
    let app = common::TestApp::spawn().await;
    let alice = app.register_user("alice").await;
    let bob = app.register_user("bob").await;

    let form = Form::new().text("recipient", bob.user_id.to_string()).part("image", png_part());
    let resp = send_form(&app, &alice.token, form).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let message: Value = resp.json().await.unwrap();
    assert!(message["contents"].is_null());

    let text_only = app.send_text(&alice.token, bob.user_id, "no picture").await;
    assert!(text_only["image"].is_null());
    let resp = app.get(&format!("/messages/{}/image", text_only["id"].as_str().unwrap()), &bob.token).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let empty = Part::bytes(Vec::new()).file_name("").mime_str("application/octet-stream").unwrap();
    let form = Form::new().text("recipient", bob.user_id.to_string()).part("image", empty);
    let resp = send_form(&app, &alice.token, form).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rejects_bad_uploads() {
    let app = common::TestApp::spawn().await;
    let alice = app.register_user("alice").await;
    let bob = app.register_user("bob").await;

    let text_file = Part::bytes(b"plain".to_vec()).file_name("notes.txt").mime_str("text/plain").unwrap();
    let form = Form::new().text("recipient", bob.user_id.to_string()).part("image", text_file);
    let resp = send_form(&app, &alice.token, form).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let oversized = Part::bytes(vec![0u8; app.config.messaging.max_image_bytes + 1])
        .file_name("huge.png")
        .mime_str("image/png")
        .unwrap();
    let form = Form::new().text("recipient", bob.user_id.to_string()).part("image", oversized);
    let resp = send_form(&app, &alice.token, form).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let form = Form::new().text("recipient", "not-a-uuid").text("contents", "hi");
    let resp = send_form(&app, &alice.token, form).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_group_image() {
    let app = common::TestApp::spawn().await;
    let admin = app.register_user("admin").await;
    let bob = app.register_user("bob").await;
    let eve = app.register_user("eve").await;
    let group = app.create_group(&admin.token, "Gallery", &[bob.user_id]).await;
    assert!(group["image"].is_null());
    let group_id = group["id"].as_str().unwrap();
    let image_path = format!("/groups/{group_id}/image");

    let resp = app.get(&image_path, &bob.token).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = put_group_image(&app, &bob.token, group_id, Form::new().part("image", png_part())).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = put_group_image(&app, &admin.token, group_id, Form::new().text("caption", "none")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = put_group_image(&app, &admin.token, group_id, Form::new().part("image", png_part())).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["image"]["contentType"], "image/png");

    let resp = app.get(&image_path, &bob.token).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.bytes().await.unwrap().as_ref(), PNG_BYTES);

    let resp = app.get(&image_path, &eve.token).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app.get(&format!("/groups/{}/image", Uuid::new_v4()), &admin.token).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
