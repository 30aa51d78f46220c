use serde_json::{json, Value};
use user_accounts::persistence::UserRepository;

use crate::helpers::{spawn_app, PASSWORD};

#[tokio::test]
async fn login_issues_a_token_and_records_the_login_time() {
    let app = spawn_app().await;
    let id = app.create_user("Ana", "ana@example.com").await;

    let response = app
        .post_login(&json!({ "email": "ana@example.com", "password": PASSWORD }))
        .await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert!(body["access_token"].as_str().is_some_and(|t| !t.is_empty()));

    let stored = app.repository.find_active_by_id(id).await.unwrap().unwrap();
    assert!(stored.last_login_at.is_some());
}

#[tokio::test]
async fn login_rejects_a_wrong_password() {
    let app = spawn_app().await;
    app.create_user("Ana", "ana@example.com").await;

    let response = app
        .post_login(&json!({ "email": "ana@example.com", "password": "wrong" }))
        .await;

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Authentication failed");
}

#[tokio::test]
async fn login_rejects_a_malformed_email() {
    let app = spawn_app().await;

    let response = app
        .post_login(&json!({ "email": "ana", "password": PASSWORD }))
        .await;

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Invalid email format");
}

#[tokio::test]
async fn deleted_user_cannot_log_in() {
    let app = spawn_app().await;
    let id = app.create_user("Ana", "ana@example.com").await;
    app.repository.set_status(id, false).await.unwrap();

    let response = app
        .post_login(&json!({ "email": "ana@example.com", "password": PASSWORD }))
        .await;

    assert_eq!(400, response.status().as_u16());
}
