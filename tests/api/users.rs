use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use user_accounts::persistence::UserRepository;

use crate::helpers::{create_body, spawn_app, PASSWORD};

#[tokio::test]
async fn create_returns_200_with_the_new_id() {
    let app = spawn_app().await;

    let response = app
        .post_create(&create_body("Ana", "ana@example.com"))
        .await;

    assert_eq!(200, response.status().as_u16());
    let stored = app.repository.snapshot().await;
    assert_eq!(stored.len(), 1);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!(format!("User created successfully with ID: {}", stored[0].id))
    );
}

#[tokio::test]
async fn create_returns_400_when_passwords_do_not_match() {
    let app = spawn_app().await;
    let mut body = create_body("Ana", "ana@example.com");
    body["password_second"] = json!("something else");

    let response = app.post_create(&body).await;

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Passwords do not match");
    assert!(body["timestamp"].is_string());
    assert!(app.repository.snapshot().await.is_empty());
}

#[tokio::test]
async fn create_returns_400_for_a_taken_email() {
    let app = spawn_app().await;
    app.create_user("Ana", "ana@example.com").await;

    let response = app
        .post_create(&create_body("Another Ana", "ana@example.com"))
        .await;

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "User already exists");
}

#[tokio::test]
async fn create_returns_400_when_fields_are_missing() {
    let app = spawn_app().await;
    let test_cases = vec![
        (json!({ "email": "ana@example.com", "password": PASSWORD, "password_second": PASSWORD }), "missing the name"),
        (json!({ "name": "Ana", "password": PASSWORD, "password_second": PASSWORD }), "missing the email"),
        (json!({ "name": "Ana", "email": "ana@example.com" }), "missing both passwords"),
    ];

    for (invalid_body, error_message) in test_cases {
        let response = app.post_create(&invalid_body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request when the payload was {}.",
            error_message
        );
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["message"], "Invalid request body");
        assert!(body["timestamp"].is_string());
    }
}

#[tokio::test]
async fn bulk_create_rejects_a_body_without_a_users_array() {
    let app = spawn_app().await;

    let response = app.post_bulk_create(&json!({ "users": "nope" })).await;

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Invalid request body");
    assert!(body["timestamp"].is_string());
    assert!(app.repository.snapshot().await.is_empty());
}

#[tokio::test]
async fn bulk_create_reports_successes_and_failures() {
    let app = spawn_app().await;
    app.create_user("Ana", "ana@example.com").await;
    let mut mismatched = create_body("Bea", "bea@example.com");
    mismatched["password_second"] = json!("nope");

    let response = app
        .post_bulk_create(&json!({
            "users": [
                create_body("Caro", "caro@example.com"),
                create_body("Ana again", "ana@example.com"),
                mismatched,
                { "name": 42 },
                create_body("Dani", "dani@example.com"),
            ]
        }))
        .await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!("Successful records: 2. Failed records: 3"));

    let stored = app.repository.snapshot().await;
    assert_eq!(stored.len(), 3);
    assert!(stored.iter().all(|u| u.status));
}

#[tokio::test]
async fn get_all_users_never_returns_deleted_users() {
    let app = spawn_app().await;
    let ana = app.create_user("Ana", "ana@example.com").await;
    app.create_user("Bea", "bea@example.com").await;
    app.repository.set_status(ana, false).await.unwrap();

    let response = app.get_all_users().await;

    assert_eq!(200, response.status().as_u16());
    let users: Vec<Value> = response.json().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["name"], "Bea");
    assert_eq!(users[0]["status"], true);
    assert!(users[0].get("password").is_none());
}

#[tokio::test]
async fn find_users_with_deleted_true_returns_only_deleted_users() {
    let app = spawn_app().await;
    let ana = app.create_user("Ana", "ana@example.com").await;
    app.create_user("Bea", "bea@example.com").await;
    app.repository.set_status(ana, false).await.unwrap();

    let response = app.get_find_users(&[("deleted", "true")]).await;

    assert_eq!(200, response.status().as_u16());
    let users: Vec<Value> = response.json().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["id"], ana);
    assert_eq!(users[0]["status"], false);
}

#[tokio::test]
async fn find_users_filters_by_name_substring() {
    let app = spawn_app().await;
    app.create_user("Mariana", "mariana@example.com").await;
    app.create_user("Bea", "bea@example.com").await;

    let response = app.get_find_users(&[("name", "ARIA")]).await;

    let users: Vec<Value> = response.json().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["name"], "Mariana");
}

#[tokio::test]
async fn find_users_with_both_login_bounds_applies_only_the_after_bound() {
    let app = spawn_app().await;
    let ana = app.create_user("Ana", "ana@example.com").await;
    let bea = app.create_user("Bea", "bea@example.com").await;
    app.create_user("Never logged in", "never@example.com").await;
    app.repository
        .record_login(ana, Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap())
        .await
        .unwrap();
    app.repository
        .record_login(bea, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
        .await
        .unwrap();

    let response = app
        .get_find_users(&[("loggedInBefore", "2024-01-01"), ("loggedInAfter", "2022-01-01")])
        .await;

    assert_eq!(200, response.status().as_u16());
    let users: Vec<Value> = response.json().await.unwrap();
    let ids: Vec<i64> = users.iter().map(|u| u["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![ana, bea]);
}

#[tokio::test]
async fn find_users_with_only_before_bound() {
    let app = spawn_app().await;
    let ana = app.create_user("Ana", "ana@example.com").await;
    let bea = app.create_user("Bea", "bea@example.com").await;
    app.repository
        .record_login(ana, Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap())
        .await
        .unwrap();
    app.repository
        .record_login(bea, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
        .await
        .unwrap();

    let response = app
        .get_find_users(&[("loggedInBefore", "2024-01-01T00:00:00Z")])
        .await;

    let users: Vec<Value> = response.json().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["id"], ana);
}

#[tokio::test]
async fn find_users_rejects_an_unparsable_timestamp() {
    let app = spawn_app().await;

    let response = app.get_find_users(&[("loggedInAfter", "last week")]).await;

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Invalid timestamp for loggedInAfter");
}

#[tokio::test]
async fn find_users_rejects_a_repeated_parameter() {
    let app = spawn_app().await;

    let response = app.get_find_users(&[("name", "ana"), ("name", "bea")]).await;

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Invalid query string");
    assert!(body["timestamp"].is_string());
}
