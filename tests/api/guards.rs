use serde_json::{json, Value};
use user_accounts::{authentication::TokenKeys, persistence::UserRepository};

use crate::helpers::spawn_app;

#[tokio::test]
async fn non_numeric_id_is_rejected_before_anything_else() {
    let app = spawn_app().await;

    for id in ["abc", "-1", "1.5", "99999999999999999999"] {
        let response = app.get_user(id, None).await;

        assert_eq!(400, response.status().as_u16(), "id {id} was accepted");
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["message"], "Invalid user id");
    }
}

#[tokio::test]
async fn unknown_user_is_404_even_without_a_token() {
    let app = spawn_app().await;

    let response = app.delete_user("12345", None).await;

    assert_eq!(404, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn existing_user_requires_a_token() {
    let app = spawn_app().await;
    let id = app.create_user("Ana", "ana@example.com").await;

    let response = app.get_user(&id.to_string(), None).await;
    assert_eq!(401, response.status().as_u16());

    let response = app.get_user(&id.to_string(), Some("not-a-jwt")).await;
    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Unauthorized: Invalid token");
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let app = spawn_app().await;
    let id = app.create_user("Ana", "ana@example.com").await;
    let expired = TokenKeys::from_secret(&app.jwt_secret, -10)
        .generate_token(id, "member")
        .unwrap();

    let response = app.get_user(&id.to_string(), Some(&expired)).await;

    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Unauthorized: Token has expired");
}

#[tokio::test]
async fn member_can_read_itself() {
    let app = spawn_app().await;
    let id = app.create_user("Ana", "ana@example.com").await;
    let token = app.login("ana@example.com").await;

    let response = app.get_user(&id.to_string(), Some(&token)).await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["id"], id);
    assert_eq!(body["email"], "ana@example.com");
    assert_eq!(body["cellphone"], "555-0100");
    assert!(body["lastLoginAt"].is_string());
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn member_owns_its_record_under_a_zero_padded_id() {
    let app = spawn_app().await;
    let id = app.create_user("Ana", "ana@example.com").await;
    let token = app.login("ana@example.com").await;

    let response = app.get_user(&format!("00{id}"), Some(&token)).await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["id"], id);
}

#[tokio::test]
async fn member_cannot_touch_another_user() {
    let app = spawn_app().await;
    app.create_user("Ana", "ana@example.com").await;
    let bea = app.create_user("Bea", "bea@example.com").await;
    let token = app.login("ana@example.com").await;

    let response = app.get_user(&bea.to_string(), Some(&token)).await;
    assert_eq!(403, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Forbidden: Insufficient permissions");

    let response = app.delete_user(&bea.to_string(), Some(&token)).await;
    assert_eq!(403, response.status().as_u16());
    assert!(app.repository.find_active_by_id(bea).await.unwrap().is_some());
}

#[tokio::test]
async fn member_update_with_only_cellphone_keeps_other_fields() {
    let app = spawn_app().await;
    let id = app.create_user("Ana", "ana@example.com").await;
    let token = app.login("ana@example.com").await;
    let before = app.repository.find_active_by_id(id).await.unwrap().unwrap();

    let response = app
        .put_user(&id.to_string(), &json!({ "cellphone": "555-0199" }), Some(&token))
        .await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!("User updated successfully"));

    let after = app.repository.find_active_by_id(id).await.unwrap().unwrap();
    assert_eq!(after.name, before.name);
    assert_eq!(after.password, before.password);
    assert_eq!(after.cellphone.as_deref(), Some("555-0199"));
}

#[tokio::test]
async fn admin_soft_deletes_another_user() {
    let app = spawn_app().await;
    let admin = app.create_user("Root", "root@example.com").await;
    app.make_admin(admin).await;
    let bea = app.create_user("Bea", "bea@example.com").await;
    let token = app.login("root@example.com").await;

    let response = app.delete_user(&bea.to_string(), Some(&token)).await;
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!("User deleted successfully"));

    // the row stays, only inactive
    let stored = app.repository.find_by_email("bea@example.com").await.unwrap().unwrap();
    assert!(!stored.status);

    let response = app.get_user(&bea.to_string(), Some(&token)).await;
    assert_eq!(404, response.status().as_u16());
}
