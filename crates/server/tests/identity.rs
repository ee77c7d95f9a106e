mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn register_creates_user_with_matching_profile() {
    let app = TestApp::new().await;
    let user_id = app.register("Alice Donor", "alice@example.com", "donor").await;

    let (status, body) = app.get(&format!("/api/users/{user_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], user_id);
    assert_eq!(body["role"], "donor");
    assert_eq!(body["profile"]["donor_store_id"], user_id);
    assert_eq!(body["profile"]["first_name"], "Alice");
    assert_eq!(body["profile"]["last_name"], "Donor");
    assert_eq!(body["profile"]["email"], "alice@example.com");
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn npo_and_admin_profiles() {
    let app = TestApp::new().await;
    let npo = app.register("Hope Foundation", "hope@example.com", "npo").await;
    let admin = app.register("Admin User", "admin@example.com", "admin").await;

    let (_, body) = app.get(&format!("/api/users/{npo}")).await;
    assert_eq!(body["profile"]["npo_id"], npo);
    assert_eq!(body["profile"]["npo_name"], "Hope Foundation");

    let (_, body) = app.get(&format!("/api/users/{admin}")).await;
    assert_eq!(body["profile"], json!({}));
}

#[tokio::test]
async fn registering_same_email_twice_conflicts() {
    let app = TestApp::new().await;
    app.register("Alice Donor", "alice@example.com", "donor").await;

    let (status, body) = app
        .post(
            "/api/register",
            json!({ "name": "Other", "email": "alice@example.com", "password": "x", "role": "npo" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email already registered");
    assert_eq!(app.count("SELECT COUNT(*) FROM users").await, 1);
}

#[tokio::test]
async fn register_validates_fields_and_role() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/api/register",
            json!({ "name": "No Password", "email": "np@example.com", "role": "donor" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Missing required fields"));

    let (status, body) = app
        .post(
            "/api/register",
            json!({ "name": "Vol", "email": "vol@example.com", "password": "pw", "role": "volunteer" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Invalid role"));

    assert_eq!(app.count("SELECT COUNT(*) FROM users").await, 0);
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let app = TestApp::new().await;
    let (status, body) = app
        .post("/api/register", json!({ "name": 42 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn login_returns_registered_user_id() {
    let app = TestApp::new().await;
    let user_id = app.register("Alice Donor", "alice@example.com", "donor").await;

    let (status, body) = app
        .post(
            "/api/login",
            json!({ "email": "alice@example.com", "password": "secret123" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["user_id"], user_id);
    assert_eq!(body["user"]["name"], "Alice Donor");
    assert_eq!(body["user"]["role"], "donor");
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let app = TestApp::new().await;
    app.register("Alice Donor", "alice@example.com", "donor").await;

    let (status, body) = app
        .post(
            "/api/login",
            json!({ "email": "alice@example.com", "password": "wrong" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, _) = app
        .post(
            "/api/login",
            json!({ "email": "nobody@example.com", "password": "secret123" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.post("/api/login", json!({ "email": "alice@example.com" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/api/users/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");
}

#[tokio::test]
async fn updating_a_user_requires_a_token() {
    let app = TestApp::new().await;
    let id = app.register("Alice Donor", "alice@example.com", "donor").await;

    let (status, _) = app
        .put(&format!("/api/users/{id}"), json!({ "city": "Pretoria" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn owner_can_update_own_profile_but_not_others() {
    let app = TestApp::new().await;
    let alice = app.register("Alice Donor", "alice@example.com", "donor").await;
    let bob = app.register("Bob Donor", "bob@example.com", "donor").await;
    let token = app.token_for("alice@example.com").await;

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/api/users/{alice}"),
            Some(json!({ "name": "Alice Smith", "city": "Pretoria" })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Alice Smith");
    assert_eq!(body["profile"]["last_name"], "Smith");
    assert_eq!(body["profile"]["city"], "Pretoria");

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/users/{bob}"),
            Some(json!({ "city": "Durban" })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Owner actions are not admin actions
    assert_eq!(app.count("SELECT COUNT(*) FROM admin_logs").await, 0);
}

#[tokio::test]
async fn email_change_must_stay_unique() {
    let app = TestApp::new().await;
    let alice = app.register("Alice Donor", "alice@example.com", "donor").await;
    app.register("Bob Donor", "bob@example.com", "donor").await;
    let token = app.token_for("alice@example.com").await;

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/api/users/{alice}"),
            Some(json!({ "email": "bob@example.com" })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email already registered");
}

#[tokio::test]
async fn admin_actions_are_logged() {
    let app = TestApp::new().await;
    app.register("Admin User", "admin@example.com", "admin").await;
    let npo = app.register("Care Connect", "care@example.com", "npo").await;
    let token = app.token_for("admin@example.com").await;

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/api/users/{npo}"),
            Some(json!({ "phone_number": "0119988776" })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["phone_number"], "0119988776");

    let (status, body) = app
        .request(Method::DELETE, &format!("/api/users/{npo}"), None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], npo);
    assert_eq!(app.count("SELECT COUNT(*) FROM npo_profiles").await, 0);

    let (status, logs) = app
        .request(Method::GET, "/api/admin/logs", None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    let logs = logs.as_array().unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0]["action_type"], "DELETE");
    assert_eq!(logs[0]["target_id"], npo);
    assert_eq!(logs[1]["action_type"], "UPDATE");
}

#[tokio::test]
async fn admin_endpoints_reject_non_admins() {
    let app = TestApp::new().await;
    app.register("Alice Donor", "alice@example.com", "donor").await;
    let token = app.token_for("alice@example.com").await;

    let (status, _) = app
        .request(Method::GET, "/api/users", None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(Method::GET, "/api/admin/logs", None, Some("not-a-jwt"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_lists_users() {
    let app = TestApp::new().await;
    app.register("Admin User", "admin@example.com", "admin").await;
    app.register("Alice Donor", "alice@example.com", "donor").await;
    let token = app.token_for("admin@example.com").await;

    let (status, body) = app
        .request(Method::GET, "/api/users", None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("password_hash").is_none()));
}

#[tokio::test]
async fn donor_with_history_cannot_be_deleted() {
    let app = TestApp::new().await;
    let alice = app.register("Alice Donor", "alice@example.com", "donor").await;
    let token = app.token_for("alice@example.com").await;

    app.post(
        "/api/donations",
        json!({ "donor_store_id": alice, "donation_amount": 10.0 }),
    )
    .await;

    let (status, body) = app
        .request(Method::DELETE, &format!("/api/users/{alice}"), None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("history"));
    assert_eq!(app.count("SELECT COUNT(*) FROM users").await, 1);
    assert_eq!(app.count("SELECT COUNT(*) FROM donation_records").await, 1);
}

#[tokio::test]
async fn email_without_at_sign_is_rejected() {
    let app = TestApp::new().await;
    let (status, body) = app
        .post(
            "/api/register",
            json!({ "name": "Alice", "email": "alice.example.com", "password": "pw", "role": "donor" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid email address");
    assert_eq!(app.count("SELECT COUNT(*) FROM users").await, 0);
}

#[tokio::test]
async fn only_admins_can_register_further_admins() {
    let app = TestApp::new().await;
    app.register("First Admin", "first@example.com", "admin").await;
    app.register("Alice Donor", "alice@example.com", "donor").await;

    let (status, body) = app
        .post(
            "/api/register",
            json!({ "name": "Mallory", "email": "mallory@example.com", "password": "pw", "role": "admin" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Only an admin can register another admin");

    let donor_token = app.token_for("alice@example.com").await;
    let (status, _) = app
        .request(
            Method::POST,
            "/api/register",
            Some(json!({ "name": "Mallory", "email": "mallory@example.com", "password": "pw", "role": "admin" })),
            Some(&donor_token),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        app.count("SELECT COUNT(*) FROM users WHERE role = 'admin'").await,
        1
    );

    let admin_token = app.token_for("first@example.com").await;
    app.register_with("Second Admin", "second@example.com", "admin", Some(&admin_token))
        .await;
    assert_eq!(
        app.count("SELECT COUNT(*) FROM users WHERE role = 'admin'").await,
        2
    );
}

#[tokio::test]
async fn deleted_admin_loses_access() {
    let app = TestApp::new().await;
    let first = app.register("First Admin", "first@example.com", "admin").await;
    let first_token = app.token_for("first@example.com").await;
    app.register_with("Second Admin", "second@example.com", "admin", Some(&first_token))
        .await;
    let second_token = app.token_for("second@example.com").await;

    let (status, _) = app
        .request(Method::DELETE, &format!("/api/users/{first}"), None, Some(&second_token))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .request(Method::GET, "/api/users", None, Some(&first_token))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request(Method::GET, "/api/admin/logs", None, Some(&first_token))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request(Method::GET, "/api/users", None, Some(&second_token))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn npo_with_feedback_cannot_be_deleted() {
    let app = TestApp::new().await;
    app.register("Admin User", "admin@example.com", "admin").await;
    let npo = app.register("Hope Foundation", "hope@example.com", "npo").await;
    let token = app.token_for("admin@example.com").await;

    let (status, _) = app
        .post("/api/feedback", json!({ "npo_id": npo, "rating": 4 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .request(Method::DELETE, &format!("/api/users/{npo}"), None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "User has donation, pickup or feedback history and cannot be deleted"
    );
    assert_eq!(app.count("SELECT COUNT(*) FROM npo_profiles").await, 1);
    assert_eq!(app.count("SELECT COUNT(*) FROM admin_logs").await, 0);
}
