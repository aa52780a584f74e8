mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{app, get, register, send};

#[tokio::test]
async fn healthcheck_is_public() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/v1/healthcheck", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "available");
    assert!(body["system_info"]["version"].is_string());
}

#[tokio::test]
async fn register_then_login() {
    let app = app();
    let (user_id, _) = register(&app, "alice").await;
    assert_eq!(user_id, 1);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/users/login",
        None,
        Some(json!({ "username": "alice", "password": "correct horse battery" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], 1);
    assert_eq!(body["username"], "alice");

    let token = body["token"].as_str().unwrap();
    let (status, body) = get(&app, "/api/v1/users/1", token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "alice");
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
async fn wrong_password_and_unknown_user_are_unauthorized() {
    let app = app();
    register(&app, "alice").await;

    for creds in [
        json!({ "username": "alice", "password": "not the password" }),
        json!({ "username": "nobody", "password": "correct horse battery" }),
    ] {
        let (status, body) = send(&app, Method::POST, "/api/v1/users/login", None, Some(creds)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let app = app();
    register(&app, "alice").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/users",
        None,
        Some(json!({
            "username": "alice",
            "password": "another password",
            "first_name": "A",
            "last_name": "B",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn registration_reports_every_bad_field() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/users",
        None,
        Some(json!({ "username": "al", "password": "short", "first_name": "", "last_name": "X" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields = &body["error"]["fields"];
    assert!(fields["username"].is_string());
    assert!(fields["password"].is_string());
    assert!(fields["first_name"].is_string());
    assert!(fields.get("last_name").is_none());
}

#[tokio::test]
async fn malformed_body_is_invalid_input() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/users/login",
        None,
        Some(json!({ "username": "alice" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
    let app = app();
    register(&app, "alice").await;

    let (status, _) = send(&app, Method::GET, "/api/v1/users/1/channels", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = get(&app, "/api/v1/users/1/channels", "not.a.jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let forged = courier_api::auth::create_token(
        "some-other-secret",
        std::time::Duration::from_secs(60),
        1,
        "alice",
    )
    .unwrap();
    let (status, _) = get(&app, "/api/v1/users/1/channels", &forged).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn another_users_path_is_not_found() {
    let app = app();
    let (_, alice) = register(&app, "alice").await;
    register(&app, "bob").await;

    let (status, body) = get(&app, "/api/v1/users/2", &alice).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = get(&app, "/api/v1/users/2/conversations", &alice).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = get(&app, "/api/v1/users/abc/conversations", &alice).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["fields"]["user_id"].is_string());
}

#[tokio::test]
async fn deleting_the_account_removes_it() {
    let app = app();
    let (_, alice) = register(&app, "alice").await;

    let (status, body) = common::delete(&app, "/api/v1/users/1", &alice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "success");

    // The token outlives the account but finds nothing.
    let (status, _) = get(&app, "/api/v1/users/1", &alice).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
