//! HTTP-level tests for registration, login and the auth extractors.

mod common;

use axum::http::StatusCode;
use common::{body_json, create_user, get_auth, post_json, TEST_PASSWORD};
use serde_json::json;
use sqlx::PgPool;
use youneed_core::roles::Role;

fn registration(email: &str, role: &str) -> serde_json::Value {
    json!({
        "email": email,
        "password": "long-enough-password",
        "first_name": "Ada",
        "last_name": "Lovelace",
        "role": role,
    })
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn register_returns_token_and_user(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app.app(),
        "/api/v1/auth/register",
        registration("Ada@Example.com", "provider"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert!(json["data"]["access_token"].is_string());
    assert_eq!(json["data"]["expires_in"], 15 * 60);
    assert_eq!(json["data"]["user"]["email"], "ada@example.com");
    assert_eq!(json["data"]["user"]["role"], "provider");
    assert!(json["data"]["user"].get("password_hash").is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn register_rejects_duplicates_and_bad_input(pool: PgPool) {
    let app = common::build_test_app(pool);

    let first = post_json(
        app.app(),
        "/api/v1/auth/register",
        registration("dup@example.com", "client"),
    )
    .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let duplicate = post_json(
        app.app(),
        "/api/v1/auth/register",
        registration("DUP@example.com", "client"),
    )
    .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let admin = post_json(
        app.app(),
        "/api/v1/auth/register",
        registration("boss@example.com", "admin"),
    )
    .await;
    assert_eq!(admin.status(), StatusCode::BAD_REQUEST);

    let mut short = registration("short@example.com", "client");
    short["password"] = json!("short");
    let response = post_json(app.app(), "/api/v1/auth/register", short).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(
        app.app(),
        "/api/v1/auth/register",
        registration("not-an-email", "client"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_and_me(pool: PgPool) {
    let user = create_user(&pool, "login@test.com", Role::Client).await;
    let app = common::build_test_app(pool);

    let response = post_json(
        app.app(),
        "/api/v1/auth/login",
        json!({ "email": "login@test.com", "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["user"]["id"], user.id);
    let token = json["data"]["access_token"].as_str().unwrap().to_string();

    let response = get_auth(app.app(), "/api/v1/auth/me", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["email"], "login@test.com");
    assert_eq!(json["data"]["role"], "client");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_with_wrong_password_or_unknown_email_is_401(pool: PgPool) {
    create_user(&pool, "known@test.com", Role::Client).await;
    let app = common::build_test_app(pool);

    for body in [
        json!({ "email": "known@test.com", "password": "wrong-password" }),
        json!({ "email": "nobody@test.com", "password": TEST_PASSWORD }),
    ] {
        let response = post_json(app.app(), "/api/v1/auth/login", body).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Invalid email or password");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn garbage_token_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get_auth(app.app(), "/api/v1/auth/me", "not.a.jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
