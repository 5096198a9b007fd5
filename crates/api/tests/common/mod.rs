//! Shared helpers for HTTP-level integration tests.
//!
//! Every test gets its own migrated database from `#[sqlx::test]`; the app
//! is built with [`build_test_app`], which uses the production router so the
//! full middleware stack is exercised.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tower::ServiceExt;
use youneed_api::auth::jwt::{generate_access_token, JwtConfig};
use youneed_api::auth::password::hash_password;
use youneed_api::config::ServerConfig;
use youneed_api::router::build_app_router;
use youneed_api::state::AppState;
use youneed_core::roles::Role;
use youneed_db::models::service::{CreateService, Service};
use youneed_db::models::user::{CreateUser, User};
use youneed_db::repositories::{ServiceRepo, UserRepo};
use youneed_events::{NotificationDispatcher, PgNotificationStore};

/// Password given to every user created by [`create_user`].
pub const TEST_PASSWORD: &str = "test_password_123!";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        default_service_duration_mins: 30,
        notification_queue_capacity: 64,
        jwt: JwtConfig {
            secret: "integration-test-secret-with-enough-length".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// A running application plus the handle needed to wait for notifications.
pub struct TestApp {
    pub router: Router,
    pub notifier: NotificationDispatcher,
    pub config: ServerConfig,
}

impl TestApp {
    /// A fresh router handle for one `oneshot` request.
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    /// Bearer token for `user`, signed with the test secret.
    pub fn token_for(&self, user: &User) -> String {
        let role: Role = user.role.parse().expect("stored role should parse");
        generate_access_token(user.id, role, &self.config.jwt).expect("token generation")
    }

    /// Wait until every queued notification has been written.
    pub async fn settle(&self) {
        self.notifier.flush().await;
    }
}

/// Build the full application with the given pool and a live notification worker.
pub fn build_test_app(pool: PgPool) -> TestApp {
    let config = test_config();
    let (notifier, _worker) = NotificationDispatcher::start(
        PgNotificationStore::new(pool.clone()),
        config.notification_queue_capacity,
    );

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        notifier: notifier.clone(),
    };

    TestApp {
        router: build_app_router(state, &config),
        notifier,
        config,
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Insert a user with [`TEST_PASSWORD`] directly through the repository.
pub async fn create_user(pool: &PgPool, email: &str, role: Role) -> User {
    let name = email.split('@').next().unwrap_or(email).to_string();
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
            first_name: name,
            last_name: "Test".to_string(),
            role,
        },
    )
    .await
    .expect("user creation should succeed")
}

/// Insert a service for `provider_id` with the given price and duration.
pub async fn create_service(
    pool: &PgPool,
    provider_id: i64,
    name: &str,
    price: i64,
    duration_minutes: Option<i32>,
) -> Service {
    ServiceRepo::create(
        pool,
        provider_id,
        &CreateService {
            name: name.to_string(),
            description: None,
            category: Some("beauty".to_string()),
            price: Decimal::new(price, 0),
            duration_minutes,
        },
    )
    .await
    .expect("service creation should succeed")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
