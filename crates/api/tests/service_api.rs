//! HTTP-level tests for the service catalog.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, create_service, create_user, delete_auth, get_auth, post_json_auth, put_json_auth,
};
use serde_json::json;
use sqlx::PgPool;
use youneed_core::roles::Role;
use youneed_db::repositories::ServiceRepo;

#[sqlx::test(migrations = "../../db/migrations")]
async fn provider_creates_service(pool: PgPool) {
    let provider = create_user(&pool, "p@test.com", Role::Provider).await;
    let client = create_user(&pool, "c@test.com", Role::Client).await;
    let app = common::build_test_app(pool);
    let body = json!({
        "name": "Massage",
        "category": "wellness",
        "price": "80.50",
        "duration_minutes": 60,
    });

    let response = post_json_auth(
        app.app(),
        "/api/v1/services",
        body.clone(),
        &app.token_for(&client),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response =
        post_json_auth(app.app(), "/api/v1/services", body, &app.token_for(&provider)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["provider_id"], provider.id);
    assert_eq!(json["data"]["duration_minutes"], 60);
    assert_eq!(json["data"]["is_active"], true);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalid_service_is_rejected(pool: PgPool) {
    let provider = create_user(&pool, "p@test.com", Role::Provider).await;
    let app = common::build_test_app(pool);
    let token = app.token_for(&provider);

    for body in [
        json!({ "name": "", "price": "10" }),
        json!({ "name": "Cut", "price": "-1" }),
        json!({ "name": "Cut", "price": "10.999" }),
        json!({ "name": "Cut", "price": "10", "duration_minutes": 0 }),
    ] {
        let response = post_json_auth(app.app(), "/api/v1/services", body.clone(), &token).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "request: {body}");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_filters_by_provider_and_category(pool: PgPool) {
    let alice = create_user(&pool, "alice@test.com", Role::Provider).await;
    let bob = create_user(&pool, "bob@test.com", Role::Provider).await;
    let client = create_user(&pool, "c@test.com", Role::Client).await;
    create_service(&pool, alice.id, "Cut", 20, Some(30)).await;
    create_service(&pool, alice.id, "Colour", 60, Some(90)).await;
    create_service(&pool, bob.id, "Shave", 15, None).await;
    let app = common::build_test_app(pool);
    let token = app.token_for(&client);

    let all = body_json(get_auth(app.app(), "/api/v1/services", &token).await).await;
    assert_eq!(all["data"].as_array().unwrap().len(), 3);

    let uri = format!("/api/v1/services?provider_id={}", alice.id);
    let alices = body_json(get_auth(app.app(), &uri, &token).await).await;
    let names: Vec<&str> = alices["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Colour", "Cut"]);

    let none = body_json(get_auth(app.app(), "/api/v1/services?category=auto", &token).await).await;
    assert!(none["data"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn only_owner_or_admin_may_update(pool: PgPool) {
    let owner = create_user(&pool, "owner@test.com", Role::Provider).await;
    let rival = create_user(&pool, "rival@test.com", Role::Provider).await;
    let admin = create_user(&pool, "admin@test.com", Role::Admin).await;
    let service = create_service(&pool, owner.id, "Cut", 20, Some(30)).await;
    let app = common::build_test_app(pool);
    let uri = format!("/api/v1/services/{}", service.id);

    let response =
        put_json_auth(app.app(), &uri, json!({ "price": "25" }), &app.token_for(&rival)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response =
        put_json_auth(app.app(), &uri, json!({ "price": "25" }), &app.token_for(&owner)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Cut");

    let response = put_json_auth(
        app.app(),
        &uri,
        json!({ "name": "Premium cut" }),
        &app.token_for(&admin),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Premium cut");
}

/// Deletion is refused while a booking still occupies the calendar, turns
/// into deactivation once only finished bookings remain, and is a real
/// delete for a service that was never booked.
#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_respects_order_history(pool: PgPool) {
    let provider = create_user(&pool, "p@test.com", Role::Provider).await;
    let client = create_user(&pool, "c@test.com", Role::Client).await;
    let booked = create_service(&pool, provider.id, "Cut", 20, Some(30)).await;
    let unused = create_service(&pool, provider.id, "Shave", 15, Some(15)).await;
    let app = common::build_test_app(pool.clone());
    let provider_token = app.token_for(&provider);

    let response = post_json_auth(
        app.app(),
        "/api/v1/orders",
        json!({
            "service_id": booked.id,
            "provider_id": provider.id,
            "start_at": "2030-05-01T09:00:00Z",
        }),
        &app.token_for(&client),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let order_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let uri = format!("/api/v1/services/{}", booked.id);
    let response = delete_auth(app.app(), &uri, &provider_token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = put_json_auth(
        app.app(),
        &format!("/api/v1/orders/{order_id}/status"),
        json!({ "status": "rejected" }),
        &provider_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = delete_auth(app.app(), &uri, &provider_token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let kept = ServiceRepo::find_by_id(&pool, booked.id).await.unwrap().unwrap();
    assert!(!kept.is_active, "service with history is deactivated");

    let response = delete_auth(
        app.app(),
        &format!("/api/v1/services/{}", unused.id),
        &provider_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(ServiceRepo::find_by_id(&pool, unused.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn inactive_service_cannot_be_booked(pool: PgPool) {
    let provider = create_user(&pool, "p@test.com", Role::Provider).await;
    let client = create_user(&pool, "c@test.com", Role::Client).await;
    let service = create_service(&pool, provider.id, "Cut", 20, Some(30)).await;
    let app = common::build_test_app(pool);

    let response = put_json_auth(
        app.app(),
        &format!("/api/v1/services/{}", service.id),
        json!({ "is_active": false }),
        &app.token_for(&provider),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json_auth(
        app.app(),
        "/api/v1/orders",
        json!({
            "service_id": service.id,
            "provider_id": provider.id,
            "start_at": "2030-05-01T09:00:00Z",
        }),
        &app.token_for(&client),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// A booking racing a delete of the same service either lands first and
/// blocks the delete, or loses to the delete and finds no service.
#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_and_booking_of_one_service_are_serialized(pool: PgPool) {
    let provider = create_user(&pool, "p@test.com", Role::Provider).await;
    let client = create_user(&pool, "c@test.com", Role::Client).await;
    let app = common::build_test_app(pool.clone());
    let provider_token = app.token_for(&provider);
    let client_token = app.token_for(&client);

    for round in 0..12 {
        let service = create_service(&pool, provider.id, "Cut", 20, Some(30)).await;
        let uri = format!("/api/v1/services/{}", service.id);
        let booking = json!({
            "service_id": service.id,
            "provider_id": provider.id,
            "start_at": format!("2030-05-01T{:02}:00:00Z", round + 8),
        });

        let (booked, deleted) = tokio::join!(
            post_json_auth(app.app(), "/api/v1/orders", booking, &client_token),
            delete_auth(app.app(), &uri, &provider_token),
        );
        let outcome = (booked.status(), deleted.status());
        let stored = ServiceRepo::find_by_id(&pool, service.id).await.unwrap();

        match outcome {
            (StatusCode::CREATED, StatusCode::CONFLICT) => {
                let stored = stored.expect("booked service must survive");
                assert!(stored.is_active, "round {round}: booked service was deactivated");
            }
            (StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST, StatusCode::NO_CONTENT) => {
                assert!(stored.is_none(), "round {round}: unbooked service should be gone");
            }
            other => panic!("round {round}: unexpected outcome {other:?}"),
        }
    }
}
