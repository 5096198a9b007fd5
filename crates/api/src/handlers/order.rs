//! Handlers for the `/orders` resource and provider availability.
//!
//! Booking creation runs the conflict check and the insert in one
//! transaction that holds a lock on the provider's calendar row and a
//! shared lock on the service row. Status
//! changes re-read the order `FOR UPDATE` before the transition table is
//! consulted. Notifications are queued only after the commit.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use youneed_core::booking::{resolve_window, validate_booking_text, TimeRange};
use youneed_core::error::CoreError;
use youneed_core::notification::{
    order_created_message, order_status_message, KIND_ORDER_CREATED, KIND_ORDER_STATUS_CHANGED,
};
use youneed_core::order_status::{authorize_transition, OrderStatus, Party, TransitionDecision};
use youneed_core::roles::Role;
use youneed_core::types::{DbId, Timestamp};
use youneed_db::models::order::{
    CreateOrderRequest, NewOrder, Order, OrderDetail, OrderListQuery, OrderScope,
    UpdateOrderStatus,
};
use youneed_db::models::service::Service;
use youneed_db::repositories::{OrderRepo, ServiceRepo, UserRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /providers/{id}/availability`.
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub start_at: Option<String>,
    pub end_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Availability {
    pub available: bool,
}

/// Who an order is booked between and which status it starts in.
struct ResolvedParties {
    provider_id: DbId,
    client_id: Option<DbId>,
    status: OrderStatus,
}

// ---------------------------------------------------------------------------
// Booking
// ---------------------------------------------------------------------------

/// POST /api/v1/orders
///
/// Create a booking. Clients book a provider's service for themselves,
/// providers book their own calendar (optionally for a client; without one
/// the order is a time block), admins book on behalf of both parties.
pub async fn create_order(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<OrderDetail>>)> {
    let service_id = input
        .service_id
        .ok_or_else(|| validation("service_id is required"))?;
    let start_at = match input.start_at.as_deref() {
        Some(raw) => parse_instant("start_at", raw)?,
        None => return Err(validation("start_at is required")),
    };
    validate_booking_text(
        input.title.as_deref(),
        input.description.as_deref(),
        input.notes.as_deref(),
    )?;

    let service = ServiceRepo::find_by_id(&state.pool, service_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Service",
            id: service_id,
        }))?;
    ensure_offered(&service)?;

    let end_at = input
        .end_at
        .as_deref()
        .map(|raw| parse_instant("end_at", raw))
        .transpose()?;
    let parties = resolve_parties(&state, &auth, &input, &service).await?;

    let window = resolve_window(
        start_at,
        end_at,
        input.duration_minutes,
        service.duration_minutes,
        state.config.default_service_duration_mins,
    )?;

    let new_order = NewOrder {
        service_id: service.id,
        provider_id: parties.provider_id,
        client_id: parties.client_id,
        created_by: auth.user_id,
        title: input.title.clone().unwrap_or_else(|| service.name.clone()),
        description: input.description.clone(),
        notes: input.notes.clone(),
        start_at: window.start(),
        end_at: window.end(),
        status: parties.status,
        total_amount: service.price,
    };

    let mut tx = state.pool.begin().await?;
    if !UserRepo::lock_provider_calendar(&mut *tx, parties.provider_id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Provider",
            id: parties.provider_id,
        }));
    }
    // Held until commit so a concurrent service delete sees this order.
    let locked = ServiceRepo::find_for_share(&mut *tx, service.id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Service",
            id: service.id,
        }))?;
    ensure_offered(&locked)?;
    if OrderRepo::has_conflict(&mut *tx, parties.provider_id, &window, None).await? {
        tracing::debug!(
            provider_id = parties.provider_id,
            start_at = %window.start(),
            end_at = %window.end(),
            "Booking rejected, slot taken"
        );
        return Err(slot_taken());
    }
    let order = OrderRepo::insert(&mut *tx, &new_order).await?;
    tx.commit().await?;

    tracing::info!(
        order_id = order.id,
        provider_id = order.provider_id,
        client_id = ?order.client_id,
        status = %order.status,
        user_id = auth.user_id,
        "Order created"
    );

    let message = order_created_message(&order.title, order.start_at);
    for recipient in counterparts(auth.role, &order) {
        state
            .notifier
            .notify(recipient, KIND_ORDER_CREATED, message.clone(), order.id);
    }

    let detail = load_detail(&state, order.id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: detail })))
}

/// Resolve provider, client and initial status for the caller's role.
async fn resolve_parties(
    state: &AppState,
    auth: &AuthUser,
    input: &CreateOrderRequest,
    service: &Service,
) -> AppResult<ResolvedParties> {
    match auth.role {
        Role::Client => {
            let provider_id = input
                .provider_id
                .ok_or_else(|| validation("provider_id is required"))?;
            if provider_id != service.provider_id {
                return Err(validation("Service is not offered by this provider"));
            }
            require_user(state, provider_id, Role::Provider, "Provider").await?;
            Ok(ResolvedParties {
                provider_id,
                client_id: Some(auth.user_id),
                status: OrderStatus::Pending,
            })
        }
        Role::Provider => {
            if service.provider_id != auth.user_id {
                return Err(AppError::Core(CoreError::Forbidden(
                    "Providers can only book their own services".into(),
                )));
            }
            if let Some(client_id) = input.client_id {
                require_user(state, client_id, Role::Client, "Client").await?;
            }
            // A time block without a client needs no confirmation.
            let status = if input.client_id.is_some() {
                OrderStatus::Pending
            } else {
                OrderStatus::Accepted
            };
            Ok(ResolvedParties {
                provider_id: auth.user_id,
                client_id: input.client_id,
                status,
            })
        }
        Role::Admin => {
            let client_id = input
                .client_id
                .ok_or_else(|| validation("client_id is required"))?;
            let provider_id = input
                .provider_id
                .ok_or_else(|| validation("provider_id is required"))?;
            require_user(state, client_id, Role::Client, "Client").await?;
            require_user(state, provider_id, Role::Provider, "Provider").await?;
            if service.provider_id != provider_id {
                return Err(validation("Service is not offered by this provider"));
            }
            Ok(ResolvedParties {
                provider_id,
                client_id: Some(client_id),
                status: OrderStatus::Accepted,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Status changes
// ---------------------------------------------------------------------------

/// PUT /api/v1/orders/{id}/status
///
/// Move an order to a new status if the transition table allows it for the
/// caller. Requesting the current status succeeds without writing anything.
pub async fn update_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateOrderStatus>,
) -> AppResult<Json<DataResponse<OrderDetail>>> {
    let target: OrderStatus = input.status.parse()?;

    let mut tx = state.pool.begin().await?;
    let order = OrderRepo::find_for_update(&mut *tx, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Order", id }))?;

    let party = resolve_party(&auth, &order)?;
    let current = order.status()?;

    match authorize_transition(party, current, target)? {
        TransitionDecision::NoChange => {
            tx.rollback().await?;
            tracing::debug!(order_id = id, status = %current, "Status unchanged");
        }
        TransitionDecision::Apply => {
            if current.is_terminal() && target.blocks_calendar() {
                ensure_slot_free(&mut *tx, &order).await?;
            }
            let updated = OrderRepo::update_status(&mut *tx, id, target).await?;
            tx.commit().await?;

            tracing::info!(
                order_id = id,
                from = %current,
                to = %target,
                user_id = auth.user_id,
                "Order status changed"
            );

            let message = order_status_message(&updated.title, target);
            for recipient in counterparts(auth.role, &updated) {
                state.notifier.notify(
                    recipient,
                    KIND_ORDER_STATUS_CHANGED,
                    message.clone(),
                    updated.id,
                );
            }
        }
    }

    let detail = load_detail(&state, id).await?;
    Ok(Json(DataResponse { data: detail }))
}

// ---------------------------------------------------------------------------
// Queries and admin operations
// ---------------------------------------------------------------------------

/// GET /api/v1/orders
///
/// Admins see every order, providers their calendar, clients their bookings.
pub async fn list_orders(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<OrderListQuery>,
) -> AppResult<Json<DataResponse<Vec<OrderDetail>>>> {
    let status = params
        .status
        .as_deref()
        .map(str::parse::<OrderStatus>)
        .transpose()?;
    let scope = match auth.role {
        Role::Admin => OrderScope::All,
        Role::Provider => OrderScope::Provider(auth.user_id),
        Role::Client => OrderScope::Client(auth.user_id),
    };

    let orders = OrderRepo::list(&state.pool, scope, status, params.limit, params.offset).await?;
    Ok(Json(DataResponse { data: orders }))
}

/// GET /api/v1/orders/{id}
pub async fn get_order(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<OrderDetail>>> {
    let detail = OrderRepo::find_detail(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Order", id }))?;
    resolve_party(&auth, &detail.order)?;
    Ok(Json(DataResponse { data: detail }))
}

/// DELETE /api/v1/orders/{id}
///
/// Admin hard delete, bypassing the transition table.
pub async fn delete_order(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !OrderRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "Order", id }));
    }
    tracing::info!(order_id = id, user_id = admin.user_id, "Order deleted by admin");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/providers/{id}/availability?start_at=&end_at=
///
/// Read-only conflict check for a candidate window.
pub async fn provider_availability(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(provider_id): Path<DbId>,
    Query(params): Query<AvailabilityQuery>,
) -> AppResult<Json<DataResponse<Availability>>> {
    let start_at = match params.start_at.as_deref() {
        Some(raw) => parse_instant("start_at", raw)?,
        None => return Err(validation("start_at is required")),
    };
    let end_at = match params.end_at.as_deref() {
        Some(raw) => parse_instant("end_at", raw)?,
        None => return Err(validation("end_at is required")),
    };
    let window = TimeRange::new(start_at, end_at)?;

    require_user(&state, provider_id, Role::Provider, "Provider").await?;

    let taken = OrderRepo::has_conflict(&state.pool, provider_id, &window, None).await?;
    Ok(Json(DataResponse {
        data: Availability { available: !taken },
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn slot_taken() -> AppError {
    AppError::Core(CoreError::Conflict(
        "The requested time slot is already booked".into(),
    ))
}

fn ensure_offered(service: &Service) -> AppResult<()> {
    if service.is_active {
        Ok(())
    } else {
        Err(validation("Service is no longer offered"))
    }
}

/// Re-check the calendar before a finished order is put back on it.
async fn ensure_slot_free(conn: &mut PgConnection, order: &Order) -> AppResult<()> {
    if !UserRepo::lock_provider_calendar(&mut *conn, order.provider_id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Provider",
            id: order.provider_id,
        }));
    }
    let window = TimeRange::new(order.start_at, order.end_at)?;
    if OrderRepo::has_conflict(&mut *conn, order.provider_id, &window, Some(order.id)).await? {
        return Err(slot_taken());
    }
    Ok(())
}

fn validation(msg: &str) -> AppError {
    AppError::Core(CoreError::Validation(msg.to_string()))
}

/// Parse an RFC 3339 instant, reporting the offending field on failure.
fn parse_instant(field: &str, raw: &str) -> AppResult<Timestamp> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            AppError::Core(CoreError::Validation(format!(
                "{field} must be an RFC 3339 timestamp"
            )))
        })
}

/// Ensure `id` is an active user with `role`, reporting `entity` as missing otherwise.
async fn require_user(
    state: &AppState,
    id: DbId,
    role: Role,
    entity: &'static str,
) -> AppResult<()> {
    UserRepo::find_active_with_role(&state.pool, id, role)
        .await?
        .map(|_| ())
        .ok_or(AppError::Core(CoreError::NotFound { entity, id }))
}

/// The caller's relationship to `order`, or 403 for outsiders.
fn resolve_party(auth: &AuthUser, order: &Order) -> AppResult<Party> {
    Party::resolve(auth.role, auth.user_id, order.provider_id, order.client_id).ok_or_else(|| {
        AppError::Core(CoreError::Forbidden(
            "You are not a party to this order".into(),
        ))
    })
}

/// Users to notify about a change made by someone acting as `actor`.
///
/// Providers notify the client, clients notify the provider, admins notify
/// both. A time block has no client, so a provider notifies nobody.
fn counterparts(actor: Role, order: &Order) -> Vec<DbId> {
    match actor {
        Role::Provider => order.client_id.into_iter().collect(),
        Role::Client => vec![order.provider_id],
        Role::Admin => order
            .client_id
            .into_iter()
            .chain(std::iter::once(order.provider_id))
            .collect(),
    }
}

async fn load_detail(state: &AppState, id: DbId) -> AppResult<OrderDetail> {
    OrderRepo::find_detail(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::InternalError(format!("Order {id} vanished after write")))
}
