//! Handlers for the `/services` catalog.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use validator::Validate;
use youneed_core::error::CoreError;
use youneed_core::types::DbId;
use youneed_db::models::service::{CreateService, Service, ServiceListQuery, UpdateService};
use youneed_db::repositories::ServiceRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireProvider;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/services
///
/// Create a service owned by the calling provider.
pub async fn create_service(
    RequireProvider(auth): RequireProvider,
    State(state): State<AppState>,
    Json(input): Json<CreateService>,
) -> AppResult<(StatusCode, Json<DataResponse<Service>>)> {
    input.validate()?;
    let service = ServiceRepo::create(&state.pool, auth.user_id, &input).await?;
    tracing::info!(service_id = service.id, provider_id = auth.user_id, "Service created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: service })))
}

/// GET /api/v1/services
pub async fn list_services(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ServiceListQuery>,
) -> AppResult<Json<DataResponse<Vec<Service>>>> {
    let services = ServiceRepo::list_active(&state.pool, &params).await?;
    Ok(Json(DataResponse { data: services }))
}

/// GET /api/v1/services/{id}
pub async fn get_service(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Service>>> {
    let service = find_service(&state, id).await?;
    Ok(Json(DataResponse { data: service }))
}

/// PUT /api/v1/services/{id}
///
/// Partial update by the owning provider or an admin.
pub async fn update_service(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateService>,
) -> AppResult<Json<DataResponse<Service>>> {
    input.validate()?;
    let existing = find_service(&state, id).await?;
    ensure_can_manage(&auth, &existing)?;

    let service = ServiceRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Service",
            id,
        }))?;
    Ok(Json(DataResponse { data: service }))
}

/// DELETE /api/v1/services/{id}
///
/// Refused with 409 while a pending, accepted or in-progress order uses the
/// service. A service with only finished orders is deactivated so its order
/// history stays intact; one with no orders is deleted outright. The row
/// lock makes the check and the removal atomic with respect to bookings.
pub async fn delete_service(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let mut tx = state.pool.begin().await?;
    let existing = ServiceRepo::find_for_update(&mut *tx, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Service",
            id,
        }))?;
    ensure_can_manage(&auth, &existing)?;

    if ServiceRepo::has_blocking_orders(&mut *tx, id).await? {
        return Err(AppError::Core(CoreError::Conflict(
            "Service has active orders and cannot be deleted".into(),
        )));
    }

    let deactivated = ServiceRepo::has_orders(&mut *tx, id).await?;
    if deactivated {
        ServiceRepo::deactivate(&mut *tx, id).await?;
    } else {
        ServiceRepo::delete(&mut *tx, id).await?;
    }
    tx.commit().await?;

    if deactivated {
        tracing::info!(service_id = id, user_id = auth.user_id, "Service deactivated");
    } else {
        tracing::info!(service_id = id, user_id = auth.user_id, "Service deleted");
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn find_service(state: &AppState, id: DbId) -> AppResult<Service> {
    ServiceRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Service",
            id,
        }))
}

fn ensure_can_manage(auth: &AuthUser, service: &Service) -> AppResult<()> {
    if auth.is_admin() || service.provider_id == auth.user_id {
        return Ok(());
    }
    Err(AppError::Core(CoreError::Forbidden(
        "Only the owning provider can manage this service".into(),
    )))
}
