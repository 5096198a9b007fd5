//! Route definitions for the `/orders` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::order;
use crate::state::AppState;

/// Routes mounted at `/orders`.
///
/// ```text
/// GET    /             -> list_orders
/// POST   /             -> create_order
/// GET    /{id}         -> get_order
/// DELETE /{id}         -> delete_order (admin)
/// PUT    /{id}/status  -> update_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(order::list_orders).post(order::create_order))
        .route("/{id}", get(order::get_order).delete(order::delete_order))
        .route("/{id}/status", put(order::update_status))
}
