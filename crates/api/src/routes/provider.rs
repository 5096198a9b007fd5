//! Route definitions for provider calendars.

use axum::routing::get;
use axum::Router;

use crate::handlers::order;
use crate::state::AppState;

/// Routes mounted at `/providers`.
///
/// ```text
/// GET /{id}/availability  -> provider_availability
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/availability", get(order::provider_availability))
}
