pub mod auth;
pub mod health;
pub mod notification;
pub mod order;
pub mod provider;
pub mod service;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                       register (public)
/// /auth/login                          login (public)
/// /auth/me                             current user
///
/// /services                            list, create (provider)
/// /services/{id}                       get, update, delete (owner or admin)
///
/// /orders                              list (scoped by role), create
/// /orders/{id}                         get (parties, admin), delete (admin)
/// /orders/{id}/status                  change status (transition table)
///
/// /providers/{id}/availability         conflict check for a window
///
/// /notifications                       list
/// /notifications/unread-count          unread count
/// /notifications/read-all              mark all read
/// /notifications/{id}                  delete
/// /notifications/{id}/read             mark read
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/services", service::router())
        .nest("/orders", order::router())
        .nest("/providers", provider::router())
        .nest("/notifications", notification::router())
}
