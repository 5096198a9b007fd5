use std::sync::Arc;

use youneed_events::NotificationDispatcher;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: youneed_db::DbPool,
    /// Server configuration (JWT settings, booking defaults).
    pub config: Arc<ServerConfig>,
    /// Best-effort in-app notification queue.
    pub notifier: NotificationDispatcher,
}
