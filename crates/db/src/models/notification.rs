//! Notification entity model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use youneed_core::types::{DbId, Timestamp};

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    pub message: String,
    pub kind: String,
    pub related_id: Option<DbId>,
    pub related_type: Option<String>,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// DTO for inserting a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: DbId,
    pub message: String,
    pub kind: String,
    pub related_id: Option<DbId>,
    pub related_type: Option<String>,
}
