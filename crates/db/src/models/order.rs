//! Order (booking) entity model, DTOs and response projections.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use youneed_core::error::CoreError;
use youneed_core::order_status::OrderStatus;
use youneed_core::types::{DbId, Timestamp};

use crate::models::user::UserSummary;

/// A row from the `orders` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: DbId,
    pub service_id: DbId,
    pub provider_id: DbId,
    pub client_id: Option<DbId>,
    pub created_by: DbId,
    pub title: String,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub start_at: Timestamp,
    pub end_at: Timestamp,
    pub status: String,
    pub total_amount: Decimal,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Order {
    /// Parse the stored status text.
    pub fn status(&self) -> Result<OrderStatus, CoreError> {
        self.status.parse()
    }
}

/// Booking request body for `POST /orders`.
///
/// Instants are kept as text and parsed by the booking handler so that a
/// missing or malformed `start_at` is reported as a validation error.
#[derive(Debug, Default, Deserialize)]
pub struct CreateOrderRequest {
    pub service_id: Option<DbId>,
    pub start_at: Option<String>,
    pub end_at: Option<String>,
    pub duration_minutes: Option<i32>,
    pub provider_id: Option<DbId>,
    pub client_id: Option<DbId>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

/// Fully resolved order ready for insertion.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub service_id: DbId,
    pub provider_id: DbId,
    pub client_id: Option<DbId>,
    pub created_by: DbId,
    pub title: String,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub start_at: Timestamp,
    pub end_at: Timestamp,
    pub status: OrderStatus,
    pub total_amount: Decimal,
}

/// Body for `PUT /orders/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatus {
    pub status: String,
}

/// Query parameters for `GET /orders`.
#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Which orders a listing may include.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    All,
    Provider(DbId),
    Client(DbId),
}

/// Order joined with the names of its service and parties.
#[derive(Debug, Clone, FromRow)]
pub struct OrderDetailRow {
    #[sqlx(flatten)]
    pub order: Order,
    pub service_name: String,
    pub provider_first_name: String,
    pub provider_last_name: String,
    pub client_first_name: Option<String>,
    pub client_last_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceSummary {
    pub id: DbId,
    pub name: String,
}

/// API projection of an order with its service, provider and client.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub service: ServiceSummary,
    pub provider: UserSummary,
    pub client: Option<UserSummary>,
}

impl From<OrderDetailRow> for OrderDetail {
    fn from(row: OrderDetailRow) -> Self {
        let client = match (row.order.client_id, row.client_first_name, row.client_last_name) {
            (Some(id), Some(first_name), Some(last_name)) => Some(UserSummary {
                id,
                first_name,
                last_name,
            }),
            _ => None,
        };
        OrderDetail {
            service: ServiceSummary {
                id: row.order.service_id,
                name: row.service_name,
            },
            provider: UserSummary {
                id: row.order.provider_id,
                first_name: row.provider_first_name,
                last_name: row.provider_last_name,
            },
            client,
            order: row.order,
        }
    }
}
