//! Repository for the `orders` table.
//!
//! Booking creation and status changes run inside a caller-owned
//! transaction, so those methods take `&mut PgConnection`.

use sqlx::{PgConnection, PgExecutor, PgPool};
use youneed_core::booking::TimeRange;
use youneed_core::order_status::{OrderStatus, BLOCKING_STATUSES};
use youneed_core::pagination::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT};
use youneed_core::types::DbId;

use crate::models::order::{NewOrder, Order, OrderDetail, OrderDetailRow, OrderScope};

/// Column list for `orders` queries.
const COLUMNS: &str = "id, service_id, provider_id, client_id, created_by, title, description, \
                       notes, start_at, end_at, status, total_amount, created_at, updated_at";

/// Select list and joins producing an [`OrderDetailRow`].
const DETAIL_SELECT: &str = "SELECT o.id, o.service_id, o.provider_id, o.client_id, o.created_by, \
        o.title, o.description, o.notes, o.start_at, o.end_at, o.status, o.total_amount, \
        o.created_at, o.updated_at, \
        s.name AS service_name, \
        p.first_name AS provider_first_name, p.last_name AS provider_last_name, \
        c.first_name AS client_first_name, c.last_name AS client_last_name \
     FROM orders o \
     JOIN services s ON s.id = o.service_id \
     JOIN users p ON p.id = o.provider_id \
     LEFT JOIN users c ON c.id = o.client_id";

fn blocking_status_names() -> Vec<&'static str> {
    BLOCKING_STATUSES.iter().map(|s| s.as_str()).collect()
}

/// Provides booking persistence and the calendar conflict check.
pub struct OrderRepo;

impl OrderRepo {
    /// Whether any calendar-blocking order of `provider_id` overlaps `window`.
    ///
    /// Overlap is half-open: an existing order ending exactly at
    /// `window.start()` does not conflict. `exclude_order_id` skips one
    /// order, e.g. the one being rescheduled.
    pub async fn has_conflict<'e, E>(
        executor: E,
        provider_id: DbId,
        window: &TimeRange,
        exclude_order_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "SELECT EXISTS ( \
                SELECT 1 FROM orders \
                WHERE provider_id = $1 \
                  AND status = ANY($2) \
                  AND NOT (end_at <= $3 OR start_at >= $4) \
                  AND ($5::BIGINT IS NULL OR id <> $5) \
             )",
        )
        .bind(provider_id)
        .bind(blocking_status_names())
        .bind(window.start())
        .bind(window.end())
        .bind(exclude_order_id)
        .fetch_one(executor)
        .await
    }

    /// Insert a resolved order, returning the created row.
    pub async fn insert(conn: &mut PgConnection, input: &NewOrder) -> Result<Order, sqlx::Error> {
        let query = format!(
            "INSERT INTO orders \
                (service_id, provider_id, client_id, created_by, title, description, notes, \
                 start_at, end_at, status, total_amount) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(input.service_id)
            .bind(input.provider_id)
            .bind(input.client_id)
            .bind(input.created_by)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.notes)
            .bind(input.start_at)
            .bind(input.end_at)
            .bind(input.status.as_str())
            .bind(input.total_amount)
            .fetch_one(conn)
            .await
    }

    /// Find an order and hold a row lock on it until the transaction ends.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Persist a new status. The caller has already authorized the change.
    pub async fn update_status(
        conn: &mut PgConnection,
        id: DbId,
        status: OrderStatus,
    ) -> Result<Order, sqlx::Error> {
        let query = format!("UPDATE orders SET status = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(status.as_str())
            .fetch_one(conn)
            .await
    }

    /// Find an order together with its service and party names.
    pub async fn find_detail(pool: &PgPool, id: DbId) -> Result<Option<OrderDetail>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} WHERE o.id = $1");
        let row = sqlx::query_as::<_, OrderDetailRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(OrderDetail::from))
    }

    /// List orders visible in `scope`, earliest start first.
    pub async fn list(
        pool: &PgPool,
        scope: OrderScope,
        status: Option<OrderStatus>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<OrderDetail>, sqlx::Error> {
        let limit = clamp_limit(limit, DEFAULT_LIMIT, MAX_LIMIT);
        let offset = clamp_offset(offset);

        let (provider_id, client_id) = match scope {
            OrderScope::All => (None, None),
            OrderScope::Provider(id) => (Some(id), None),
            OrderScope::Client(id) => (None, Some(id)),
        };

        let query = format!(
            "{DETAIL_SELECT} \
             WHERE ($1::BIGINT IS NULL OR o.provider_id = $1) \
               AND ($2::BIGINT IS NULL OR o.client_id = $2) \
               AND ($3::TEXT IS NULL OR o.status = $3) \
             ORDER BY o.start_at ASC, o.id ASC \
             LIMIT $4 OFFSET $5"
        );
        let rows = sqlx::query_as::<_, OrderDetailRow>(&query)
            .bind(provider_id)
            .bind(client_id)
            .bind(status.map(OrderStatus::as_str))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(OrderDetail::from).collect())
    }

    /// Hard-delete an order, bypassing the status gate.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
