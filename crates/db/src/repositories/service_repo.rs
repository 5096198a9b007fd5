//! Repository for the `services` table.
//!
//! Deleting a service and booking it both lock the service row, so the
//! order checks below are generic over the executor and can run inside
//! the caller's transaction.

use sqlx::{PgConnection, PgExecutor, PgPool};
use youneed_core::order_status::BLOCKING_STATUSES;
use youneed_core::pagination::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT};
use youneed_core::types::DbId;

use crate::models::service::{CreateService, Service, ServiceListQuery, UpdateService};

/// Column list for `services` queries.
const COLUMNS: &str = "id, provider_id, name, description, category, price, duration_minutes, \
                       is_active, created_at, updated_at";

/// Provides CRUD operations for the service catalog.
pub struct ServiceRepo;

impl ServiceRepo {
    /// Insert a new service owned by `provider_id`, returning the created row.
    pub async fn create(
        pool: &PgPool,
        provider_id: DbId,
        input: &CreateService,
    ) -> Result<Service, sqlx::Error> {
        let query = format!(
            "INSERT INTO services (provider_id, name, description, category, price, duration_minutes)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Service>(&query)
            .bind(provider_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.category)
            .bind(input.price)
            .bind(input.duration_minutes)
            .fetch_one(pool)
            .await
    }

    /// Find a service by ID, active or not.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Service>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM services WHERE id = $1");
        sqlx::query_as::<_, Service>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a service and hold an exclusive row lock until the transaction ends.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Service>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM services WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Service>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Find a service and hold a shared row lock until the transaction ends.
    ///
    /// Concurrent bookings may share the lock; a delete waits for them.
    pub async fn find_for_share(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Service>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM services WHERE id = $1 FOR SHARE");
        sqlx::query_as::<_, Service>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// List active services, optionally filtered by provider and category.
    pub async fn list_active(
        pool: &PgPool,
        params: &ServiceListQuery,
    ) -> Result<Vec<Service>, sqlx::Error> {
        let limit = clamp_limit(params.limit, DEFAULT_LIMIT, MAX_LIMIT);
        let offset = clamp_offset(params.offset);

        let query = format!(
            "SELECT {COLUMNS} FROM services \
             WHERE is_active = true \
               AND ($1::BIGINT IS NULL OR provider_id = $1) \
               AND ($2::TEXT IS NULL OR category = $2) \
             ORDER BY name ASC, id ASC \
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Service>(&query)
            .bind(params.provider_id)
            .bind(&params.category)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Apply a partial update. Returns `None` if the service does not exist.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateService,
    ) -> Result<Option<Service>, sqlx::Error> {
        let query = format!(
            "UPDATE services SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                category = COALESCE($4, category), \
                price = COALESCE($5, price), \
                duration_minutes = COALESCE($6, duration_minutes), \
                is_active = COALESCE($7, is_active) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Service>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.category)
            .bind(input.price)
            .bind(input.duration_minutes)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Whether any order still occupying a calendar slot references the service.
    pub async fn has_blocking_orders<'e, E>(executor: E, id: DbId) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let statuses: Vec<&str> = BLOCKING_STATUSES.iter().map(|s| s.as_str()).collect();
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM orders WHERE service_id = $1 AND status = ANY($2))",
        )
        .bind(id)
        .bind(statuses)
        .fetch_one(executor)
        .await
    }

    /// Whether any order at all references the service.
    pub async fn has_orders<'e, E>(executor: E, id: DbId) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM orders WHERE service_id = $1)")
            .bind(id)
            .fetch_one(executor)
            .await
    }

    /// Hide a service from the catalog while keeping its order history.
    pub async fn deactivate<'e, E>(executor: E, id: DbId) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("UPDATE services SET is_active = false WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Permanently delete a service with no orders.
    pub async fn delete<'e, E>(executor: E, id: DbId) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM services WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
