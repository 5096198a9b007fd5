//! Persistence seam for the notification worker.

use async_trait::async_trait;
use youneed_core::types::DbId;
use youneed_db::models::notification::NewNotification;
use youneed_db::repositories::NotificationRepo;
use youneed_db::DbPool;

/// Destination for dispatched notifications.
#[async_trait]
pub trait NotificationStore: Send + Sync + 'static {
    /// Persist one notification, returning its id.
    async fn store(&self, notification: &NewNotification) -> Result<DbId, sqlx::Error>;
}

/// Stores notifications as rows in the `notifications` table.
pub struct PgNotificationStore {
    pool: DbPool,
}

impl PgNotificationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn store(&self, notification: &NewNotification) -> Result<DbId, sqlx::Error> {
        NotificationRepo::create(&self.pool, notification).await
    }
}
