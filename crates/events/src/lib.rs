//! Best-effort side effects of the order lifecycle.
//!
//! - [`NotificationDispatcher`] -- non-blocking handle that enqueues in-app
//!   notifications for a background worker.
//! - [`NotificationStore`] -- where the worker persists them;
//!   [`PgNotificationStore`] writes the `notifications` table.

pub mod dispatcher;
pub mod store;

pub use dispatcher::NotificationDispatcher;
pub use store::{NotificationStore, PgNotificationStore};
