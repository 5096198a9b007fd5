//! Fire-and-forget notification dispatch.
//!
//! [`NotificationDispatcher::notify`] only enqueues; a background worker
//! drains the queue into a [`NotificationStore`]. A failed insert is logged
//! and dropped, never retried, and never reported to the caller. A full or
//! closed queue drops the notification with a warning.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use youneed_core::notification::RELATED_TYPE_ORDER;
use youneed_core::types::DbId;
use youneed_db::models::notification::NewNotification;

use crate::store::NotificationStore;

/// Default number of notifications that may wait in the queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

enum Command {
    Deliver(NewNotification),
    Flush(oneshot::Sender<()>),
}

/// Cheaply cloneable handle to the notification worker.
#[derive(Clone)]
pub struct NotificationDispatcher {
    sender: mpsc::Sender<Command>,
}

impl NotificationDispatcher {
    /// Spawn the worker and return a handle to it.
    ///
    /// The worker exits once every handle has been dropped and the queue
    /// is drained.
    pub fn start<S: NotificationStore>(store: S, capacity: usize) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(run_worker(store, receiver));
        (Self { sender }, handle)
    }

    /// Queue a notification about an order for `recipient`.
    pub fn notify(&self, recipient: DbId, kind: &str, message: String, order_id: DbId) {
        self.enqueue(NewNotification {
            user_id: recipient,
            message,
            kind: kind.to_string(),
            related_id: Some(order_id),
            related_type: Some(RELATED_TYPE_ORDER.to_string()),
        });
    }

    /// Queue an arbitrary notification.
    pub fn enqueue(&self, notification: NewNotification) {
        let user_id = notification.user_id;
        if let Err(e) = self.sender.try_send(Command::Deliver(notification)) {
            let reason = match e {
                mpsc::error::TrySendError::Full(_) => "queue full",
                mpsc::error::TrySendError::Closed(_) => "worker stopped",
            };
            tracing::warn!(user_id, reason, "Dropping notification");
        }
    }

    /// Wait until everything queued before this call has been processed.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.sender.send(Command::Flush(tx)).await.is_err() {
            return;
        }
        let _ = rx.await;
    }
}

async fn run_worker<S: NotificationStore>(store: S, mut receiver: mpsc::Receiver<Command>) {
    while let Some(command) = receiver.recv().await {
        match command {
            Command::Deliver(notification) => match store.store(&notification).await {
                Ok(id) => {
                    tracing::debug!(
                        notification_id = id,
                        user_id = notification.user_id,
                        kind = %notification.kind,
                        "Notification stored"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        user_id = notification.user_id,
                        kind = %notification.kind,
                        "Failed to store notification"
                    );
                }
            },
            Command::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
    tracing::info!("Notification queue closed, dispatcher worker shutting down");
}
