//! Notification kinds and message text for order side effects.
//!
//! Kinds are stored in `notifications.kind`; the related type is stored in
//! `notifications.related_type` alongside the order id.

use crate::order_status::OrderStatus;
use crate::types::Timestamp;

pub const KIND_ORDER_CREATED: &str = "order_created";
pub const KIND_ORDER_STATUS_CHANGED: &str = "order_status_changed";

pub const RELATED_TYPE_ORDER: &str = "order";

/// Message for the counterpart of a newly created booking.
pub fn order_created_message(title: &str, start_at: Timestamp) -> String {
    format!(
        "New booking \"{title}\" on {}",
        start_at.format("%Y-%m-%d %H:%M UTC")
    )
}

/// Message for a party whose order changed status.
pub fn order_status_message(title: &str, status: OrderStatus) -> String {
    let verb = match status {
        OrderStatus::Pending => "is pending again",
        OrderStatus::Accepted => "was accepted",
        OrderStatus::InProgress => "is in progress",
        OrderStatus::Completed => "was completed",
        OrderStatus::Rejected => "was rejected",
        OrderStatus::Cancelled => "was cancelled",
    };
    format!("Booking \"{title}\" {verb}")
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn created_message_includes_title_and_time() {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        assert_eq!(
            order_created_message("Haircut", start),
            "New booking \"Haircut\" on 2026-03-02 10:00 UTC"
        );
    }

    #[test]
    fn status_message_describes_new_status() {
        assert_eq!(
            order_status_message("Haircut", OrderStatus::Accepted),
            "Booking \"Haircut\" was accepted"
        );
    }
}
