//! Booking time windows and order-creation validation helpers.

use chrono::Duration;

use crate::error::CoreError;
use crate::types::Timestamp;

/// Fallback booking length when neither the request nor the service
/// specifies a duration.
pub const DEFAULT_DURATION_MINUTES: i32 = 30;

/// Longest bookable window (one week).
pub const MAX_DURATION_MINUTES: i64 = 7 * 24 * 60;

pub const MAX_TITLE_LENGTH: usize = 200;
pub const MAX_NOTES_LENGTH: usize = 5_000;

/// A half-open `[start, end)` interval on a provider's calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    start: Timestamp,
    end: Timestamp,
}

impl TimeRange {
    /// Build a range, rejecting empty or inverted windows.
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, CoreError> {
        if end <= start {
            return Err(CoreError::Validation(format!(
                "End time {end} must be after start time {start}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn end(&self) -> Timestamp {
        self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Half-open overlap: ranges that merely touch do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        !(other.end <= self.start || other.start >= self.end)
    }
}

/// Compute the booked window for an order.
///
/// An explicit `end_at` wins and must be after `start_at`. Otherwise the
/// length is the requested duration, then the service duration, then
/// `default_minutes`. Either way the window may not exceed one week.
pub fn resolve_window(
    start_at: Timestamp,
    end_at: Option<Timestamp>,
    duration_minutes: Option<i32>,
    service_duration_minutes: Option<i32>,
    default_minutes: i32,
) -> Result<TimeRange, CoreError> {
    if let Some(end_at) = end_at {
        let window = TimeRange::new(start_at, end_at)?;
        ensure_within_cap(window.duration_minutes())?;
        return Ok(window);
    }

    if let Some(requested) = duration_minutes {
        if requested <= 0 {
            return Err(CoreError::Validation(
                "Duration must be a positive number of minutes".to_string(),
            ));
        }
    }

    let minutes = i64::from(
        duration_minutes
            .or(service_duration_minutes)
            .unwrap_or(default_minutes),
    );
    if minutes <= 0 {
        return Err(CoreError::Validation(
            "Booking duration must be positive".to_string(),
        ));
    }
    ensure_within_cap(minutes)?;

    TimeRange::new(start_at, start_at + Duration::minutes(minutes))
}

fn ensure_within_cap(minutes: i64) -> Result<(), CoreError> {
    if minutes > MAX_DURATION_MINUTES {
        return Err(CoreError::Validation(format!(
            "Booking duration exceeds maximum of {MAX_DURATION_MINUTES} minutes"
        )));
    }
    Ok(())
}

/// Validate the optional free-text fields of a booking request.
pub fn validate_booking_text(
    title: Option<&str>,
    description: Option<&str>,
    notes: Option<&str>,
) -> Result<(), CoreError> {
    if let Some(title) = title {
        if title.trim().is_empty() {
            return Err(CoreError::Validation("Title must not be blank".to_string()));
        }
        if title.len() > MAX_TITLE_LENGTH {
            return Err(CoreError::Validation(format!(
                "Title exceeds maximum length of {MAX_TITLE_LENGTH} characters"
            )));
        }
    }
    for (field, value) in [("Description", description), ("Notes", notes)] {
        if value.is_some_and(|v| v.len() > MAX_NOTES_LENGTH) {
            return Err(CoreError::Validation(format!(
                "{field} exceeds maximum length of {MAX_NOTES_LENGTH} characters"
            )));
        }
    }
    Ok(())
}
