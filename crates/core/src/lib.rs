//! Domain building blocks shared by the YouNeed crates.
//!
//! This crate has no internal dependencies so that the repository layer,
//! the notification dispatcher and the HTTP layer can all depend on it.

pub mod booking;
pub mod error;
pub mod notification;
pub mod order_status;
pub mod pagination;
pub mod roles;
pub mod types;
