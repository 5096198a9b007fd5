//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Methods that must run
//! inside a booking transaction take `&mut PgConnection` instead.

pub mod notification_repo;
pub mod order_repo;
pub mod service_repo;
pub mod user_repo;

pub use notification_repo::NotificationRepo;
pub use order_repo::OrderRepo;
pub use service_repo::ServiceRepo;
pub use user_repo::UserRepo;
