pub mod auth;
pub mod notification;
pub mod order;
pub mod service;
