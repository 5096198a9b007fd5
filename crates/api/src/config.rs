use youneed_core::booking::DEFAULT_DURATION_MINUTES;
use youneed_events::dispatcher::DEFAULT_QUEUE_CAPACITY;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Booking length used when neither the request nor the service gives one.
    pub default_service_duration_mins: i32,
    /// Capacity of the outbound notification queue.
    pub notification_queue_capacity: usize,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default                 |
    /// |---------------------------------|-------------------------|
    /// | `HOST`                          | `0.0.0.0`               |
    /// | `PORT`                          | `3000`                  |
    /// | `CORS_ORIGINS`                  | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`          | `30`                    |
    /// | `DEFAULT_SERVICE_DURATION_MINS` | `30`                    |
    /// | `NOTIFICATION_QUEUE_CAPACITY`   | `1024`                  |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let default_service_duration_mins: i32 = std::env::var("DEFAULT_SERVICE_DURATION_MINS")
            .unwrap_or_else(|_| DEFAULT_DURATION_MINUTES.to_string())
            .parse()
            .expect("DEFAULT_SERVICE_DURATION_MINS must be a valid i32");
        assert!(
            default_service_duration_mins > 0,
            "DEFAULT_SERVICE_DURATION_MINS must be positive"
        );

        let notification_queue_capacity: usize = std::env::var("NOTIFICATION_QUEUE_CAPACITY")
            .unwrap_or_else(|_| DEFAULT_QUEUE_CAPACITY.to_string())
            .parse()
            .expect("NOTIFICATION_QUEUE_CAPACITY must be a valid usize");

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            default_service_duration_mins,
            notification_queue_capacity,
            jwt,
        }
    }
}
