use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development except the JWT
/// secret. In production, override via environment variables.
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
    /// How long background services get to stop after the server (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// JWT token configuration.
    pub jwt: JwtConfig,
    /// Audit entries older than this are removed by the retention job.
    pub audit_retention_days: i64,
    /// Lifetime of public quote signing links.
    pub signing_link_ttl_hours: i64,
    /// Interval between outbox polls in seconds.
    pub outbox_poll_interval_secs: u64,
    /// Outbox rows claimed per drain.
    pub outbox_batch_size: i64,
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{name} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                    |
    /// |-----------------------------|----------------------------|
    /// | `HOST`                      | `0.0.0.0`                  |
    /// | `PORT`                      | `3000`                     |
    /// | `CORS_ORIGINS`              | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`     | `30`                       |
    /// | `AUDIT_RETENTION_DAYS`      | `3650`                     |
    /// | `SIGNING_LINK_TTL_HOURS`    | `168`                      |
    /// | `OUTBOX_POLL_INTERVAL_SECS` | `10`                       |
    /// | `OUTBOX_BATCH_SIZE`         | `50`                       |
    ///
    /// # Panics
    ///
    /// Panics on unparsable values and when `JWT_SECRET` is missing.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            host,
            port: env_or("PORT", 3000),
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            shutdown_timeout_secs: env_or("SHUTDOWN_TIMEOUT_SECS", 30),
            jwt: JwtConfig::from_env(),
            audit_retention_days: env_or(
                "AUDIT_RETENTION_DAYS",
                atelier_core::audit::DEFAULT_RETENTION_DAYS,
            ),
            signing_link_ttl_hours: env_or(
                "SIGNING_LINK_TTL_HOURS",
                atelier_core::signing::DEFAULT_LINK_TTL_HOURS,
            ),
            outbox_poll_interval_secs: env_or("OUTBOX_POLL_INTERVAL_SECS", 10),
            outbox_batch_size: env_or(
                "OUTBOX_BATCH_SIZE",
                atelier_events::dispatcher::DEFAULT_BATCH_SIZE,
            ),
        }
    }
}
