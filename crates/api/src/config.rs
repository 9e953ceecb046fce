use std::time::Duration;

use carbuy_engine::{EngineConfig, RetentionPolicy};

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Grace period for background tasks after the server stops (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Seconds a finished job stays queryable (default: `86400`).
    pub registry_retention_secs: u64,
    /// Soft cap on stored jobs (default: `10000`).
    pub registry_max_records: usize,
    /// How often the registry reaper runs, in seconds (default: `300`).
    pub registry_reap_interval_secs: u64,
    /// Analysis collaborator settings.
    pub engine: EngineConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                 |
    /// |-------------------------------|-------------------------|
    /// | `HOST`                        | `0.0.0.0`               |
    /// | `PORT`                        | `5000`                  |
    /// | `CORS_ORIGINS`                | `http://localhost:5000` |
    /// | `REQUEST_TIMEOUT_SECS`        | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`       | `30`                    |
    /// | `REGISTRY_RETENTION_SECS`     | `86400`                 |
    /// | `REGISTRY_MAX_RECORDS`        | `10000`                 |
    /// | `REGISTRY_REAP_INTERVAL_SECS` | `300`                   |
    ///
    /// Analysis settings are read by [`EngineConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let registry_retention_secs: u64 = std::env::var("REGISTRY_RETENTION_SECS")
            .unwrap_or_else(|_| "86400".into())
            .parse()
            .expect("REGISTRY_RETENTION_SECS must be a valid u64");

        let registry_max_records: usize = std::env::var("REGISTRY_MAX_RECORDS")
            .unwrap_or_else(|_| "10000".into())
            .parse()
            .expect("REGISTRY_MAX_RECORDS must be a valid usize");

        let registry_reap_interval_secs: u64 = std::env::var("REGISTRY_REAP_INTERVAL_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("REGISTRY_REAP_INTERVAL_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            registry_retention_secs,
            registry_max_records,
            registry_reap_interval_secs,
            engine: EngineConfig::from_env(),
        }
    }

    pub fn retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy {
            retention: Duration::from_secs(self.registry_retention_secs),
            max_records: self.registry_max_records,
        }
    }

    pub fn reap_interval(&self) -> Duration {
        // interval() panics on a zero period.
        Duration::from_secs(self.registry_reap_interval_secs.max(1))
    }
}
