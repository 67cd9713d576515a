//! Application configuration loaded from environment variables.

use std::time::Duration;

use gateway::GatewayConfig;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `WOMPI_BASE_URL`, `WOMPI_CLIENT_ID`, `WOMPI_CLIENT_SECRET` — gateway
///   credentials
/// - `WOMPI_CURRENCY` — charge currency (default: `"COP"`)
/// - `WOMPI_TIMEOUT_MS` — per-call gateway timeout (default: `30000`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub gateway: GatewayConfig,
}

impl Config {
    /// Loads configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let defaults = GatewayConfig::default();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            gateway: GatewayConfig {
                base_url: std::env::var("WOMPI_BASE_URL").unwrap_or(defaults.base_url),
                client_id: std::env::var("WOMPI_CLIENT_ID").unwrap_or(defaults.client_id),
                client_secret: std::env::var("WOMPI_CLIENT_SECRET")
                    .unwrap_or(defaults.client_secret),
                currency: std::env::var("WOMPI_CURRENCY").unwrap_or(defaults.currency),
                request_timeout: std::env::var("WOMPI_TIMEOUT_MS")
                    .ok()
                    .and_then(|ms| ms.parse().ok())
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.request_timeout),
                token_attempts: std::env::var("WOMPI_TOKEN_ATTEMPTS")
                    .ok()
                    .and_then(|n| n.parse().ok())
                    .unwrap_or(defaults.token_attempts),
                token_backoff: defaults.token_backoff,
            },
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            gateway: GatewayConfig::default(),
        }
    }
}
