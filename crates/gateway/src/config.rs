//! Gateway connection configuration.

use std::time::Duration;

/// Configuration for the payment gateway client.
///
/// Constructed once at startup and passed into the client explicitly;
/// there is no global configuration state.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the gateway API.
    pub base_url: String,

    /// OAuth client ID for the client-credentials grant.
    pub client_id: String,

    /// OAuth client secret for the client-credentials grant.
    pub client_secret: String,

    /// ISO currency code sent with every charge.
    pub currency: String,

    /// Timeout applied to each gateway HTTP call. The gateway cannot be
    /// trusted to respond promptly, particularly during a 3DS challenge.
    pub request_timeout: Duration,

    /// How many times the token leg is attempted before giving up.
    pub token_attempts: u32,

    /// Initial backoff between token attempts; doubles per retry.
    pub token_backoff: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://sandbox.wompi.co".to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            currency: "COP".to_string(),
            request_timeout: Duration::from_secs(30),
            token_attempts: 3,
            token_backoff: Duration::from_millis(250),
        }
    }
}
