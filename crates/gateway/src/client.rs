//! Gateway trait and HTTP implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::types::{AccessToken, ChargeMode, ChargeOutcome, ChargeRequest};

const TOKEN_PATH: &str = "/v1/security/tokens";
const CHARGE_PATH: &str = "/v1/charges";

/// Trait for payment gateway operations.
///
/// Implemented by the HTTP client and by the in-memory test double.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Acquires a fresh bearer token via the client-credentials grant.
    ///
    /// The identity endpoint is idempotent and side-effect-free, so
    /// implementations may retry internally with bounded backoff.
    async fn request_token(&self) -> Result<AccessToken, GatewayError>;

    /// Submits a charge. Never retried by implementations: an ambiguous
    /// outcome is reported as `ChargeAmbiguous` for the caller to
    /// reconcile.
    async fn submit_charge(
        &self,
        token: &AccessToken,
        request: &ChargeRequest,
    ) -> Result<ChargeOutcome, GatewayError>;

    /// Reconciliation query: looks up a charge by its order reference.
    ///
    /// Returns None when the gateway has no record of the reference.
    async fn lookup_charge(&self, reference: &str)
    -> Result<Option<ChargeOutcome>, GatewayError>;
}

#[derive(Serialize)]
struct TokenBody<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Serialize)]
struct ChargeBody<'a> {
    reference: &'a str,
    amount_cents: i64,
    currency: &'a str,
    #[serde(flatten)]
    mode: &'a ChargeMode,
}

#[derive(Deserialize)]
struct ChargeResponseBody {
    #[serde(default)]
    transaction_id: Option<String>,
    status: String,
    #[serde(default)]
    reason: Option<String>,
}

fn parse_outcome(body: ChargeResponseBody) -> Result<ChargeOutcome, GatewayError> {
    if body.status == "APROBADA" {
        let transaction_id = body.transaction_id.ok_or_else(|| {
            GatewayError::UnexpectedResponse(
                "approved charge without a transaction id".to_string(),
            )
        })?;
        Ok(ChargeOutcome::Approved { transaction_id })
    } else {
        Ok(ChargeOutcome::Rejected {
            transaction_id: body.transaction_id,
            reason: body.reason.unwrap_or(body.status),
        })
    }
}

/// HTTP client for the payment gateway.
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl HttpPaymentGateway {
    /// Creates a new gateway client from explicit configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn try_token(&self) -> Result<AccessToken, GatewayError> {
        let body = TokenBody {
            grant_type: "client_credentials",
            client_id: &self.config.client_id,
            client_secret: &self.config.client_secret,
        };

        let response = self
            .client
            .post(self.url(TOKEN_PATH))
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::UnexpectedResponse(format!(
                "token endpoint returned HTTP {}",
                response.status()
            )));
        }

        response
            .json::<AccessToken>()
            .await
            .map_err(|e| GatewayError::UnexpectedResponse(e.to_string()))
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    #[tracing::instrument(skip(self))]
    async fn request_token(&self) -> Result<AccessToken, GatewayError> {
        let mut backoff = self.config.token_backoff;
        let mut last_error = String::new();

        for attempt in 0..self.config.token_attempts.max(1) {
            if attempt > 0 {
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }

            match self.try_token().await {
                Ok(token) => return Ok(token),
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "gateway token request failed");
                    last_error = e.to_string();
                }
            }
        }

        Err(GatewayError::TokenAcquisitionFailed(last_error))
    }

    #[tracing::instrument(skip(self, token, request), fields(reference = %request.reference))]
    async fn submit_charge(
        &self,
        token: &AccessToken,
        request: &ChargeRequest,
    ) -> Result<ChargeOutcome, GatewayError> {
        request.validate()?;

        let body = ChargeBody {
            reference: &request.reference,
            amount_cents: request.amount.cents(),
            currency: &request.currency,
            mode: &request.mode,
        };

        let response = self
            .client
            .post(self.url(CHARGE_PATH))
            .bearer_auth(&token.token)
            .json(&body)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            // A connect failure cannot have reached the gateway; anything
            // after that point (timeout, broken response) is ambiguous.
            Err(e) if e.is_connect() => {
                return Err(GatewayError::Transport(e.to_string()));
            }
            Err(e) => {
                return Err(GatewayError::ChargeAmbiguous(e.to_string()));
            }
        };

        let status = response.status();
        if status.is_server_error() {
            // The gateway may have processed the charge before failing.
            return Err(GatewayError::ChargeAmbiguous(format!(
                "charge endpoint returned HTTP {status}"
            )));
        }

        let body: ChargeResponseBody = response
            .json()
            .await
            .map_err(|e| GatewayError::ChargeAmbiguous(e.to_string()))?;

        parse_outcome(body)
    }

    #[tracing::instrument(skip(self))]
    async fn lookup_charge(
        &self,
        reference: &str,
    ) -> Result<Option<ChargeOutcome>, GatewayError> {
        let token = self.request_token().await?;

        let response = self
            .client
            .get(self.url(&format!("{CHARGE_PATH}/reference/{reference}")))
            .bearer_auth(&token.token)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(GatewayError::UnexpectedResponse(format!(
                "lookup endpoint returned HTTP {}",
                response.status()
            )));
        }

        let body: ChargeResponseBody = response
            .json()
            .await
            .map_err(|e| GatewayError::UnexpectedResponse(e.to_string()))?;

        parse_outcome(body).map(Some)
    }
}
