use thiserror::Error;

/// Errors that can occur when talking to the payment gateway.
///
/// The classification matters for money-safety: `Transport` means the
/// request cannot have reached the gateway and is safe to retry;
/// `ChargeAmbiguous` means it may have, so a blind retry risks a double
/// debit and the outcome must be reconciled first.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The token leg failed after bounded retries.
    #[error("token acquisition failed: {0}")]
    TokenAcquisitionFailed(String),

    /// The charge outcome is unknown: the request may have been processed.
    #[error("charge outcome ambiguous: {0}")]
    ChargeAmbiguous(String),

    /// The request never reached the gateway.
    #[error("gateway transport error: {0}")]
    Transport(String),

    /// The charge request failed local validation before serialization.
    #[error("invalid charge request: {0}")]
    InvalidRequest(String),

    /// The gateway answered with something this client cannot interpret.
    #[error("unexpected gateway response: {0}")]
    UnexpectedResponse(String),
}
