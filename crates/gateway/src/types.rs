//! Typed payloads for the gateway protocol.

use domain::Money;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// A short-lived bearer token from the gateway's identity endpoint.
///
/// Tokens are acquired per payment attempt and never cached across
/// orders, so a token can't expire mid-3DS-redirect.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    /// The bearer token value.
    #[serde(rename = "access_token")]
    pub token: String,

    /// Server-declared lifetime in seconds.
    #[serde(default)]
    pub expires_in: u64,
}

/// Cardholder browser fields required by a 3DS challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserInfo {
    /// Browser user agent string.
    pub user_agent: String,

    /// Accept header the browser sent.
    pub accept_header: String,

    /// Browser language tag.
    pub language: String,

    /// Screen width in pixels.
    pub screen_width: u32,

    /// Screen height in pixels.
    pub screen_height: u32,
}

/// A direct tokenized charge, no cardholder challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectCharge {
    /// Card token issued by the gateway's tokenization endpoint.
    pub card_token: String,

    /// Number of installments.
    pub installments: u32,

    /// Cardholder email for the gateway receipt.
    pub customer_email: String,
}

/// A charge that routes the cardholder through a 3DS challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreeDsCharge {
    /// Card token issued by the gateway's tokenization endpoint.
    pub card_token: String,

    /// Number of installments.
    pub installments: u32,

    /// Cardholder email for the gateway receipt.
    pub customer_email: String,

    /// Where the gateway redirects after the challenge.
    pub return_url: String,

    /// Browser fields the challenge flow requires.
    pub browser: BrowserInfo,
}

/// The two charge modes the gateway supports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChargeMode {
    /// Direct tokenized charge.
    Direct(DirectCharge),

    /// 3DS-challenge charge.
    ThreeDs(ThreeDsCharge),
}

/// A complete charge request for one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeRequest {
    /// Stable order reference, used for reconciliation lookups.
    pub reference: String,

    /// Amount to charge, in minor units on the wire.
    pub amount: Money,

    /// ISO currency code.
    pub currency: String,

    /// Charge mode and its card/billing fields.
    pub mode: ChargeMode,
}

impl ChargeRequest {
    /// Validates the request before serialization.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.reference.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "missing order reference".to_string(),
            ));
        }
        if !self.amount.is_positive() {
            return Err(GatewayError::InvalidRequest(format!(
                "amount must be positive, got {} cents",
                self.amount.cents()
            )));
        }

        let (card_token, installments, email) = match &self.mode {
            ChargeMode::Direct(charge) => (
                &charge.card_token,
                charge.installments,
                &charge.customer_email,
            ),
            ChargeMode::ThreeDs(charge) => {
                if charge.return_url.trim().is_empty() {
                    return Err(GatewayError::InvalidRequest(
                        "3DS charge requires a return URL".to_string(),
                    ));
                }
                (
                    &charge.card_token,
                    charge.installments,
                    &charge.customer_email,
                )
            }
        };

        if card_token.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "missing card token".to_string(),
            ));
        }
        if installments == 0 {
            return Err(GatewayError::InvalidRequest(
                "installments must be at least 1".to_string(),
            ));
        }
        if !email.contains('@') {
            return Err(GatewayError::InvalidRequest(format!(
                "invalid customer email: {email}"
            )));
        }

        Ok(())
    }
}

/// The settled outcome of a charge, as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargeOutcome {
    /// The gateway approved the charge (wire status `APROBADA`).
    Approved {
        /// Transaction ID assigned by the gateway.
        transaction_id: String,
    },

    /// The gateway rejected the charge.
    Rejected {
        /// Transaction ID, if the gateway assigned one to the rejection.
        transaction_id: Option<String>,
        /// Rejection reason.
        reason: String,
    },
}

impl ChargeOutcome {
    /// Returns true if the charge was approved.
    pub fn is_approved(&self) -> bool {
        matches!(self, ChargeOutcome::Approved { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct_request() -> ChargeRequest {
        ChargeRequest {
            reference: "order-1".to_string(),
            amount: Money::from_cents(4498),
            currency: "COP".to_string(),
            mode: ChargeMode::Direct(DirectCharge {
                card_token: "tok_123".to_string(),
                installments: 1,
                customer_email: "ana@example.com".to_string(),
            }),
        }
    }

    #[test]
    fn test_valid_direct_request() {
        assert!(direct_request().validate().is_ok());
    }

    #[test]
    fn test_zero_amount_rejected() {
        let mut request = direct_request();
        request.amount = Money::zero();
        assert!(matches!(
            request.validate(),
            Err(GatewayError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_missing_card_token_rejected() {
        let mut request = direct_request();
        request.mode = ChargeMode::Direct(DirectCharge {
            card_token: "  ".to_string(),
            installments: 1,
            customer_email: "ana@example.com".to_string(),
        });
        assert!(matches!(
            request.validate(),
            Err(GatewayError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_three_ds_requires_return_url() {
        let mut request = direct_request();
        request.mode = ChargeMode::ThreeDs(ThreeDsCharge {
            card_token: "tok_123".to_string(),
            installments: 1,
            customer_email: "ana@example.com".to_string(),
            return_url: String::new(),
            browser: BrowserInfo {
                user_agent: "Mozilla/5.0".to_string(),
                accept_header: "*/*".to_string(),
                language: "es-CO".to_string(),
                screen_width: 390,
                screen_height: 844,
            },
        });
        assert!(matches!(
            request.validate(),
            Err(GatewayError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_charge_mode_is_tagged_on_the_wire() {
        let request = direct_request();
        let json = serde_json::to_value(&request.mode).unwrap();
        assert_eq!(json["kind"], "direct");
        assert_eq!(json["card_token"], "tok_123");
    }

    #[test]
    fn test_outcome_approved_helper() {
        let approved = ChargeOutcome::Approved {
            transaction_id: "TX-1".to_string(),
        };
        let rejected = ChargeOutcome::Rejected {
            transaction_id: None,
            reason: "fondos insuficientes".to_string(),
        };
        assert!(approved.is_approved());
        assert!(!rejected.is_approved());
    }
}
