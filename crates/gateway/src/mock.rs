//! In-memory gateway for testing.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use crate::client::PaymentGateway;
use crate::error::GatewayError;
use crate::types::{AccessToken, ChargeOutcome, ChargeRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChargeBehavior {
    Approve,
    Decline,
    Timeout,
}

#[derive(Debug)]
struct MockState {
    behavior: ChargeBehavior,
    decline_reason: String,
    fail_token: bool,
    lookup_unavailable: bool,
    /// When timing out, still record the charge as approved on the gateway
    /// side, simulating a request that landed but whose response was lost.
    record_on_timeout: bool,
    /// Artificial latency before the charge settles.
    charge_delay: Option<Duration>,
    charges: HashMap<String, ChargeOutcome>,
    next_id: u32,
    charge_attempts: u32,
    token_requests: u32,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            behavior: ChargeBehavior::Approve,
            decline_reason: "RECHAZADA".to_string(),
            fail_token: false,
            lookup_unavailable: false,
            record_on_timeout: false,
            charge_delay: None,
            charges: HashMap::new(),
            next_id: 0,
            charge_attempts: 0,
            token_requests: 0,
        }
    }
}

/// In-memory payment gateway for testing.
#[derive(Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<MockState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a new in-memory gateway that approves every charge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Approves subsequent charges (the default).
    pub fn set_approve(&self) {
        self.state.write().unwrap().behavior = ChargeBehavior::Approve;
    }

    /// Declines subsequent charges with the given reason.
    pub fn set_decline(&self, reason: impl Into<String>) {
        let mut state = self.state.write().unwrap();
        state.behavior = ChargeBehavior::Decline;
        state.decline_reason = reason.into();
    }

    /// Times out subsequent charges. With `lands` set, the charge is still
    /// recorded gateway-side so a later lookup finds it approved.
    pub fn set_timeout(&self, lands: bool) {
        let mut state = self.state.write().unwrap();
        state.behavior = ChargeBehavior::Timeout;
        state.record_on_timeout = lands;
    }

    /// Adds artificial latency before each charge settles.
    pub fn set_charge_delay(&self, delay: Duration) {
        self.state.write().unwrap().charge_delay = Some(delay);
    }

    /// Configures the token leg to fail.
    pub fn set_fail_token(&self, fail: bool) {
        self.state.write().unwrap().fail_token = fail;
    }

    /// Makes the reconciliation lookup unavailable.
    pub fn set_lookup_unavailable(&self, unavailable: bool) {
        self.state.write().unwrap().lookup_unavailable = unavailable;
    }

    /// Returns how many charge submissions reached the gateway.
    pub fn charge_attempts(&self) -> u32 {
        self.state.read().unwrap().charge_attempts
    }

    /// Returns how many tokens were requested.
    pub fn token_requests(&self) -> u32 {
        self.state.read().unwrap().token_requests
    }

    /// Returns the number of charges recorded gateway-side.
    pub fn charge_count(&self) -> usize {
        self.state.read().unwrap().charges.len()
    }

    /// Returns the recorded outcome for a reference, if any.
    pub fn outcome_for(&self, reference: &str) -> Option<ChargeOutcome> {
        self.state.read().unwrap().charges.get(reference).cloned()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn request_token(&self) -> Result<AccessToken, GatewayError> {
        let mut state = self.state.write().unwrap();
        state.token_requests += 1;

        if state.fail_token {
            return Err(GatewayError::TokenAcquisitionFailed(
                "identity endpoint unavailable".to_string(),
            ));
        }

        Ok(AccessToken {
            token: format!("mock-token-{}", state.token_requests),
            expires_in: 600,
        })
    }

    async fn submit_charge(
        &self,
        _token: &AccessToken,
        request: &ChargeRequest,
    ) -> Result<ChargeOutcome, GatewayError> {
        request.validate()?;

        let delay = self.state.read().unwrap().charge_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write().unwrap();
        state.charge_attempts += 1;

        match state.behavior {
            ChargeBehavior::Approve => {
                state.next_id += 1;
                let outcome = ChargeOutcome::Approved {
                    transaction_id: format!("TX-{:04}", state.next_id),
                };
                state
                    .charges
                    .insert(request.reference.clone(), outcome.clone());
                Ok(outcome)
            }
            ChargeBehavior::Decline => {
                state.next_id += 1;
                let outcome = ChargeOutcome::Rejected {
                    transaction_id: Some(format!("TX-{:04}", state.next_id)),
                    reason: state.decline_reason.clone(),
                };
                state
                    .charges
                    .insert(request.reference.clone(), outcome.clone());
                Ok(outcome)
            }
            ChargeBehavior::Timeout => {
                if state.record_on_timeout {
                    state.next_id += 1;
                    let outcome = ChargeOutcome::Approved {
                        transaction_id: format!("TX-{:04}", state.next_id),
                    };
                    state.charges.insert(request.reference.clone(), outcome);
                }
                Err(GatewayError::ChargeAmbiguous(
                    "simulated timeout".to_string(),
                ))
            }
        }
    }

    async fn lookup_charge(
        &self,
        reference: &str,
    ) -> Result<Option<ChargeOutcome>, GatewayError> {
        let state = self.state.read().unwrap();

        if state.lookup_unavailable {
            return Err(GatewayError::Transport(
                "lookup endpoint unavailable".to_string(),
            ));
        }

        Ok(state.charges.get(reference).cloned())
    }
}
