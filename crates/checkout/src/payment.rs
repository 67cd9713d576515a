//! Payment processing: idempotent charge submission and reconciliation.
//!
//! The gateway offers no idempotency key, so the de-duplication guard
//! lives here: an order that is already paid, already carries a gateway
//! reference, or has a charge in flight is rejected locally before any
//! gateway traffic. Ambiguous outcomes (a timeout after the request may
//! have been sent) are never retried blindly; they are resolved through
//! the gateway's lookup endpoint or left to manual reconciliation.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use common::OrderId;
use domain::{Order, OrderStatus, OrderTransition};
use gateway::{ChargeMode, ChargeOutcome, ChargeRequest, GatewayError, PaymentGateway};
use store::{OrderStore, StoreError};

use crate::dispatcher::NotificationDispatcher;
use crate::error::CheckoutError;

/// The caller-visible result of a payment attempt.
#[derive(Debug)]
pub enum PaymentOutcome {
    /// The gateway approved; the order is `pagado`.
    Approved {
        /// The order after the transition.
        order: Order,
    },

    /// The gateway rejected; the order is `no_pagado`.
    Rejected {
        /// The order after the transition.
        order: Order,
        /// Rejection reason reported by the gateway.
        reason: String,
    },

    /// The outcome is not yet known. The order stays `pending_payment`
    /// until reconciliation determines what happened. Not an error: the
    /// caller shows "pending confirmation".
    PendingConfirmation {
        /// The order awaiting confirmation.
        order_id: OrderId,
    },
}

/// Removes the order from the in-flight set when the charge task finishes,
/// however it finishes.
struct InFlightGuard {
    set: Arc<Mutex<HashSet<OrderId>>>,
    order_id: OrderId,
}

impl InFlightGuard {
    fn acquire(set: &Arc<Mutex<HashSet<OrderId>>>, order_id: OrderId) -> Option<Self> {
        if set.lock().unwrap().insert(order_id) {
            Some(Self {
                set: set.clone(),
                order_id,
            })
        } else {
            None
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.lock().unwrap().remove(&self.order_id);
    }
}

/// Drives the two-legged gateway protocol for one order at a time.
pub struct PaymentProcessor<S, G> {
    orders: Arc<S>,
    gateway: Arc<G>,
    dispatcher: NotificationDispatcher,
    currency: String,
    in_flight: Arc<Mutex<HashSet<OrderId>>>,
    unresolved: Arc<Mutex<HashSet<OrderId>>>,
}

impl<S, G> Clone for PaymentProcessor<S, G> {
    fn clone(&self) -> Self {
        Self {
            orders: self.orders.clone(),
            gateway: self.gateway.clone(),
            dispatcher: self.dispatcher.clone(),
            currency: self.currency.clone(),
            in_flight: self.in_flight.clone(),
            unresolved: self.unresolved.clone(),
        }
    }
}

impl<S, G> PaymentProcessor<S, G>
where
    S: OrderStore + 'static,
    G: PaymentGateway + 'static,
{
    /// Creates a new payment processor.
    pub fn new(
        orders: Arc<S>,
        gateway: Arc<G>,
        dispatcher: NotificationDispatcher,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            orders,
            gateway,
            dispatcher,
            currency: currency.into(),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            unresolved: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Charges an order.
    ///
    /// The charge runs on a detached task: cancelling the caller cannot
    /// abort a request that may already be on the wire, and the outcome is
    /// recorded regardless of whether anyone is still listening.
    #[tracing::instrument(skip(self, mode))]
    pub async fn pay(
        &self,
        order_id: OrderId,
        mode: ChargeMode,
    ) -> Result<PaymentOutcome, CheckoutError> {
        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(order_id))?;

        self.check_payable(&order)?;

        // An earlier ambiguous outcome must be resolved before any new
        // charge is submitted; re-submitting unconfirmed charges risks a
        // double debit.
        if self.unresolved.lock().unwrap().contains(&order_id) {
            return self.reconcile(order_id).await;
        }

        let Some(guard) = InFlightGuard::acquire(&self.in_flight, order_id) else {
            metrics::counter!("charges_duplicate_rejected_total").increment(1);
            return Err(CheckoutError::DuplicateChargeAttempt(order_id));
        };

        let processor = self.clone();
        let handle = tokio::spawn(async move {
            let _guard = guard;
            processor.settle(order_id, mode).await
        });

        match handle.await {
            Ok(result) => result,
            // The task died without recording anything conclusive; treat
            // the outcome as unknown rather than guessing.
            Err(e) => Err(CheckoutError::Gateway(GatewayError::ChargeAmbiguous(
                format!("charge task aborted: {e}"),
            ))),
        }
    }

    /// Resolves an ambiguous charge for an order, driven by an admin or a
    /// retry after a timeout.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile(&self, order_id: OrderId) -> Result<PaymentOutcome, CheckoutError> {
        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(order_id))?;

        if !order.status().can_record_payment() {
            return Err(CheckoutError::OrderNotPayable {
                order_id,
                status: order.status(),
            });
        }

        let Some(_guard) = InFlightGuard::acquire(&self.in_flight, order_id) else {
            return Err(CheckoutError::DuplicateChargeAttempt(order_id));
        };

        self.resolve_ambiguous(order).await
    }

    fn check_payable(&self, order: &Order) -> Result<(), CheckoutError> {
        if order.status() == OrderStatus::Paid || order.gateway_reference().is_some() {
            metrics::counter!("charges_duplicate_rejected_total").increment(1);
            return Err(CheckoutError::DuplicateChargeAttempt(order.id()));
        }
        if !order.status().can_record_payment() {
            return Err(CheckoutError::OrderNotPayable {
                order_id: order.id(),
                status: order.status(),
            });
        }
        Ok(())
    }

    /// Runs the token and charge legs and records the outcome. Executes
    /// inside the in-flight reservation.
    async fn settle(
        &self,
        order_id: OrderId,
        mode: ChargeMode,
    ) -> Result<PaymentOutcome, CheckoutError> {
        // Re-check under the reservation: a charge that completed between
        // the caller's pre-check and this point must not be repeated.
        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(order_id))?;
        self.check_payable(&order)?;

        let start = std::time::Instant::now();
        metrics::counter!("charges_submitted_total").increment(1);

        // Every attempt acquires a fresh token; never cached across
        // orders, so a token can't expire mid-3DS-redirect.
        let token = self.gateway.request_token().await?;

        let request = ChargeRequest {
            reference: order.id().to_string(),
            amount: order.total(),
            currency: self.currency.clone(),
            mode,
        };
        request.validate()?;

        let result = self.gateway.submit_charge(&token, &request).await;
        metrics::histogram!("charge_duration_seconds").record(start.elapsed().as_secs_f64());

        match result {
            Ok(outcome) => self.record_outcome(order, outcome).await,
            Err(GatewayError::ChargeAmbiguous(reason)) => {
                metrics::counter!("charges_ambiguous_total").increment(1);
                tracing::warn!(
                    %order_id,
                    reason,
                    "charge outcome ambiguous; attempting reconciliation"
                );
                self.resolve_ambiguous(order).await
            }
            // Transport failures never reached the gateway; the order
            // stays pending and the caller may retry.
            Err(e) => Err(CheckoutError::Gateway(e)),
        }
    }

    /// Applies the settled outcome to the order and emits the event.
    async fn record_outcome(
        &self,
        order: Order,
        outcome: ChargeOutcome,
    ) -> Result<PaymentOutcome, CheckoutError> {
        let order_id = order.id();
        let transition = match &outcome {
            ChargeOutcome::Approved { transaction_id } => OrderTransition::PaymentApproved {
                gateway_reference: transaction_id.clone(),
            },
            ChargeOutcome::Rejected {
                transaction_id,
                reason,
            } => OrderTransition::PaymentRejected {
                gateway_reference: transaction_id.clone(),
                reason: reason.clone(),
            },
        };

        let mut expected = order.version();
        loop {
            match self
                .orders
                .apply_transition(order_id, expected, transition.clone())
                .await
            {
                Ok(record) => {
                    self.unresolved.lock().unwrap().remove(&order_id);
                    match &outcome {
                        ChargeOutcome::Approved { .. } => {
                            metrics::counter!("charges_approved_total").increment(1);
                        }
                        ChargeOutcome::Rejected { .. } => {
                            metrics::counter!("charges_rejected_total").increment(1);
                        }
                    }
                    self.dispatcher.dispatch(&record).await;

                    return Ok(match outcome {
                        ChargeOutcome::Approved { .. } => PaymentOutcome::Approved {
                            order: record.order,
                        },
                        ChargeOutcome::Rejected { reason, .. } => PaymentOutcome::Rejected {
                            order: record.order,
                            reason,
                        },
                    });
                }
                Err(StoreError::StaleOrderVersion { actual, .. }) => {
                    let current = self
                        .orders
                        .get(order_id)
                        .await?
                        .ok_or(CheckoutError::OrderNotFound(order_id))?;

                    // A concurrent actor moved the order. Retry only while
                    // it is still awaiting payment.
                    if current.status().can_record_payment() {
                        expected = actual;
                        continue;
                    }

                    // The same outcome may have been recorded by a
                    // concurrent reconciliation; that is success, not a
                    // conflict.
                    if let ChargeOutcome::Approved { transaction_id } = &outcome
                        && current.gateway_reference() == Some(transaction_id.as_str())
                    {
                        self.unresolved.lock().unwrap().remove(&order_id);
                        return Ok(PaymentOutcome::Approved { order: current });
                    }

                    self.unresolved.lock().unwrap().insert(order_id);
                    tracing::error!(
                        %order_id,
                        status = %current.status(),
                        "settled charge cannot be recorded; order changed state mid-flight"
                    );
                    return Err(CheckoutError::SettlementConflict {
                        order_id,
                        status: current.status(),
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Queries the gateway for what actually happened to an unconfirmed
    /// charge. Never guesses: with the lookup unavailable the order is
    /// left in `pending_payment` for manual resolution.
    async fn resolve_ambiguous(&self, order: Order) -> Result<PaymentOutcome, CheckoutError> {
        let order_id = order.id();

        match self.gateway.lookup_charge(&order_id.to_string()).await {
            Ok(Some(outcome)) => self.record_outcome(order, outcome).await,
            Ok(None) => {
                // The gateway has no record of the reference: the request
                // never landed, so a fresh attempt is safe.
                self.unresolved.lock().unwrap().remove(&order_id);
                Ok(PaymentOutcome::PendingConfirmation { order_id })
            }
            Err(e) => {
                self.unresolved.lock().unwrap().insert(order_id);
                tracing::warn!(
                    %order_id,
                    error = %e,
                    "reconciliation unavailable; order left pending for manual resolution"
                );
                Ok(PaymentOutcome::PendingConfirmation { order_id })
            }
        }
    }
}
