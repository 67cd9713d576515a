//! Notification sink trait and implementations.
//!
//! The email sender is an external collaborator; this core only hands it
//! domain events. Delivery is its problem entirely.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::OrderEvent;
use thiserror::Error;

/// Error from a notification sink.
#[derive(Debug, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Trait for notification sinks.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Consumes a domain event. Failures never affect order processing.
    async fn notify(&self, event: OrderEvent) -> Result<(), NotifyError>;
}

/// Production sink: logs the event for the external email pipeline to pick
/// up.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: OrderEvent) -> Result<(), NotifyError> {
        tracing::info!(
            event_type = event.event_type(),
            order_id = %event.order_id(),
            "domain event emitted"
        );
        Ok(())
    }
}

#[derive(Debug, Default)]
struct RecordingState {
    events: Vec<OrderEvent>,
    fail: bool,
}

/// Recording notifier for tests.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    state: Arc<RwLock<RecordingState>>,
}

impl RecordingNotifier {
    /// Creates a new recording notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the sink to fail every delivery.
    pub fn set_fail(&self, fail: bool) {
        self.state.write().unwrap().fail = fail;
    }

    /// Returns all recorded events.
    pub fn events(&self) -> Vec<OrderEvent> {
        self.state.read().unwrap().events.clone()
    }

    /// Returns how many events of the given type were recorded.
    pub fn count_of(&self, event_type: &str) -> usize {
        self.state
            .read()
            .unwrap()
            .events
            .iter()
            .filter(|event| event.event_type() == event_type)
            .count()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, event: OrderEvent) -> Result<(), NotifyError> {
        let mut state = self.state.write().unwrap();
        if state.fail {
            return Err(NotifyError("sink configured to fail".to_string()));
        }
        state.events.push(event);
        Ok(())
    }
}
