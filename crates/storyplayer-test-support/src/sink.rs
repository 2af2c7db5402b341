//! Test sinks: mock `AnalyticsSink` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use storyplayer_core::error::DomainError;
use storyplayer_core::sink::{AnalyticsSink, OutboundEvent};

/// An analytics sink that records every published event in order.
#[derive(Debug, Default)]
pub struct RecordingAnalyticsSink {
    published: Mutex<Vec<OutboundEvent>>,
}

impl RecordingAnalyticsSink {
    /// Creates an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all events published so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn published(&self) -> Vec<OutboundEvent> {
        self.published.lock().unwrap().clone()
    }

    /// Returns the event types published so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn event_types(&self) -> Vec<String> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.event_type.clone())
            .collect()
    }
}

#[async_trait]
impl AnalyticsSink for RecordingAnalyticsSink {
    async fn publish(&self, events: &[OutboundEvent]) -> Result<(), DomainError> {
        self.published.lock().unwrap().extend_from_slice(events);
        Ok(())
    }
}

/// An analytics sink that always fails. Useful for checking that sink errors
/// never surface from navigation.
#[derive(Debug)]
pub struct FailingAnalyticsSink;

#[async_trait]
impl AnalyticsSink for FailingAnalyticsSink {
    async fn publish(&self, _events: &[OutboundEvent]) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}
