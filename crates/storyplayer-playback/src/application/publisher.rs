//! Background analytics delivery.
//!
//! Navigation hands each batch to a bounded queue and returns at once. A
//! single worker drains the queue into the real sink, so batches are
//! delivered in the order they were queued.

use std::sync::Arc;

use async_trait::async_trait;
use storyplayer_core::error::DomainError;
use storyplayer_core::sink::{AnalyticsSink, OutboundEvent};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Batches queued before new ones are dropped.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// An `AnalyticsSink` that queues batches for a background worker.
#[derive(Debug, Clone)]
pub struct BackgroundAnalyticsSink {
    sender: mpsc::Sender<Vec<OutboundEvent>>,
}

impl BackgroundAnalyticsSink {
    /// Spawns the delivery worker for `inner` on the current runtime.
    ///
    /// The worker stops once every handle to the returned sink is dropped
    /// and the queue is empty.
    #[must_use]
    pub fn spawn(inner: Arc<dyn AnalyticsSink>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::channel::<Vec<OutboundEvent>>(capacity.max(1));
        let worker = tokio::spawn(async move {
            while let Some(batch) = receiver.recv().await {
                if let Err(error) = inner.publish(&batch).await {
                    warn!(%error, count = batch.len(), "analytics delivery failed");
                }
            }
            debug!("analytics queue closed");
        });
        (Self { sender }, worker)
    }
}

#[async_trait]
impl AnalyticsSink for BackgroundAnalyticsSink {
    async fn publish(&self, events: &[OutboundEvent]) -> Result<(), DomainError> {
        if events.is_empty() {
            return Ok(());
        }
        self.sender
            .try_send(events.to_vec())
            .map_err(|error| match error {
                TrySendError::Full(batch) => DomainError::Infrastructure(format!(
                    "analytics queue full, dropped {} events",
                    batch.len()
                )),
                TrySendError::Closed(_) => {
                    DomainError::Infrastructure("analytics queue closed".into())
                }
            })
    }
}
