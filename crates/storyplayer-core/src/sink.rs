//! Analytics sink abstraction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::DomainError;
use crate::event::DomainEvent;

/// Wire representation of an analytics event handed to a sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundEvent {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Event type name, e.g. `group.open`.
    pub event_type: String,
    /// Serialized event payload.
    pub payload: serde_json::Value,
    /// Stable per-device user identifier.
    pub user_id: String,
    /// Session language.
    pub language: String,
    /// Correlation ID of the transition that produced the event.
    pub correlation_id: Uuid,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
}

impl OutboundEvent {
    /// Flattens a domain event into its wire representation.
    pub fn from_event<E: DomainEvent>(event: &E) -> Self {
        let meta = event.metadata();
        Self {
            event_id: meta.event_id,
            event_type: event.event_type().to_owned(),
            payload: event.to_payload(),
            user_id: meta.user_id.clone(),
            language: meta.language.clone(),
            correlation_id: meta.correlation_id,
            occurred_at: meta.occurred_at,
        }
    }
}

/// Fire-and-forget destination for analytics events.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    /// Publish events in order. Callers log failures and move on.
    async fn publish(&self, events: &[OutboundEvent]) -> Result<(), DomainError>;
}
