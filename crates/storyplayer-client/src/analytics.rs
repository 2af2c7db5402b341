//! Analytics API implementation of `AnalyticsSink`.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use tracing::debug;

use storyplayer_core::context::RequestContext;
use storyplayer_core::error::DomainError;
use storyplayer_core::sink::{AnalyticsSink, OutboundEvent};

use crate::join_url;

const EVENTS_PATH: &str = "analytics/events";

#[derive(Debug, Serialize)]
struct EventBatch<'a> {
    events: &'a [OutboundEvent],
}

/// Posts analytics batches over HTTP.
#[derive(Debug, Clone)]
pub struct HttpAnalyticsSink {
    client: reqwest::Client,
    base_url: String,
    ctx: RequestContext,
}

impl HttpAnalyticsSink {
    /// Creates a sink rooted at `base_url`, authenticating with `ctx`.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, ctx: RequestContext) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            ctx,
        }
    }

    fn request(&self, events: &[OutboundEvent]) -> reqwest::RequestBuilder {
        self.client
            .post(join_url(&self.base_url, EVENTS_PATH))
            .header(AUTHORIZATION, self.ctx.authorization())
            .json(&EventBatch { events })
    }
}

#[async_trait]
impl AnalyticsSink for HttpAnalyticsSink {
    async fn publish(&self, events: &[OutboundEvent]) -> Result<(), DomainError> {
        if events.is_empty() {
            return Ok(());
        }
        let response = self
            .request(events)
            .send()
            .await
            .map_err(|e| DomainError::Infrastructure(format!("analytics publish: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::Infrastructure(format!(
                "analytics publish: status {status}"
            )));
        }
        debug!(count = events.len(), "analytics batch accepted");
        Ok(())
    }
}
