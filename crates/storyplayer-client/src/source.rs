//! Content API implementation of `StorySource`.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use storyplayer_catalog::application::source::StorySource;
use storyplayer_catalog::domain::raw::{ApiResponse, RawApp, RawGroup, RawStory};
use storyplayer_core::context::RequestContext;
use storyplayer_core::error::DomainError;

use crate::join_url;

/// Reads the catalog over HTTP.
#[derive(Debug, Clone)]
pub struct HttpStorySource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStorySource {
    /// Creates a source rooted at `base_url`.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn request(&self, ctx: &RequestContext, path: &str) -> reqwest::RequestBuilder {
        let request = self
            .client
            .get(join_url(&self.base_url, path))
            .header(AUTHORIZATION, ctx.authorization())
            .header(ACCEPT, "application/json");
        match &ctx.language {
            Some(language) => request.header(ACCEPT_LANGUAGE, language),
            None => request,
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        path: &str,
    ) -> Result<ApiResponse<T>, DomainError> {
        debug!(path, "fetching");
        let response = self
            .request(ctx, path)
            .send()
            .await
            .map_err(|e| DomainError::FetchFailed(format!("GET {path}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!(path, %status, "content API returned an error status");
            return Err(DomainError::FetchFailed(format!("GET {path}: status {status}")));
        }

        response
            .json::<ApiResponse<T>>()
            .await
            .map_err(|e| DomainError::FetchFailed(format!("GET {path}: undecodable body: {e}")))
    }
}

#[async_trait]
impl StorySource for HttpStorySource {
    async fn fetch_app(&self, ctx: &RequestContext) -> Result<ApiResponse<RawApp>, DomainError> {
        self.get(ctx, "app").await
    }

    async fn fetch_groups(
        &self,
        ctx: &RequestContext,
    ) -> Result<ApiResponse<Vec<RawGroup>>, DomainError> {
        self.get(ctx, "groups").await
    }

    async fn fetch_stories(
        &self,
        ctx: &RequestContext,
        group_id: Uuid,
    ) -> Result<ApiResponse<Vec<RawStory>>, DomainError> {
        self.get(ctx, &format!("groups/{group_id}/stories")).await
    }
}
