//! Content API collaborator.

use async_trait::async_trait;
use storyplayer_core::context::RequestContext;
use storyplayer_core::error::DomainError;
use uuid::Uuid;

use crate::domain::raw::{ApiResponse, RawApp, RawGroup, RawStory};

/// Read-only access to the content API.
///
/// Implementations return `Err` when the call itself fails; a response whose
/// `error` field is set is returned as `Ok` and judged by the loader.
#[async_trait]
pub trait StorySource: Send + Sync {
    /// Fetches app settings and localization.
    async fn fetch_app(&self, ctx: &RequestContext) -> Result<ApiResponse<RawApp>, DomainError>;

    /// Fetches the raw group list.
    async fn fetch_groups(
        &self,
        ctx: &RequestContext,
    ) -> Result<ApiResponse<Vec<RawGroup>>, DomainError>;

    /// Fetches the raw story list for one group.
    async fn fetch_stories(
        &self,
        ctx: &RequestContext,
        group_id: Uuid,
    ) -> Result<ApiResponse<Vec<RawStory>>, DomainError>;
}
