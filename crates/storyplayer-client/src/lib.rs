//! Storyplayer: HTTP collaborators.
//!
//! `HttpStorySource` reads app settings, groups and stories from the content
//! API; `HttpAnalyticsSink` posts analytics batches. Both send the SDK token
//! from a `RequestContext`; neither retries.

pub mod analytics;
pub mod source;

pub use analytics::HttpAnalyticsSink;
pub use source::HttpStorySource;

/// Default content API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.diffapp.link/sdk/v1";

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
