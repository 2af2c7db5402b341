//! Raw shapes returned by the content API, before adaptation.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use storyplayer_core::error::DomainError;
use storyplayer_layout::{Position, PositionLimits};
use uuid::Uuid;

use super::model::Background;

/// Envelope every content API call responds with.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    /// Error marker; any truthy value means the call failed.
    #[serde(default)]
    pub error: serde_json::Value,
    /// Payload, absent on failure.
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Wraps a successful payload.
    pub fn ok(data: T) -> Self {
        Self {
            error: serde_json::Value::Null,
            data: Some(data),
        }
    }

    /// Builds a failed response carrying `message`.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: serde_json::Value::String(message.into()),
            data: None,
        }
    }

    /// Unwraps the payload for `resource`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::FetchFailed` if `error` is truthy or no payload
    /// was sent.
    pub fn into_result(self, resource: &str) -> Result<T, DomainError> {
        if is_truthy(&self.error) {
            return Err(DomainError::FetchFailed(format!(
                "{resource}: collaborator reported {}",
                self.error
            )));
        }
        self.data
            .ok_or_else(|| DomainError::FetchFailed(format!("{resource}: response has no data")))
    }
}

fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

/// App record returned by the settings endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawApp {
    /// Presentation settings.
    #[serde(default)]
    pub settings: RawAppSettings,
    /// Languages the app is localized into.
    #[serde(default)]
    pub localization: Option<RawLocalization>,
}

/// Presentation settings for the embedding app.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAppSettings {
    /// Group list appearance per platform.
    #[serde(default)]
    pub group_view: Option<RawGroupView>,
    /// Whether stories are framed in a device mockup on desktop.
    #[serde(default)]
    pub is_show_mockup: Option<bool>,
    /// Custom font descriptors, passed through to the renderer.
    #[serde(default)]
    pub fonts: Vec<serde_json::Value>,
}

/// Group list appearance per platform.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawGroupView {
    /// Appearance on the web.
    #[serde(default)]
    pub web: Option<String>,
}

/// App localization settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLocalization {
    /// Fallback language.
    #[serde(default)]
    pub default: Option<String>,
    /// All languages content exists for.
    #[serde(default)]
    pub languages: Vec<String>,
}

/// A title that is either a single string or keyed by language.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LocalizedText {
    /// Same text for every language.
    Plain(String),
    /// Text per language code.
    ByLanguage(BTreeMap<String, String>),
}

impl Default for LocalizedText {
    fn default() -> Self {
        Self::Plain(String::new())
    }
}

impl LocalizedText {
    /// Resolves to `language`, then `fallback`, then the first entry.
    #[must_use]
    pub fn resolve(&self, language: &str, fallback: &str) -> String {
        match self {
            Self::Plain(text) => text.clone(),
            Self::ByLanguage(map) => map
                .get(language)
                .or_else(|| map.get(fallback))
                .or_else(|| map.values().next())
                .cloned()
                .unwrap_or_default(),
        }
    }
}

/// Group record as fetched.
#[derive(Debug, Clone, Deserialize)]
pub struct RawGroup {
    /// Group identifier.
    pub id: Uuid,
    /// Owning app.
    #[serde(default)]
    pub app_id: Option<Uuid>,
    /// Display title.
    #[serde(default)]
    pub title: LocalizedText,
    /// Cover image.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Whether the group is published.
    #[serde(default)]
    pub active: bool,
    /// Group type, e.g. `group` or `onboarding`.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Group settings.
    #[serde(default)]
    pub settings: RawGroupSettings,
}

/// Settings attached to a raw group.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGroupSettings {
    /// Onboarding groups only show in the story list when set.
    #[serde(default)]
    pub add_to_stories: bool,
    /// Layer group of the story that shows a quiz's result.
    #[serde(default)]
    pub score_result_layers_group_id: Option<Uuid>,
    /// Everything else, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Story record as fetched.
#[derive(Debug, Clone, Deserialize)]
pub struct RawStory {
    /// Story identifier.
    pub id: Uuid,
    /// Publication window and content.
    pub story_data: RawStoryData,
    /// Layer membership.
    #[serde(default)]
    pub layer_data: Option<RawLayerData>,
}

/// Publication window and content of a raw story.
#[derive(Debug, Clone, Deserialize)]
pub struct RawStoryData {
    /// Publication status, `active` when live.
    pub status: String,
    /// Start of the publication window.
    pub start_time: DateTime<Utc>,
    /// End of the publication window, open-ended when absent.
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Story background.
    #[serde(default)]
    pub background: Background,
    /// Widgets in paint order.
    #[serde(default)]
    pub widgets: Vec<RawWidget>,
}

/// Layer membership of a raw story.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLayerData {
    /// Layer group this story belongs to.
    #[serde(default)]
    pub layers_group_id: Option<Uuid>,
}

/// Widget record as fetched.
#[derive(Debug, Clone, Deserialize)]
pub struct RawWidget {
    /// Widget identifier.
    pub id: String,
    /// Canonical position per `WxH` resolution key.
    #[serde(default, alias = "positionByResolutions")]
    pub position_by_resolutions: HashMap<String, Position>,
    /// Self-sizing flags.
    #[serde(default, alias = "positionLimits")]
    pub position_limits: PositionLimits,
    /// Widget-specific content, opaque to the player.
    #[serde(default)]
    pub content: serde_json::Value,
}
