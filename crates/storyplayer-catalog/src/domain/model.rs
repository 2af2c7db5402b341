//! Playback model produced by the adapter.
//!
//! Everything here is immutable for the lifetime of a session. A re-fetch
//! replaces the whole group list instead of patching it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storyplayer_layout::{CanonicalSize, Position, PositionLimits};
use uuid::Uuid;

/// Status value of a story that may be shown.
pub const STORY_STATUS_ACTIVE: &str = "active";

/// Group type that is only listed when its settings opt in.
pub const ONBOARDING_GROUP_TYPE: &str = "onboarding";

/// Story background, carried through to the renderer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Background {
    /// `color`, `gradient`, `image` or `video`.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Type-specific value.
    #[serde(default)]
    pub value: serde_json::Value,
}

/// Adapted group settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSettings {
    /// Onboarding opt-in flag.
    pub add_to_stories: bool,
    /// Layer group of the quiz result story.
    pub score_result_layers_group_id: Option<Uuid>,
    /// Remaining settings, untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A group of stories shown together.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Group identifier.
    pub id: Uuid,
    /// Owning app.
    pub app_id: Option<Uuid>,
    /// Title resolved for the session language.
    pub title: String,
    /// Cover image.
    pub image_url: Option<String>,
    /// Group type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Group settings.
    pub settings: GroupSettings,
    /// Eligible stories in fetch order.
    pub stories: Vec<Story>,
}

impl Group {
    /// A group can be opened only if it has at least one eligible story.
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        !self.stories.is_empty()
    }

    /// Looks up a story of this group.
    #[must_use]
    pub fn story(&self, story_id: Uuid) -> Option<&Story> {
        self.stories.iter().find(|s| s.id == story_id)
    }

    /// Whether `story_id` is the story that shows this group's quiz result.
    ///
    /// Both sides of the linkage must be present; a group without a result
    /// layer never matches.
    #[must_use]
    pub fn is_quiz_result_story(&self, story_id: Uuid) -> bool {
        let Some(result_layer) = self.settings.score_result_layers_group_id else {
            return false;
        };
        self.story(story_id)
            .is_some_and(|s| s.layers_group_id == Some(result_layer))
    }
}

/// A single time-scoped story.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    /// Story identifier.
    pub id: Uuid,
    /// Publication status.
    pub status: String,
    /// Start of the publication window.
    pub start_time: DateTime<Utc>,
    /// End of the publication window.
    pub end_time: Option<DateTime<Utc>>,
    /// Background.
    pub background: Background,
    /// Layer group membership, used to find quiz result stories.
    pub layers_group_id: Option<Uuid>,
    /// Widgets in paint order.
    pub widgets: Vec<Widget>,
}

impl Story {
    /// Active and inside its publication window at `now`.
    #[must_use]
    pub fn is_eligible_at(&self, now: DateTime<Utc>) -> bool {
        self.status == STORY_STATUS_ACTIVE
            && now >= self.start_time
            && self.end_time.is_none_or(|end| now < end)
    }

    /// Resolutions every widget of this story has a position for.
    #[must_use]
    pub fn canonical_sizes(&self) -> Vec<CanonicalSize> {
        let mut sizes: Vec<CanonicalSize> = self
            .widgets
            .iter()
            .flat_map(|w| w.position_by_resolution.keys())
            .filter_map(|key| key.parse::<CanonicalSize>().ok())
            .filter(|size: &CanonicalSize| {
                self.widgets.iter().all(|w| w.position_for(*size).is_some())
            })
            .collect();
        sizes.sort_by_key(|s| (s.width(), s.height()));
        sizes.dedup();
        sizes
    }
}

/// A positioned widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    /// Widget identifier.
    pub id: String,
    /// Canonical position keyed by `WxH`.
    pub position_by_resolution: HashMap<String, Position>,
    /// Self-sizing flags.
    pub position_limits: PositionLimits,
    /// Widget content, opaque to the player.
    pub content: serde_json::Value,
}

impl Widget {
    /// Position authored for `size`, if any.
    #[must_use]
    pub fn position_for(&self, size: CanonicalSize) -> Option<Position> {
        self.position_by_resolution.get(&size.to_string()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn story_at(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Story {
        Story {
            id: Uuid::new_v4(),
            status: STORY_STATUS_ACTIVE.to_owned(),
            start_time: start,
            end_time: end,
            background: Background::default(),
            layers_group_id: None,
            widgets: Vec::new(),
        }
    }

    #[test]
    fn test_story_eligibility_window_is_half_open() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();

        assert!(story_at(now, None).is_eligible_at(now));
        assert!(
            story_at(now - Duration::hours(1), Some(now + Duration::hours(1))).is_eligible_at(now)
        );
        assert!(!story_at(now - Duration::hours(1), Some(now)).is_eligible_at(now));
        assert!(!story_at(now + Duration::seconds(1), None).is_eligible_at(now));
    }

    #[test]
    fn test_inactive_story_is_not_eligible() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let mut story = story_at(now - Duration::days(1), None);
        story.status = "draft".to_owned();
        assert!(!story.is_eligible_at(now));
    }

    #[test]
    fn test_quiz_result_story_requires_both_layer_ids() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let layer = Uuid::new_v4();
        let mut result = story_at(now, None);
        result.layers_group_id = Some(layer);
        let plain = story_at(now, None);
        let result_id = result.id;
        let plain_id = plain.id;

        let mut group = Group {
            id: Uuid::new_v4(),
            app_id: None,
            title: "Quiz".into(),
            image_url: None,
            kind: "group".into(),
            settings: GroupSettings::default(),
            stories: vec![result, plain],
        };
        assert!(!group.is_quiz_result_story(plain_id));
        assert!(!group.is_quiz_result_story(result_id));

        group.settings.score_result_layers_group_id = Some(layer);
        assert!(group.is_quiz_result_story(result_id));
        assert!(!group.is_quiz_result_story(plain_id));
    }

    #[test]
    fn test_canonical_sizes_lists_resolutions_shared_by_all_widgets() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let position = Position::default();
        let mut story = story_at(now, None);
        story.widgets = vec![
            Widget {
                id: "a".into(),
                position_by_resolution: HashMap::from([
                    ("1080x1920".to_owned(), position),
                    ("390x844".to_owned(), position),
                ]),
                position_limits: PositionLimits::default(),
                content: serde_json::Value::Null,
            },
            Widget {
                id: "b".into(),
                position_by_resolution: HashMap::from([("1080x1920".to_owned(), position)]),
                position_limits: PositionLimits::default(),
                content: serde_json::Value::Null,
            },
        ];

        let sizes = story.canonical_sizes();

        assert_eq!(sizes, vec![CanonicalSize::new(1080, 1920).unwrap()]);
    }
}
