//! Analytics events for the playback context.

use serde::Serialize;
use storyplayer_core::event::{DomainEvent, EventMetadata};
use uuid::Uuid;

use super::duration::{GroupDuration, StoryDuration, StoryImpression};

/// A group reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRef {
    /// The group identifier.
    pub group_id: Uuid,
}

/// A story reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryRef {
    /// The owning group.
    pub group_id: Uuid,
    /// The story identifier.
    pub story_id: Uuid,
}

/// A quiz reference; quizzes span a group or live on one story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRef {
    /// The owning group.
    pub group_id: Uuid,
    /// The story, for single-story quizzes.
    pub story_id: Option<Uuid>,
}

/// Event type identifier for [`PlaybackEventKind::GroupOpened`].
pub const GROUP_OPEN_EVENT_TYPE: &str = "group.open";

/// Event type identifier for [`PlaybackEventKind::GroupClosed`].
pub const GROUP_CLOSE_EVENT_TYPE: &str = "group.close";

/// Event type identifier for [`PlaybackEventKind::GroupDuration`].
pub const GROUP_DURATION_EVENT_TYPE: &str = "group.duration";

/// Event type identifier for [`PlaybackEventKind::StoryOpened`].
pub const STORY_OPEN_EVENT_TYPE: &str = "story.open";

/// Event type identifier for [`PlaybackEventKind::StoryClosed`].
pub const STORY_CLOSE_EVENT_TYPE: &str = "story.close";

/// Event type identifier for [`PlaybackEventKind::StoryNext`].
pub const STORY_NEXT_EVENT_TYPE: &str = "story.next";

/// Event type identifier for [`PlaybackEventKind::StoryPrev`].
pub const STORY_PREV_EVENT_TYPE: &str = "story.prev";

/// Event type identifier for [`PlaybackEventKind::StoryDuration`].
pub const STORY_DURATION_EVENT_TYPE: &str = "story.duration";

/// Event type identifier for [`PlaybackEventKind::StoryImpression`].
pub const STORY_IMPRESSION_EVENT_TYPE: &str = "story.impression";

/// Event type identifier for [`PlaybackEventKind::QuizStarted`].
pub const QUIZ_START_EVENT_TYPE: &str = "quiz.start";

/// Event type identifier for [`PlaybackEventKind::QuizFinished`].
pub const QUIZ_FINISH_EVENT_TYPE: &str = "quiz.finish";

/// Event payload variants for the playback context.
///
/// Serialized without a tag: the event type travels next to the payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PlaybackEventKind {
    /// A group was opened.
    GroupOpened(GroupRef),
    /// A group was closed.
    GroupClosed(GroupRef),
    /// Time a group was open.
    GroupDuration(GroupDuration),
    /// A story was opened.
    StoryOpened(StoryRef),
    /// A story was closed.
    StoryClosed(StoryRef),
    /// The viewer moved forward from a story.
    StoryNext(StoryRef),
    /// The viewer moved back from a story.
    StoryPrev(StoryRef),
    /// Time a story was open.
    StoryDuration(StoryDuration),
    /// A story was open long enough to count as seen.
    StoryImpression(StoryImpression),
    /// A quiz was started.
    QuizStarted(QuizRef),
    /// A quiz was finished for the first time on this device.
    QuizFinished(QuizRef),
}

impl PlaybackEventKind {
    /// Event type name for this payload.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::GroupOpened(_) => GROUP_OPEN_EVENT_TYPE,
            Self::GroupClosed(_) => GROUP_CLOSE_EVENT_TYPE,
            Self::GroupDuration(_) => GROUP_DURATION_EVENT_TYPE,
            Self::StoryOpened(_) => STORY_OPEN_EVENT_TYPE,
            Self::StoryClosed(_) => STORY_CLOSE_EVENT_TYPE,
            Self::StoryNext(_) => STORY_NEXT_EVENT_TYPE,
            Self::StoryPrev(_) => STORY_PREV_EVENT_TYPE,
            Self::StoryDuration(_) => STORY_DURATION_EVENT_TYPE,
            Self::StoryImpression(_) => STORY_IMPRESSION_EVENT_TYPE,
            Self::QuizStarted(_) => QUIZ_START_EVENT_TYPE,
            Self::QuizFinished(_) => QUIZ_FINISH_EVENT_TYPE,
        }
    }
}

/// Analytics event envelope for the playback context.
#[derive(Debug, Clone)]
pub struct PlaybackEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: PlaybackEventKind,
}

impl DomainEvent for PlaybackEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("PlaybackEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
