//! Dwell-time measurement for groups and stories.
//!
//! Two independent slots, one per entity kind. Opening overwrites the slot;
//! closing consumes it. Elapsed time is the difference between two clock
//! reads, nothing is scheduled.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A story has to stay open longer than this to count as an impression.
pub const IMPRESSION_THRESHOLD_SECONDS: f64 = 1.0;

/// An open measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationRecord {
    /// Group or story being measured.
    pub entity_id: Uuid,
    /// Owning group, for story records.
    pub parent_group_id: Option<Uuid>,
    /// When the measurement started.
    pub started_at: DateTime<Utc>,
}

/// Time a group was open.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDuration {
    /// Measured group.
    pub group_id: Uuid,
    /// Elapsed seconds; may be zero or negative if the clock stepped back.
    pub seconds: f64,
}

/// Time a story was open.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryDuration {
    /// Owning group.
    pub group_id: Uuid,
    /// Measured story.
    pub story_id: Uuid,
    /// Elapsed seconds.
    pub seconds: f64,
}

/// A story view long enough to count as seen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryImpression {
    /// Owning group.
    pub group_id: Uuid,
    /// Seen story.
    pub story_id: Uuid,
    /// Elapsed seconds.
    pub seconds: f64,
}

#[allow(clippy::cast_precision_loss)]
fn elapsed_seconds(start: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - start).num_milliseconds() as f64 / 1000.0
}

/// Group and story timers for one navigation session.
#[derive(Debug, Default)]
pub struct DurationTracker {
    group: Option<DurationRecord>,
    story: Option<DurationRecord>,
}

impl DurationTracker {
    /// Creates a tracker with both slots empty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The open group measurement, if any.
    #[must_use]
    pub fn active_group(&self) -> Option<DurationRecord> {
        self.group
    }

    /// The open story measurement, if any.
    #[must_use]
    pub fn active_story(&self) -> Option<DurationRecord> {
        self.story
    }

    /// Starts measuring `group_id`, replacing any open group measurement.
    pub fn start_group(&mut self, group_id: Uuid, now: DateTime<Utc>) {
        self.group = Some(DurationRecord {
            entity_id: group_id,
            parent_group_id: None,
            started_at: now,
        });
    }

    /// Ends the group measurement.
    ///
    /// Reports the group that was recorded at start, not whichever group the
    /// caller believes is closing. Emits regardless of magnitude. Returns
    /// `None` only when no group measurement is open.
    pub fn stop_group(&mut self, now: DateTime<Utc>) -> Option<GroupDuration> {
        self.group.take().map(|record| GroupDuration {
            group_id: record.entity_id,
            seconds: elapsed_seconds(record.started_at, now),
        })
    }

    /// Starts measuring a story, replacing any open story measurement.
    pub fn start_story(&mut self, group_id: Uuid, story_id: Uuid, now: DateTime<Utc>) {
        self.story = Some(DurationRecord {
            entity_id: story_id,
            parent_group_id: Some(group_id),
            started_at: now,
        });
    }

    /// Ends the story measurement if it is for exactly `(group_id, story_id)`.
    ///
    /// A mismatched or repeated close returns `None` and leaves the slot as
    /// it was. The impression is present only when the story stayed open
    /// longer than [`IMPRESSION_THRESHOLD_SECONDS`].
    pub fn stop_story(
        &mut self,
        group_id: Uuid,
        story_id: Uuid,
        now: DateTime<Utc>,
    ) -> Option<(StoryDuration, Option<StoryImpression>)> {
        let record = self.story?;
        if record.entity_id != story_id || record.parent_group_id != Some(group_id) {
            return None;
        }
        self.story = None;

        let seconds = elapsed_seconds(record.started_at, now);
        let duration = StoryDuration {
            group_id,
            story_id,
            seconds,
        };
        let impression = (seconds > IMPRESSION_THRESHOLD_SECONDS).then_some(StoryImpression {
            group_id,
            story_id,
            seconds,
        });
        Some((duration, impression))
    }
}
