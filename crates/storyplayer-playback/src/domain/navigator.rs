//! Group navigation state machine.
//!
//! The navigator owns which group is open and the duration timers. Every
//! transition returns the events it produced, in emission order; an empty
//! list means the call was a no-op (closed navigator, boundary, unknown id,
//! out-of-range index).

use chrono::{DateTime, Utc};
use serde::Serialize;
use storyplayer_catalog::domain::model::Group;
use tracing::debug;
use uuid::Uuid;

use super::duration::DurationTracker;
use super::events::{GroupRef, PlaybackEventKind, QuizRef, StoryRef};

/// Which group, if any, is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "groupIndex", rename_all = "camelCase")]
pub enum NavigationState {
    /// No group is open.
    Closed,
    /// The group at this index is open.
    Open(usize),
}

/// Something a transition produced.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationEvent {
    /// An analytics event to publish as-is.
    Emit(PlaybackEventKind),
    /// The viewer reached a quiz's result story. Publishing the finish is
    /// gated on the dedupe cache.
    QuizResultReached(QuizRef),
}

/// The group navigation state machine for one session.
#[derive(Debug)]
pub struct GroupNavigator {
    groups: Vec<Group>,
    state: NavigationState,
    forbid_close: bool,
    tracker: DurationTracker,
}

impl GroupNavigator {
    /// Creates a closed navigator over `groups`.
    ///
    /// With `forbid_close`, `close` still reports the close but the group
    /// stays open.
    #[must_use]
    pub fn new(groups: Vec<Group>, forbid_close: bool) -> Self {
        Self {
            groups,
            state: NavigationState::Closed,
            forbid_close,
            tracker: DurationTracker::new(),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> NavigationState {
        self.state
    }

    /// All groups, selectable or not.
    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// The open group.
    #[must_use]
    pub fn current_group(&self) -> Option<&Group> {
        match self.state {
            NavigationState::Open(index) => self.groups.get(index),
            NavigationState::Closed => None,
        }
    }

    /// Duration timers.
    #[must_use]
    pub fn tracker(&self) -> &DurationTracker {
        &self.tracker
    }

    /// Index of the first group that can be opened.
    #[must_use]
    pub fn first_selectable(&self) -> Option<usize> {
        (0..self.groups.len()).find(|&i| self.is_selectable(i))
    }

    fn is_selectable(&self, index: usize) -> bool {
        self.groups.get(index).is_some_and(Group::is_selectable)
    }

    /// Opens the group at `index`.
    pub fn select(&mut self, index: usize, now: DateTime<Utc>) -> Vec<NavigationEvent> {
        if self.state != NavigationState::Closed {
            debug!(index, state = ?self.state, "ignoring select while a group is open");
            return Vec::new();
        }
        if !self.is_selectable(index) {
            debug!(index, "ignoring select of missing or empty group");
            return Vec::new();
        }
        self.state = NavigationState::Open(index);
        vec![self.enter_group(index, now)]
    }

    /// Moves to the next selectable group.
    pub fn next(&mut self, now: DateTime<Utc>) -> Vec<NavigationEvent> {
        let NavigationState::Open(current) = self.state else {
            debug!("ignoring next while closed");
            return Vec::new();
        };
        let Some(target) = (current + 1..self.groups.len()).find(|&i| self.is_selectable(i))
        else {
            debug!(current, "no later group to move to");
            return Vec::new();
        };
        self.move_to(current, target, now)
    }

    /// Moves to the previous selectable group.
    pub fn prev(&mut self, now: DateTime<Utc>) -> Vec<NavigationEvent> {
        let NavigationState::Open(current) = self.state else {
            debug!("ignoring prev while closed");
            return Vec::new();
        };
        let Some(target) = (0..current).rev().find(|&i| self.is_selectable(i)) else {
            debug!(current, "no earlier group to move to");
            return Vec::new();
        };
        self.move_to(current, target, now)
    }

    /// Closes the open group.
    ///
    /// With `forbid_close` the close is still reported and the group timer
    /// restarts, but the state stays open.
    pub fn close(&mut self, now: DateTime<Utc>) -> Vec<NavigationEvent> {
        let NavigationState::Open(current) = self.state else {
            debug!("ignoring close while closed");
            return Vec::new();
        };
        let events = self.leave_group(current, now);
        if self.forbid_close {
            self.tracker.start_group(self.groups[current].id, now);
        } else {
            self.state = NavigationState::Closed;
        }
        events
    }

    /// Closes the open group regardless of `forbid_close`. Used when the
    /// session ends or the group list is replaced under it.
    pub fn shutdown(&mut self, now: DateTime<Utc>) -> Vec<NavigationEvent> {
        let NavigationState::Open(current) = self.state else {
            return Vec::new();
        };
        let events = self.leave_group(current, now);
        self.state = NavigationState::Closed;
        events
    }

    /// Starts measuring a story of the open group.
    ///
    /// Opening the group's quiz result story also yields
    /// [`NavigationEvent::QuizResultReached`], ahead of the open event.
    pub fn open_story(
        &mut self,
        group_id: Uuid,
        story_id: Uuid,
        now: DateTime<Utc>,
    ) -> Vec<NavigationEvent> {
        let Some(group) = self.current_group() else {
            debug!(%group_id, %story_id, "ignoring story open while closed");
            return Vec::new();
        };
        if group.id != group_id || group.story(story_id).is_none() {
            debug!(%group_id, %story_id, "ignoring story open outside the open group");
            return Vec::new();
        }
        let is_result_story = group.is_quiz_result_story(story_id);

        let mut events = Vec::with_capacity(2);
        if is_result_story {
            events.push(NavigationEvent::QuizResultReached(QuizRef {
                group_id,
                story_id: None,
            }));
        }
        self.tracker.start_story(group_id, story_id, now);
        events.push(NavigationEvent::Emit(PlaybackEventKind::StoryOpened(
            StoryRef { group_id, story_id },
        )));
        events
    }

    /// Stops measuring a story.
    ///
    /// A close that does not match the story timer reports no duration or
    /// impression. It still reports the close when the story belongs to the
    /// open group.
    pub fn close_story(
        &mut self,
        group_id: Uuid,
        story_id: Uuid,
        now: DateTime<Utc>,
    ) -> Vec<NavigationEvent> {
        let events = self.stop_story(group_id, story_id, now);
        if !events.is_empty() {
            return events;
        }
        let in_open_group = self
            .current_group()
            .is_some_and(|g| g.id == group_id && g.story(story_id).is_some());
        if !in_open_group {
            debug!(%group_id, %story_id, "ignoring story close outside the open group");
            return Vec::new();
        }
        debug!(%group_id, %story_id, "story close without a matching timer");
        vec![NavigationEvent::Emit(PlaybackEventKind::StoryClosed(
            StoryRef { group_id, story_id },
        ))]
    }

    /// Swaps in a freshly loaded group list.
    ///
    /// The open group stays open if the same group is still selectable at
    /// the same index; otherwise it is shut down first.
    pub fn replace_groups(&mut self, groups: Vec<Group>, now: DateTime<Utc>) -> Vec<NavigationEvent> {
        let keeps_current = match self.state {
            NavigationState::Open(index) => groups
                .get(index)
                .is_some_and(|g| g.id == self.groups[index].id && g.is_selectable()),
            NavigationState::Closed => true,
        };
        let events = if keeps_current {
            Vec::new()
        } else {
            self.shutdown(now)
        };
        self.groups = groups;
        events
    }

    fn move_to(&mut self, from: usize, to: usize, now: DateTime<Utc>) -> Vec<NavigationEvent> {
        let mut events = self.leave_group(from, now);
        self.state = NavigationState::Open(to);
        events.push(self.enter_group(to, now));
        events
    }

    fn enter_group(&mut self, index: usize, now: DateTime<Utc>) -> NavigationEvent {
        let group_id = self.groups[index].id;
        self.tracker.start_group(group_id, now);
        NavigationEvent::Emit(PlaybackEventKind::GroupOpened(GroupRef { group_id }))
    }

    // The story timer is always stopped before the group timer.
    fn leave_group(&mut self, index: usize, now: DateTime<Utc>) -> Vec<NavigationEvent> {
        let mut events = self.flush_story(now);
        if let Some(duration) = self.tracker.stop_group(now) {
            events.push(NavigationEvent::Emit(PlaybackEventKind::GroupDuration(
                duration,
            )));
        }
        events.push(NavigationEvent::Emit(PlaybackEventKind::GroupClosed(
            GroupRef {
                group_id: self.groups[index].id,
            },
        )));
        events
    }

    fn flush_story(&mut self, now: DateTime<Utc>) -> Vec<NavigationEvent> {
        let Some(record) = self.tracker.active_story() else {
            return Vec::new();
        };
        let Some(group_id) = record.parent_group_id else {
            return Vec::new();
        };
        self.stop_story(group_id, record.entity_id, now)
    }

    fn stop_story(
        &mut self,
        group_id: Uuid,
        story_id: Uuid,
        now: DateTime<Utc>,
    ) -> Vec<NavigationEvent> {
        let Some((duration, impression)) = self.tracker.stop_story(group_id, story_id, now) else {
            return Vec::new();
        };
        let mut events = vec![NavigationEvent::Emit(PlaybackEventKind::StoryDuration(
            duration,
        ))];
        if let Some(impression) = impression {
            events.push(NavigationEvent::Emit(PlaybackEventKind::StoryImpression(
                impression,
            )));
        }
        events.push(NavigationEvent::Emit(PlaybackEventKind::StoryClosed(
            StoryRef { group_id, story_id },
        )));
        events
    }
}
