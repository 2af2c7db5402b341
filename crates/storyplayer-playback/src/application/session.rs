//! Playback session: one viewer's navigator wired to analytics and the
//! dedupe cache.
//!
//! Each call samples the clock once, runs the transition, resolves quiz
//! finishes against the dedupe cache and publishes whatever the transition
//! produced in a single batch sharing one correlation id. Sink and cache
//! failures are logged and never returned.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use storyplayer_catalog::domain::model::Group;
use storyplayer_core::clock::Clock;
use storyplayer_core::event::EventMetadata;
use storyplayer_core::sink::{AnalyticsSink, OutboundEvent};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::dedupe::{DedupeCache, FinishTarget};
use crate::domain::events::{PlaybackEvent, PlaybackEventKind, QuizRef, StoryRef};
use crate::domain::navigator::{GroupNavigator, NavigationEvent, NavigationState};

/// Per-session options.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Stable per-device user identifier.
    pub user_id: String,
    /// Resolved session language.
    pub language: String,
    /// Keep the open group open on `close`.
    pub forbid_close: bool,
}

/// A single viewer's playback session.
pub struct PlaybackSession {
    id: Uuid,
    user_id: String,
    language: String,
    navigator: GroupNavigator,
    dedupe: DedupeCache,
    sink: Arc<dyn AnalyticsSink>,
    clock: Arc<dyn Clock>,
}

impl PlaybackSession {
    /// Creates a closed session over `groups`.
    #[must_use]
    pub fn new(
        options: SessionOptions,
        groups: Vec<Group>,
        dedupe: DedupeCache,
        sink: Arc<dyn AnalyticsSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let id = Uuid::new_v4();
        info!(session_id = %id, user_id = %options.user_id, groups = groups.len(), "session created");
        Self {
            id,
            user_id: options.user_id,
            language: options.language,
            navigator: GroupNavigator::new(groups, options.forbid_close),
            dedupe,
            sink,
            clock,
        }
    }

    /// Session identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// User the session belongs to.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Session language.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Navigation state.
    #[must_use]
    pub fn state(&self) -> NavigationState {
        self.navigator.state()
    }

    /// All groups of the session.
    #[must_use]
    pub fn groups(&self) -> &[Group] {
        self.navigator.groups()
    }

    /// The open group.
    #[must_use]
    pub fn current_group(&self) -> Option<&Group> {
        self.navigator.current_group()
    }

    /// Opens the group at `index`.
    pub async fn select_group(&mut self, index: usize) -> Vec<OutboundEvent> {
        let now = self.clock.now();
        let transition = self.navigator.select(index, now);
        self.dispatch(transition, now).await
    }

    /// Opens the first selectable group, if any. Used for autoplay.
    pub async fn select_first(&mut self) -> Vec<OutboundEvent> {
        let Some(index) = self.navigator.first_selectable() else {
            debug!(session_id = %self.id, "nothing to autoplay");
            return Vec::new();
        };
        self.select_group(index).await
    }

    /// Moves to the next selectable group.
    pub async fn next_group(&mut self) -> Vec<OutboundEvent> {
        let now = self.clock.now();
        let transition = self.navigator.next(now);
        self.dispatch(transition, now).await
    }

    /// Moves to the previous selectable group.
    pub async fn prev_group(&mut self) -> Vec<OutboundEvent> {
        let now = self.clock.now();
        let transition = self.navigator.prev(now);
        self.dispatch(transition, now).await
    }

    /// Closes the open group.
    pub async fn close(&mut self) -> Vec<OutboundEvent> {
        let now = self.clock.now();
        let transition = self.navigator.close(now);
        self.dispatch(transition, now).await
    }

    /// A story of the open group became visible.
    pub async fn open_story(&mut self, group_id: Uuid, story_id: Uuid) -> Vec<OutboundEvent> {
        let now = self.clock.now();
        let transition = self.navigator.open_story(group_id, story_id, now);
        self.dispatch(transition, now).await
    }

    /// A story stopped being visible.
    pub async fn close_story(&mut self, group_id: Uuid, story_id: Uuid) -> Vec<OutboundEvent> {
        let now = self.clock.now();
        let transition = self.navigator.close_story(group_id, story_id, now);
        self.dispatch(transition, now).await
    }

    /// The viewer tapped forward on a story.
    pub async fn next_story(&mut self, group_id: Uuid, story_id: Uuid) -> Vec<OutboundEvent> {
        self.story_passthrough(group_id, story_id, PlaybackEventKind::StoryNext)
            .await
    }

    /// The viewer tapped back on a story.
    pub async fn prev_story(&mut self, group_id: Uuid, story_id: Uuid) -> Vec<OutboundEvent> {
        self.story_passthrough(group_id, story_id, PlaybackEventKind::StoryPrev)
            .await
    }

    /// The viewer answered the first question of a quiz.
    pub async fn start_quiz(&mut self, group_id: Uuid, story_id: Option<Uuid>) -> Vec<OutboundEvent> {
        if !self.knows(group_id, story_id) {
            debug!(%group_id, ?story_id, "ignoring quiz start for unknown entity");
            return Vec::new();
        }
        let now = self.clock.now();
        self.publish(
            vec![PlaybackEventKind::QuizStarted(QuizRef { group_id, story_id })],
            now,
        )
        .await
    }

    /// The viewer completed a quiz. Reported only the first time per user.
    ///
    /// The finish is recorded against the story when one is given, otherwise
    /// against the group.
    pub async fn finish_quiz(&mut self, group_id: Uuid, story_id: Option<Uuid>) -> Vec<OutboundEvent> {
        if !self.knows(group_id, story_id) {
            debug!(%group_id, ?story_id, "ignoring quiz finish for unknown entity");
            return Vec::new();
        }
        let now = self.clock.now();
        let target = story_id.map_or(FinishTarget::Group(group_id), FinishTarget::Story);
        if !self.mark_finished(target).await {
            return Vec::new();
        }
        self.publish(
            vec![PlaybackEventKind::QuizFinished(QuizRef { group_id, story_id })],
            now,
        )
        .await
    }

    /// Swaps in a reloaded group list.
    pub async fn replace_groups(&mut self, groups: Vec<Group>) -> Vec<OutboundEvent> {
        let now = self.clock.now();
        let transition = self.navigator.replace_groups(groups, now);
        info!(session_id = %self.id, groups = self.navigator.groups().len(), "session groups replaced");
        self.dispatch(transition, now).await
    }

    /// Ends the session, closing any open group even under `forbid_close`.
    pub async fn end(&mut self) -> Vec<OutboundEvent> {
        let now = self.clock.now();
        let transition = self.navigator.shutdown(now);
        info!(session_id = %self.id, "session ended");
        self.dispatch(transition, now).await
    }

    fn knows(&self, group_id: Uuid, story_id: Option<Uuid>) -> bool {
        self.navigator
            .groups()
            .iter()
            .find(|g| g.id == group_id)
            .is_some_and(|g| story_id.is_none_or(|s| g.story(s).is_some()))
    }

    async fn story_passthrough(
        &mut self,
        group_id: Uuid,
        story_id: Uuid,
        make: fn(StoryRef) -> PlaybackEventKind,
    ) -> Vec<OutboundEvent> {
        let in_open_group = self
            .navigator
            .current_group()
            .is_some_and(|g| g.id == group_id && g.story(story_id).is_some());
        if !in_open_group {
            debug!(%group_id, %story_id, "ignoring story navigation outside the open group");
            return Vec::new();
        }
        let now = self.clock.now();
        self.publish(vec![make(StoryRef { group_id, story_id })], now)
            .await
    }

    async fn dispatch(
        &self,
        transition: Vec<NavigationEvent>,
        now: DateTime<Utc>,
    ) -> Vec<OutboundEvent> {
        let mut kinds = Vec::with_capacity(transition.len());
        for event in transition {
            match event {
                NavigationEvent::Emit(kind) => kinds.push(kind),
                NavigationEvent::QuizResultReached(quiz) => {
                    if self.mark_finished(FinishTarget::Group(quiz.group_id)).await {
                        kinds.push(PlaybackEventKind::QuizFinished(quiz));
                    }
                }
            }
        }
        self.publish(kinds, now).await
    }

    async fn mark_finished(&self, target: FinishTarget) -> bool {
        match self.dedupe.finish_once(&self.user_id, target).await {
            Ok(first) => first,
            Err(error) => {
                warn!(session_id = %self.id, %target, %error, "dedupe cache unavailable; quiz finish not reported");
                false
            }
        }
    }

    async fn publish(&self, kinds: Vec<PlaybackEventKind>, now: DateTime<Utc>) -> Vec<OutboundEvent> {
        if kinds.is_empty() {
            return Vec::new();
        }
        let correlation_id = Uuid::new_v4();
        let events: Vec<OutboundEvent> = kinds
            .into_iter()
            .map(|kind| {
                let event = PlaybackEvent {
                    metadata: EventMetadata {
                        event_id: Uuid::new_v4(),
                        event_type: kind.event_type().to_owned(),
                        user_id: self.user_id.clone(),
                        language: self.language.clone(),
                        correlation_id,
                        occurred_at: now,
                    },
                    kind,
                };
                OutboundEvent::from_event(&event)
            })
            .collect();

        if let Err(error) = self.sink.publish(&events).await {
            warn!(session_id = %self.id, %error, count = events.len(), "analytics publish failed");
        }
        events
    }
}

impl std::fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("language", &self.language)
            .field("navigator", &self.navigator)
            .finish_non_exhaustive()
    }
}
