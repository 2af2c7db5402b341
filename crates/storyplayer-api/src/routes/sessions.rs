//! Routes for playback sessions.
//!
//! Every command locks one session for its duration, so commands on a
//! session run one at a time. Reloads fetch without holding the lock.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use storyplayer_catalog::application::loader::{CatalogSnapshot, LoadOutcome};
use storyplayer_catalog::domain::model::Group;
use storyplayer_core::error::DomainError;
use storyplayer_core::sink::OutboundEvent;
use storyplayer_playback::application::dedupe::DedupeCache;
use storyplayer_playback::application::session::{PlaybackSession, SessionOptions};
use storyplayer_playback::domain::navigator::NavigationState;

use crate::error::ApiError;
use crate::state::{AppState, SessionEntry, SessionSlot};

/// Request body for POST /.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateSessionRequest {
    /// Stable per-device user id; generated when absent.
    pub user_id: Option<String>,
    /// Preferred languages, most preferred first.
    pub languages: Vec<String>,
    /// Open the first selectable group right away.
    pub autoplay: bool,
    /// Keep groups open on close.
    pub forbid_close: bool,
}

/// Request body for POST /{id}/select.
#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    /// Index into the session's group list.
    pub index: usize,
}

/// Request body for story routes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryRequest {
    /// Owning group.
    pub group_id: Uuid,
    /// Story.
    pub story_id: Uuid,
}

/// Request body for quiz routes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRequest {
    /// Owning group.
    pub group_id: Uuid,
    /// Story, for single-story quizzes.
    #[serde(default)]
    pub story_id: Option<Uuid>,
}

/// A session as the renderer sees it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    /// Session id.
    pub session_id: Uuid,
    /// Owner.
    pub user_id: String,
    /// Resolved language.
    pub language: String,
    /// Group list presentation.
    pub group_view: String,
    /// Whether to draw a device mockup on desktop.
    pub is_show_mockup: bool,
    /// Navigation state.
    pub state: NavigationState,
    /// The open group.
    pub current_group_id: Option<Uuid>,
    /// All groups, including unselectable ones.
    pub groups: Vec<Group>,
}

impl SessionView {
    fn of(slot: &SessionSlot) -> Self {
        let session = &slot.session;
        Self {
            session_id: session.id(),
            user_id: session.user_id().to_owned(),
            language: session.language().to_owned(),
            group_view: slot.settings.group_view.clone(),
            is_show_mockup: slot.settings.is_show_mockup,
            state: session.state(),
            current_group_id: session.current_group().map(|g| g.id),
            groups: session.groups().to_vec(),
        }
    }
}

/// Response body for POST /.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    /// The new session.
    #[serde(flatten)]
    pub session: SessionView,
    /// Events published while creating it.
    pub event_ids: Vec<Uuid>,
}

/// Response body returned after a command is handled.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    /// IDs of the analytics events the command produced.
    pub event_ids: Vec<Uuid>,
    /// Navigation state after the command.
    pub state: NavigationState,
}

impl CommandResponse {
    fn new(events: &[OutboundEvent], session: &PlaybackSession) -> Self {
        Self {
            event_ids: event_ids(events),
            state: session.state(),
        }
    }
}

/// Response body for POST /{id}/reload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReloadResponse {
    /// IDs of the analytics events the reload produced.
    pub event_ids: Vec<Uuid>,
    /// Navigation state after the reload.
    pub state: NavigationState,
    /// Whether this reload replaced the groups.
    pub reloaded: bool,
    /// Generation of this reload.
    pub generation: u64,
}

fn event_ids(events: &[OutboundEvent]) -> Vec<Uuid> {
    events.iter().map(|e| e.event_id).collect()
}

/// POST /
#[instrument(skip(state, request))]
async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>, ApiError> {
    let user_id = request
        .user_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let loader = state.loader();

    let snapshot = match loader
        .load(&state.request_context, &user_id, &request.languages)
        .await?
    {
        LoadOutcome::Loaded(snapshot) => snapshot,
        LoadOutcome::Superseded { generation } => {
            return Err(ApiError(DomainError::Infrastructure(format!(
                "initial catalog load {generation} was superseded"
            ))));
        }
    };

    let mut session = PlaybackSession::new(
        SessionOptions {
            user_id: user_id.clone(),
            language: snapshot.locale.language.clone(),
            forbid_close: request.forbid_close,
        },
        snapshot.groups,
        DedupeCache::new(Arc::clone(&state.cache_store)),
        Arc::clone(&state.sink),
        Arc::clone(&state.clock),
    );
    let events = if request.autoplay {
        session.select_first().await
    } else {
        Vec::new()
    };

    let session_id = session.id();
    let slot = SessionSlot {
        session,
        settings: snapshot.settings,
    };
    let response = CreateSessionResponse {
        session: SessionView::of(&slot),
        event_ids: event_ids(&events),
    };

    state
        .sessions
        .insert(
            session_id,
            SessionEntry::new(
                user_id,
                loader,
                request.languages,
                slot,
                state.clock.now(),
            ),
        )
        .await;
    info!(%session_id, "session registered");

    Ok(Json(response))
}

/// GET /{id}
#[instrument(skip(state))]
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let entry = state.session(id).await?;
    let slot = entry.slot.lock().await;
    Ok(Json(SessionView::of(&slot)))
}

/// POST /{id}/select
#[instrument(skip(state, request), fields(index = request.index))]
async fn select_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SelectRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let entry = state.session(id).await?;
    let mut slot = entry.slot.lock().await;
    let events = slot.session.select_group(request.index).await;
    Ok(Json(CommandResponse::new(&events, &slot.session)))
}

/// POST /{id}/next-group
#[instrument(skip(state))]
async fn next_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CommandResponse>, ApiError> {
    let entry = state.session(id).await?;
    let mut slot = entry.slot.lock().await;
    let events = slot.session.next_group().await;
    Ok(Json(CommandResponse::new(&events, &slot.session)))
}

/// POST /{id}/prev-group
#[instrument(skip(state))]
async fn prev_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CommandResponse>, ApiError> {
    let entry = state.session(id).await?;
    let mut slot = entry.slot.lock().await;
    let events = slot.session.prev_group().await;
    Ok(Json(CommandResponse::new(&events, &slot.session)))
}

/// POST /{id}/close
#[instrument(skip(state))]
async fn close_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CommandResponse>, ApiError> {
    let entry = state.session(id).await?;
    let mut slot = entry.slot.lock().await;
    let events = slot.session.close().await;
    Ok(Json(CommandResponse::new(&events, &slot.session)))
}

/// POST /{id}/stories/open
#[instrument(skip(state, request), fields(group_id = %request.group_id, story_id = %request.story_id))]
async fn open_story(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<StoryRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let entry = state.session(id).await?;
    let mut slot = entry.slot.lock().await;
    let events = slot
        .session
        .open_story(request.group_id, request.story_id)
        .await;
    Ok(Json(CommandResponse::new(&events, &slot.session)))
}

/// POST /{id}/stories/close
#[instrument(skip(state, request), fields(group_id = %request.group_id, story_id = %request.story_id))]
async fn close_story(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<StoryRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let entry = state.session(id).await?;
    let mut slot = entry.slot.lock().await;
    let events = slot
        .session
        .close_story(request.group_id, request.story_id)
        .await;
    Ok(Json(CommandResponse::new(&events, &slot.session)))
}

/// POST /{id}/stories/next
#[instrument(skip(state, request), fields(group_id = %request.group_id, story_id = %request.story_id))]
async fn next_story(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<StoryRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let entry = state.session(id).await?;
    let mut slot = entry.slot.lock().await;
    let events = slot
        .session
        .next_story(request.group_id, request.story_id)
        .await;
    Ok(Json(CommandResponse::new(&events, &slot.session)))
}

/// POST /{id}/stories/prev
#[instrument(skip(state, request), fields(group_id = %request.group_id, story_id = %request.story_id))]
async fn prev_story(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<StoryRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let entry = state.session(id).await?;
    let mut slot = entry.slot.lock().await;
    let events = slot
        .session
        .prev_story(request.group_id, request.story_id)
        .await;
    Ok(Json(CommandResponse::new(&events, &slot.session)))
}

/// POST /{id}/quiz/start
#[instrument(skip(state, request), fields(group_id = %request.group_id))]
async fn start_quiz(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<QuizRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let entry = state.session(id).await?;
    let mut slot = entry.slot.lock().await;
    let events = slot
        .session
        .start_quiz(request.group_id, request.story_id)
        .await;
    Ok(Json(CommandResponse::new(&events, &slot.session)))
}

/// POST /{id}/quiz/finish
#[instrument(skip(state, request), fields(group_id = %request.group_id))]
async fn finish_quiz(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<QuizRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let entry = state.session(id).await?;
    let mut slot = entry.slot.lock().await;
    let events = slot
        .session
        .finish_quiz(request.group_id, request.story_id)
        .await;
    Ok(Json(CommandResponse::new(&events, &slot.session)))
}

/// Applies a finished load to a locked session. A load is applied only if
/// no newer one has started by the time the lock is held.
async fn apply_reload(
    slot: &mut SessionSlot,
    outcome: LoadOutcome,
    current_generation: u64,
) -> ReloadResponse {
    match outcome {
        LoadOutcome::Loaded(snapshot) if snapshot.generation == current_generation => {
            let events = slot.session.replace_groups(snapshot.groups).await;
            slot.settings = snapshot.settings;
            ReloadResponse {
                event_ids: event_ids(&events),
                state: slot.session.state(),
                reloaded: true,
                generation: snapshot.generation,
            }
        }
        LoadOutcome::Loaded(CatalogSnapshot { generation, .. })
        | LoadOutcome::Superseded { generation } => {
            info!(generation, current_generation, "discarding superseded reload");
            ReloadResponse {
                event_ids: Vec::new(),
                state: slot.session.state(),
                reloaded: false,
                generation,
            }
        }
    }
}

/// POST /{id}/reload
///
/// A failed fetch leaves the session's groups untouched.
#[instrument(skip(state))]
async fn reload(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReloadResponse>, ApiError> {
    let entry = state.session(id).await?;
    let outcome = entry
        .loader
        .load(&state.request_context, &entry.user_id, &entry.preferred_languages)
        .await?;

    let mut slot = entry.slot.lock().await;
    let response = apply_reload(&mut slot, outcome, entry.loader.current_generation()).await;
    Ok(Json(response))
}

/// DELETE /{id}
#[instrument(skip(state))]
async fn end_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CommandResponse>, ApiError> {
    let entry = state.sessions.remove(id).await?;
    let mut slot = entry.slot.lock().await;
    let events = slot.session.end().await;
    info!(session_id = %id, "session removed");
    Ok(Json(CommandResponse::new(&events, &slot.session)))
}

/// Returns the router for playback sessions.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session))
        .route("/{id}", get(get_session).delete(end_session))
        .route("/{id}/select", post(select_group))
        .route("/{id}/next-group", post(next_group))
        .route("/{id}/prev-group", post(prev_group))
        .route("/{id}/close", post(close_group))
        .route("/{id}/stories/open", post(open_story))
        .route("/{id}/stories/close", post(close_story))
        .route("/{id}/stories/next", post(next_story))
        .route("/{id}/stories/prev", post(prev_story))
        .route("/{id}/quiz/start", post(start_quiz))
        .route("/{id}/quiz/finish", post(finish_quiz))
        .route("/{id}/reload", post(reload))
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use storyplayer_catalog::domain::model::{Background, GroupSettings, Story};
    use storyplayer_catalog::domain::raw::RawApp;
    use storyplayer_catalog::domain::settings::{AppSettings, Locale};
    use storyplayer_test_support::{InMemoryCacheStore, ManualClock, RecordingAnalyticsSink};

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    }

    fn group() -> Group {
        Group {
            id: Uuid::new_v4(),
            app_id: None,
            title: "Group".into(),
            image_url: None,
            kind: "group".into(),
            settings: GroupSettings::default(),
            stories: vec![Story {
                id: Uuid::new_v4(),
                status: "active".into(),
                start_time: t0() - Duration::days(1),
                end_time: None,
                background: Background::default(),
                layers_group_id: None,
                widgets: Vec::new(),
            }],
        }
    }

    fn slot(groups: Vec<Group>) -> SessionSlot {
        let session = PlaybackSession::new(
            SessionOptions {
                user_id: "user-1".into(),
                language: "en".into(),
                forbid_close: false,
            },
            groups,
            DedupeCache::new(Arc::new(InMemoryCacheStore::new())),
            Arc::new(RecordingAnalyticsSink::new()),
            Arc::new(ManualClock::new(t0())),
        );
        SessionSlot {
            session,
            settings: AppSettings::from(RawApp::default()),
        }
    }

    fn snapshot(generation: u64, groups: Vec<Group>) -> LoadOutcome {
        LoadOutcome::Loaded(CatalogSnapshot {
            generation,
            settings: AppSettings::from(RawApp::default()),
            locale: Locale {
                language: "en".into(),
                fallback: "en".into(),
            },
            groups,
        })
    }

    #[tokio::test]
    async fn test_reload_overtaken_while_waiting_for_lock_is_discarded() {
        // Arrange
        let mut slot = slot(vec![group()]);

        // Act
        let response = apply_reload(&mut slot, snapshot(2, vec![group(), group()]), 3).await;

        // Assert
        assert!(!response.reloaded);
        assert_eq!(response.generation, 2);
        assert_eq!(slot.session.groups().len(), 1);
    }

    #[tokio::test]
    async fn test_current_reload_replaces_groups() {
        let mut slot = slot(vec![group()]);

        let response = apply_reload(&mut slot, snapshot(3, vec![group(), group()]), 3).await;

        assert!(response.reloaded);
        assert_eq!(response.generation, 3);
        assert_eq!(slot.session.groups().len(), 2);
    }
}
