//! Shared application state.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, Utc};

use storyplayer_catalog::application::loader::GroupLoader;
use storyplayer_catalog::application::source::StorySource;
use storyplayer_catalog::domain::settings::AppSettings;
use storyplayer_core::cache::CacheStore;
use storyplayer_core::clock::Clock;
use storyplayer_core::context::RequestContext;
use storyplayer_core::error::DomainError;
use storyplayer_core::sink::AnalyticsSink;
use storyplayer_playback::application::session::PlaybackSession;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Mutable part of a hosted session.
#[derive(Debug)]
pub struct SessionSlot {
    /// The playback session.
    pub session: PlaybackSession,
    /// App settings from the most recent load.
    pub settings: AppSettings,
}

/// A hosted session with its own loader, so reload generations are not
/// shared between viewers.
pub struct SessionEntry {
    /// Owner of the session.
    pub user_id: String,
    /// Catalog loader for this session.
    pub loader: GroupLoader,
    /// Languages the viewer asked for at creation.
    pub preferred_languages: Vec<String>,
    /// Session state, locked per command.
    pub slot: Mutex<SessionSlot>,
    last_seen_millis: AtomicI64,
}

impl SessionEntry {
    /// Creates an entry last seen at `now`.
    #[must_use]
    pub fn new(
        user_id: String,
        loader: GroupLoader,
        preferred_languages: Vec<String>,
        slot: SessionSlot,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            loader,
            preferred_languages,
            slot: Mutex::new(slot),
            last_seen_millis: AtomicI64::new(now.timestamp_millis()),
        }
    }

    /// Records activity at `now`.
    pub fn touch(&self, now: DateTime<Utc>) {
        self.last_seen_millis
            .fetch_max(now.timestamp_millis(), Ordering::SeqCst);
    }

    fn idle_before(&self, cutoff: DateTime<Utc>) -> bool {
        self.last_seen_millis.load(Ordering::SeqCst) < cutoff.timestamp_millis()
    }
}

/// Live sessions by id.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<SessionEntry>>>,
}

impl SessionRegistry {
    /// Registers `entry` under `id`.
    pub async fn insert(&self, id: Uuid, entry: SessionEntry) {
        self.sessions.write().await.insert(id, Arc::new(entry));
    }

    /// Looks up a session and records activity on it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if no session has this id.
    pub async fn touch(&self, id: Uuid, now: DateTime<Utc>) -> Result<Arc<SessionEntry>, DomainError> {
        let sessions = self.sessions.read().await;
        let entry = sessions
            .get(&id)
            .ok_or_else(|| DomainError::NotFound(format!("session {id}")))?;
        entry.touch(now);
        Ok(Arc::clone(entry))
    }

    /// Removes every session with no activity since `cutoff`.
    pub async fn remove_idle(&self, cutoff: DateTime<Utc>) -> Vec<(Uuid, Arc<SessionEntry>)> {
        let mut sessions = self.sessions.write().await;
        let idle: Vec<Uuid> = sessions
            .iter()
            .filter(|(_, entry)| entry.idle_before(cutoff))
            .map(|(id, _)| *id)
            .collect();
        idle.into_iter()
            .filter_map(|id| sessions.remove(&id).map(|entry| (id, entry)))
            .collect()
    }

    /// Removes a session.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if no session has this id.
    pub async fn remove(&self, id: Uuid) -> Result<Arc<SessionEntry>, DomainError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| DomainError::NotFound(format!("session {id}")))
    }
}

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Clock for duration tracking and story eligibility.
    pub clock: Arc<dyn Clock>,
    /// Content API collaborator.
    pub source: Arc<dyn StorySource>,
    /// Durable storage for the dedupe cache.
    pub cache_store: Arc<dyn CacheStore>,
    /// Analytics destination.
    pub sink: Arc<dyn AnalyticsSink>,
    /// Credentials for content API calls.
    pub request_context: RequestContext,
    /// Width below which layout runs in mobile mode.
    pub mobile_breakpoint: f64,
    /// Live sessions.
    pub sessions: Arc<SessionRegistry>,
    /// Idle time after which a session is ended and dropped.
    pub session_ttl: Duration,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        source: Arc<dyn StorySource>,
        cache_store: Arc<dyn CacheStore>,
        sink: Arc<dyn AnalyticsSink>,
        request_context: RequestContext,
        mobile_breakpoint: f64,
        session_ttl: Duration,
    ) -> Self {
        Self {
            clock,
            source,
            cache_store,
            sink,
            request_context,
            mobile_breakpoint,
            sessions: Arc::new(SessionRegistry::default()),
            session_ttl,
        }
    }

    /// Looks up a session for a command, marking it active.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if no session has this id.
    pub async fn session(&self, id: Uuid) -> Result<Arc<SessionEntry>, DomainError> {
        self.sessions.touch(id, self.clock.now()).await
    }

    /// A loader over this state's source and clock.
    #[must_use]
    pub fn loader(&self) -> GroupLoader {
        GroupLoader::new(Arc::clone(&self.source), Arc::clone(&self.clock))
    }
}
