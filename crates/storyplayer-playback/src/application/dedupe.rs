//! Quiz completion dedupe.
//!
//! A finish is reported at most once per entity per user. The finished flag
//! is persisted through a `CacheStore` scoped by user id and never reset.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use storyplayer_core::cache::CacheStore;
use storyplayer_core::error::DomainError;
use tracing::debug;
use uuid::Uuid;

/// What a quiz finish is recorded against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FinishTarget {
    /// A quiz spanning a whole group.
    Group(Uuid),
    /// A quiz on one story.
    Story(Uuid),
}

impl FinishTarget {
    /// Entity identifier.
    #[must_use]
    pub fn entity_id(self) -> Uuid {
        match self {
            Self::Group(id) | Self::Story(id) => id,
        }
    }

    /// Cache key. Group and story ids live in separate key spaces.
    #[must_use]
    pub fn cache_key(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FinishTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group(id) => write!(f, "group:{id}"),
            Self::Story(id) => write!(f, "story:{id}"),
        }
    }
}

/// Persisted dedupe entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DedupeCacheEntry {
    /// Finished entity.
    pub entity_id: Uuid,
    /// Monotone: once true, never written back to false.
    pub is_finished: bool,
}

/// Idempotence guard for quiz-finish events.
#[derive(Clone)]
pub struct DedupeCache {
    store: Arc<dyn CacheStore>,
}

impl DedupeCache {
    /// Creates a guard over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Whether `target` is already finished for `user_id`.
    ///
    /// An unreadable entry counts as not finished.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the store cannot be read.
    pub async fn is_finished(&self, user_id: &str, target: FinishTarget) -> Result<bool, DomainError> {
        let stored = self.store.get(user_id, &target.cache_key()).await?;
        let finished = stored
            .and_then(|value| serde_json::from_value::<DedupeCacheEntry>(value).ok())
            .is_some_and(|entry| entry.is_finished);
        Ok(finished)
    }

    /// Marks `target` finished for `user_id`.
    ///
    /// Returns `true` only for the call that flipped the flag. Later calls
    /// return `false` without writing.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the store fails.
    pub async fn finish_once(&self, user_id: &str, target: FinishTarget) -> Result<bool, DomainError> {
        if self.is_finished(user_id, target).await? {
            debug!(user_id, %target, "quiz already finished");
            return Ok(false);
        }

        let entry = DedupeCacheEntry {
            entity_id: target.entity_id(),
            is_finished: true,
        };
        let value = serde_json::to_value(&entry)
            .map_err(|e| DomainError::Infrastructure(format!("dedupe entry serialization failed: {e}")))?;
        self.store.set(user_id, &target.cache_key(), value).await?;
        Ok(true)
    }
}

impl fmt::Debug for DedupeCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DedupeCache").finish_non_exhaustive()
    }
}
