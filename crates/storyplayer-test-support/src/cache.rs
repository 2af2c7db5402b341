//! Test cache stores: mock `CacheStore` implementations for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use storyplayer_core::cache::CacheStore;
use storyplayer_core::error::DomainError;

/// A cache store backed by a `HashMap`, keyed by `(scope, key)`. Counts
/// writes so tests can assert that a guard did not touch storage.
#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    entries: Mutex<HashMap<(String, String), serde_json::Value>>,
    writes: Mutex<usize>,
}

impl InMemoryCacheStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set` calls made so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap()
    }

    /// Returns a snapshot of the value stored under `(scope, key)`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn entry(&self, scope: &str, key: &str) -> Option<serde_json::Value> {
        self.entries
            .lock()
            .unwrap()
            .get(&(scope.to_owned(), key.to_owned()))
            .cloned()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, scope: &str, key: &str) -> Result<Option<serde_json::Value>, DomainError> {
        Ok(self.entry(scope, key))
    }

    async fn set(
        &self,
        scope: &str,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), DomainError> {
        self.entries
            .lock()
            .unwrap()
            .insert((scope.to_owned(), key.to_owned()), value);
        *self.writes.lock().unwrap() += 1;
        Ok(())
    }
}

/// A cache store that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingCacheStore;

#[async_trait]
impl CacheStore for FailingCacheStore {
    async fn get(&self, _scope: &str, _key: &str) -> Result<Option<serde_json::Value>, DomainError> {
        Err(DomainError::Infrastructure("storage unavailable".into()))
    }

    async fn set(
        &self,
        _scope: &str,
        _key: &str,
        _value: serde_json::Value,
    ) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("storage unavailable".into()))
    }
}
