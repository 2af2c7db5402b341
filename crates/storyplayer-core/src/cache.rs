//! Persisted key-value cache abstraction.

use async_trait::async_trait;

use crate::error::DomainError;

/// Durable key-value storage partitioned by scope.
///
/// The scope is the stable per-device user identifier, so entries written for
/// one user are never visible to another.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Reads the value stored under `key` in `scope`.
    async fn get(&self, scope: &str, key: &str) -> Result<Option<serde_json::Value>, DomainError>;

    /// Writes `value` under `key` in `scope`, replacing any previous value.
    async fn set(&self, scope: &str, key: &str, value: serde_json::Value)
    -> Result<(), DomainError>;
}
