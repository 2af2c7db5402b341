//! SQLite implementation of the `CacheStore` trait.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use storyplayer_core::cache::CacheStore;
use storyplayer_core::error::DomainError;

use crate::schema::CREATE_CACHE_TABLE;

fn storage_error(operation: &str, error: &sqlx::Error) -> DomainError {
    DomainError::Infrastructure(format!("cache {operation} failed: {error}"))
}

/// SQLite-backed cache store.
#[derive(Debug, Clone)]
pub struct SqliteCacheStore {
    pool: SqlitePool,
}

impl SqliteCacheStore {
    /// Creates a new `SqliteCacheStore`. Call [`Self::migrate`] before use.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates the cache table if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the statement fails.
    pub async fn migrate(&self) -> Result<(), DomainError> {
        sqlx::query(CREATE_CACHE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("migration", &e))?;
        Ok(())
    }
}

#[async_trait]
impl CacheStore for SqliteCacheStore {
    async fn get(&self, scope: &str, key: &str) -> Result<Option<serde_json::Value>, DomainError> {
        let stored: Option<String> =
            sqlx::query_scalar("SELECT value FROM cache_entries WHERE scope = ? AND key = ?")
                .bind(scope)
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| storage_error("read", &e))?;

        let Some(text) = stored else {
            return Ok(None);
        };
        match serde_json::from_str(&text) {
            Ok(value) => Ok(Some(value)),
            Err(error) => {
                debug!(scope, key, %error, "discarding undecodable cache entry");
                Ok(None)
            }
        }
    }

    async fn set(
        &self,
        scope: &str,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO cache_entries (scope, key, value, updated_at) VALUES (?, ?, ?, ?) \
             ON CONFLICT (scope, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(scope)
        .bind(key)
        .bind(value.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("write", &e))?;
        Ok(())
    }
}
