//! Storyplayer: durable cache storage.
//!
//! Implements `CacheStore` on SQLite. Values are stored as JSON text, keyed
//! by `(scope, key)`.

pub mod schema;
pub mod sqlite_cache_store;

pub use sqlite_cache_store::SqliteCacheStore;
