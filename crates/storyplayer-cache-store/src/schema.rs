//! Cache database schema.

/// SQL to create the cache table.
pub const CREATE_CACHE_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS cache_entries (
    scope       TEXT NOT NULL,
    key         TEXT NOT NULL,
    value       TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    PRIMARY KEY (scope, key)
);
";
