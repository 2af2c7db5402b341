//! Domain error types.

use thiserror::Error;

/// Top-level domain error type.
///
/// Stale closes and out-of-range navigation are not represented here: they
/// are silent no-ops inside the navigator.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A collaborator reported an error or the call itself failed.
    #[error("fetch failed: {0}")]
    FetchFailed(String),

    /// A referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
