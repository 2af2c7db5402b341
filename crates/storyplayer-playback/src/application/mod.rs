//! Application layer for playback.

pub mod dedupe;
pub mod publisher;
pub mod session;
