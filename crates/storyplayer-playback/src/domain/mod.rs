//! Domain layer for playback.

pub mod duration;
pub mod events;
pub mod navigator;
