//! Storyplayer: playback.
//!
//! Responsible for the group navigation state machine, dwell-time
//! measurement, quiz completion dedupe and the analytics events each
//! transition produces.

pub mod application;
pub mod domain;
