//! Storyplayer Core: shared abstractions.
//!
//! This crate defines the traits and types that the catalog, playback and
//! infrastructure crates depend on. It contains no infrastructure code.

pub mod cache;
pub mod clock;
pub mod context;
pub mod error;
pub mod event;
pub mod sink;
