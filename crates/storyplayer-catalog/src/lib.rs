//! Storyplayer: catalog.
//!
//! Responsible for fetching app settings, groups and stories from the
//! content API and adapting them into the immutable playback model.

pub mod application;
pub mod domain;
