//! Domain layer for the catalog: raw API shapes, app settings and the
//! playback model.

pub mod model;
pub mod raw;
pub mod settings;
