//! Storyplayer: HTTP host.
//!
//! Exposes playback sessions and the layout transform to a thin renderer.

use axum::Router;

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod sweeper;

use crate::state::AppState;

/// Builds the application router without transport layers.
pub fn router(app_state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/sessions", routes::sessions::router())
        .nest("/api/v1/layout", routes::layout::router())
        .with_state(app_state)
}
