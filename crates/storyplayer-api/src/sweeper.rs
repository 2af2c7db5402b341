//! Idle session eviction.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::state::AppState;

/// Ends and drops every session idle for longer than the state's TTL.
/// Returns how many sessions were evicted.
pub async fn sweep_idle_sessions(state: &AppState) -> usize {
    let cutoff = state.clock.now() - state.session_ttl;
    let evicted = state.sessions.remove_idle(cutoff).await;
    for (session_id, entry) in &evicted {
        let mut slot = entry.slot.lock().await;
        let events = slot.session.end().await;
        info!(%session_id, events = events.len(), "idle session evicted");
    }
    if evicted.is_empty() {
        debug!("no idle sessions");
    }
    evicted.len()
}

/// Runs [`sweep_idle_sessions`] every `every` on the current runtime.
#[must_use]
pub fn spawn_session_sweeper(state: AppState, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            sweep_idle_sessions(&state).await;
        }
    })
}
