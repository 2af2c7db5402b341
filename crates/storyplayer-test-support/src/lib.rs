//! Shared test doubles for the storyplayer engine.

mod cache;
mod clock;
mod sink;

pub use cache::{FailingCacheStore, InMemoryCacheStore};
pub use clock::{FixedClock, ManualClock};
pub use sink::{FailingAnalyticsSink, RecordingAnalyticsSink};
