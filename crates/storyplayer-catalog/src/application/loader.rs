//! Catalog loader: fetches settings, groups and per-group stories, then
//! adapts them.
//!
//! Story lists are fetched concurrently and the catalog is only considered
//! loaded once every dispatched fetch has settled, whatever order they finish
//! in. Each load takes a new generation number; a load that is overtaken by a
//! newer one is discarded instead of replacing fresher data.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use storyplayer_core::clock::Clock;
use storyplayer_core::context::RequestContext;
use storyplayer_core::error::DomainError;
use tokio::task::JoinSet;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::application::adapter::{adapt, select_groups};
use crate::application::source::StorySource;
use crate::domain::model::Group;
use crate::domain::raw::{RawGroup, RawStory};
use crate::domain::settings::{AppSettings, Locale};

/// A fully loaded catalog.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    /// Generation of the load that produced this snapshot.
    pub generation: u64,
    /// App presentation settings.
    pub settings: AppSettings,
    /// Resolved session language.
    pub locale: Locale,
    /// Adapted groups, including unselectable ones.
    pub groups: Vec<Group>,
}

/// Result of a load.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    /// The load completed and is the most recent one.
    Loaded(CatalogSnapshot),
    /// A newer load started before this one finished.
    Superseded {
        /// Generation of the discarded load.
        generation: u64,
    },
}

struct StoryFetch {
    group_id: Uuid,
    result: Result<Vec<RawStory>, DomainError>,
}

/// Loads the catalog through a `StorySource`.
pub struct GroupLoader {
    source: Arc<dyn StorySource>,
    clock: Arc<dyn Clock>,
    generation: AtomicU64,
}

impl GroupLoader {
    /// Creates a loader.
    #[must_use]
    pub fn new(source: Arc<dyn StorySource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            clock,
            generation: AtomicU64::new(0),
        }
    }

    /// Generation of the most recently started load.
    #[must_use]
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.current_generation() == generation
    }

    /// Runs a full load for `user_id`.
    ///
    /// Failed story fetches are logged and leave that group empty.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::FetchFailed` if app settings or the group list
    /// cannot be fetched.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn load(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        preferred_languages: &[String],
    ) -> Result<LoadOutcome, DomainError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let settings = AppSettings::from(self.source.fetch_app(ctx).await?.into_result("app")?);
        let locale = settings.localization.locale_for(preferred_languages);
        let ctx = ctx.clone().with_language(locale.language.clone());

        let raw_groups = self
            .source
            .fetch_groups(&ctx)
            .await?
            .into_result("groups")?;
        let listed = select_groups(&raw_groups);

        if !self.is_current(generation) {
            info!(generation, "discarding superseded catalog load");
            return Ok(LoadOutcome::Superseded { generation });
        }

        let stories_by_group = self.fetch_all_stories(&ctx, &listed).await;

        if !self.is_current(generation) {
            info!(generation, "discarding superseded catalog load");
            return Ok(LoadOutcome::Superseded { generation });
        }

        let groups = adapt(
            &listed,
            &stories_by_group,
            user_id,
            &locale,
            self.clock.as_ref(),
        );
        info!(
            generation,
            groups = groups.len(),
            language = %locale.language,
            "catalog loaded"
        );

        Ok(LoadOutcome::Loaded(CatalogSnapshot {
            generation,
            settings,
            locale,
            groups,
        }))
    }

    async fn fetch_all_stories(
        &self,
        ctx: &RequestContext,
        groups: &[RawGroup],
    ) -> HashMap<Uuid, Vec<RawStory>> {
        let mut tasks = JoinSet::new();
        for group in groups {
            let source = Arc::clone(&self.source);
            let ctx = ctx.clone();
            let group_id = group.id;
            tasks.spawn(async move {
                let result = source
                    .fetch_stories(&ctx, group_id)
                    .await
                    .and_then(|response| response.into_result("stories"));
                StoryFetch { group_id, result }
            });
        }

        let mut stories = HashMap::with_capacity(groups.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(StoryFetch {
                    group_id,
                    result: Ok(list),
                }) => {
                    stories.insert(group_id, list);
                }
                Ok(StoryFetch {
                    group_id,
                    result: Err(error),
                }) => {
                    warn!(%group_id, %error, "story fetch failed; group left empty");
                }
                Err(error) => {
                    warn!(%error, "story fetch task did not complete");
                }
            }
        }
        stories
    }
}
