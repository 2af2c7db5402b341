//! Data adapter: filters and normalizes fetched groups and stories.
//!
//! Pure transforms over already-fetched data. The clock is sampled once per
//! adaptation pass so every story in the pass is judged against the same
//! instant.

use std::collections::HashMap;

use storyplayer_core::clock::Clock;
use tracing::debug;
use uuid::Uuid;

use crate::domain::model::{Group, GroupSettings, ONBOARDING_GROUP_TYPE, Story, Widget};
use crate::domain::raw::{RawGroup, RawStory, RawWidget};
use crate::domain::settings::Locale;

/// Whether a raw group belongs in the story list at all.
#[must_use]
pub fn is_listed(raw: &RawGroup) -> bool {
    let Some(kind) = raw.kind.as_deref() else {
        return false;
    };
    if !raw.active || kind.is_empty() {
        return false;
    }
    if kind == ONBOARDING_GROUP_TYPE {
        return raw.settings.add_to_stories;
    }
    true
}

/// Keeps listed groups and orders them by type, descending.
///
/// The sort is stable, so groups of the same type keep their fetch order.
#[must_use]
pub fn select_groups(raw_groups: &[RawGroup]) -> Vec<RawGroup> {
    let mut kept: Vec<RawGroup> = raw_groups.iter().filter(|g| is_listed(g)).cloned().collect();
    kept.sort_by(|a, b| b.kind.cmp(&a.kind));
    kept
}

fn adapt_widget(raw: &RawWidget) -> Widget {
    Widget {
        id: raw.id.clone(),
        position_by_resolution: raw.position_by_resolutions.clone(),
        position_limits: raw.position_limits,
        content: raw.content.clone(),
    }
}

/// Converts a raw story into the playback model without judging eligibility.
#[must_use]
pub fn adapt_story(raw: &RawStory) -> Story {
    Story {
        id: raw.id,
        status: raw.story_data.status.clone(),
        start_time: raw.story_data.start_time,
        end_time: raw.story_data.end_time,
        background: raw.story_data.background.clone(),
        layers_group_id: raw.layer_data.as_ref().and_then(|l| l.layers_group_id),
        widgets: raw.story_data.widgets.iter().map(adapt_widget).collect(),
    }
}

/// Builds the playback model from fetched groups and their story lists.
///
/// Groups without an entry in `raw_stories_by_group`, or with no eligible
/// stories, are kept with an empty story list; the navigator refuses to open
/// them.
#[must_use]
pub fn adapt(
    raw_groups: &[RawGroup],
    raw_stories_by_group: &HashMap<Uuid, Vec<RawStory>>,
    user_id: &str,
    locale: &Locale,
    clock: &dyn Clock,
) -> Vec<Group> {
    let now = clock.now();

    let groups: Vec<Group> = select_groups(raw_groups)
        .into_iter()
        .map(|raw| {
            let stories: Vec<Story> = raw_stories_by_group
                .get(&raw.id)
                .map(|list| {
                    list.iter()
                        .map(adapt_story)
                        .filter(|s| s.is_eligible_at(now))
                        .collect()
                })
                .unwrap_or_default();

            Group {
                id: raw.id,
                app_id: raw.app_id,
                title: raw.title.resolve(&locale.language, &locale.fallback),
                image_url: raw.image_url,
                kind: raw.kind.unwrap_or_default(),
                settings: GroupSettings {
                    add_to_stories: raw.settings.add_to_stories,
                    score_result_layers_group_id: raw.settings.score_result_layers_group_id,
                    extra: raw.settings.extra,
                },
                stories,
            }
        })
        .collect();

    debug!(
        user_id,
        language = %locale.language,
        groups = groups.len(),
        selectable = groups.iter().filter(|g| g.is_selectable()).count(),
        "adapted catalog"
    );

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use storyplayer_test_support::FixedClock;

    use crate::domain::model::Background;
    use crate::domain::raw::{LocalizedText, RawGroupSettings, RawLayerData, RawStoryData};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    }

    fn locale() -> Locale {
        Locale {
            language: "en".into(),
            fallback: "en".into(),
        }
    }

    fn raw_group(kind: Option<&str>, active: bool) -> RawGroup {
        RawGroup {
            id: Uuid::new_v4(),
            app_id: None,
            title: LocalizedText::Plain("Group".into()),
            image_url: None,
            active,
            kind: kind.map(str::to_owned),
            settings: RawGroupSettings::default(),
        }
    }

    fn raw_story(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> RawStory {
        RawStory {
            id: Uuid::new_v4(),
            story_data: RawStoryData {
                status: "active".into(),
                start_time: start,
                end_time: end,
                background: Background::default(),
                widgets: Vec::new(),
            },
            layer_data: None,
        }
    }

    #[test]
    fn test_onboarding_group_requires_add_to_stories() {
        // Arrange
        let hidden = raw_group(Some("onboarding"), true);
        let mut listed = raw_group(Some("onboarding"), true);
        listed.settings.add_to_stories = true;

        // Act / Assert
        assert!(!is_listed(&hidden));
        assert!(is_listed(&listed));
    }

    #[test]
    fn test_inactive_or_untyped_groups_are_dropped() {
        assert!(!is_listed(&raw_group(Some("group"), false)));
        assert!(!is_listed(&raw_group(None, true)));
        assert!(!is_listed(&raw_group(Some(""), true)));
        assert!(is_listed(&raw_group(Some("group"), true)));
    }

    #[test]
    fn test_groups_sorted_by_type_descending_with_stable_ties() {
        // Arrange
        let first = raw_group(Some("group"), true);
        let mut onboarding = raw_group(Some("onboarding"), true);
        onboarding.settings.add_to_stories = true;
        let second = raw_group(Some("group"), true);
        let raw = vec![first.clone(), onboarding.clone(), second.clone()];

        // Act
        let kept = select_groups(&raw);

        // Assert
        let ids: Vec<Uuid> = kept.iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![onboarding.id, first.id, second.id]);
    }

    #[test]
    fn test_adapt_filters_stories_by_window() {
        // Arrange
        let group = raw_group(Some("group"), true);
        let expired = raw_story(now() - Duration::days(2), Some(now() - Duration::days(1)));
        let open_ended = raw_story(now() - Duration::hours(1), None);
        let future = raw_story(now() + Duration::hours(1), None);
        let stories = HashMap::from([(
            group.id,
            vec![expired, open_ended.clone(), future],
        )]);
        let clock = FixedClock(now());

        // Act
        let adapted = adapt(&[group], &stories, "user-1", &locale(), &clock);

        // Assert
        assert_eq!(adapted.len(), 1);
        let ids: Vec<Uuid> = adapted[0].stories.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![open_ended.id]);
    }

    #[test]
    fn test_adapt_keeps_group_without_eligible_stories() {
        // Arrange
        let with_story = raw_group(Some("group"), true);
        let empty = raw_group(Some("group"), true);
        let stories = HashMap::from([
            (with_story.id, vec![raw_story(now() - Duration::hours(1), None)]),
            (
                empty.id,
                vec![raw_story(now() - Duration::days(2), Some(now() - Duration::days(1)))],
            ),
        ]);
        let clock = FixedClock(now());

        // Act
        let adapted = adapt(&[with_story, empty], &stories, "user-1", &locale(), &clock);

        // Assert
        assert_eq!(adapted.len(), 2);
        assert!(adapted[0].is_selectable());
        assert!(!adapted[1].is_selectable());
    }

    #[test]
    fn test_adapt_excludes_hidden_onboarding_even_with_stories() {
        let onboarding = raw_group(Some("onboarding"), true);
        let stories = HashMap::from([(
            onboarding.id,
            vec![raw_story(now() - Duration::hours(1), None)],
        )]);
        let clock = FixedClock(now());

        let adapted = adapt(&[onboarding], &stories, "user-1", &locale(), &clock);

        assert!(adapted.is_empty());
    }

    #[test]
    fn test_adapt_resolves_title_and_layer_link() {
        // Arrange
        let layer = Uuid::new_v4();
        let mut group = raw_group(Some("group"), true);
        group.title = LocalizedText::ByLanguage(
            [("en".to_owned(), "Hello".to_owned()), ("de".to_owned(), "Hallo".to_owned())]
                .into_iter()
                .collect(),
        );
        group.settings.score_result_layers_group_id = Some(layer);
        let mut story = raw_story(now() - Duration::hours(1), None);
        story.layer_data = Some(RawLayerData {
            layers_group_id: Some(layer),
        });
        let story_id = story.id;
        let stories = HashMap::from([(group.id, vec![story])]);
        let clock = FixedClock(now());
        let locale = Locale {
            language: "de".into(),
            fallback: "en".into(),
        };

        // Act
        let adapted = adapt(&[group], &stories, "user-1", &locale, &clock);

        // Assert
        assert_eq!(adapted[0].title, "Hallo");
        assert!(adapted[0].is_quiz_result_story(story_id));
    }
}
