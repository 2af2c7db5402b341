//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, Duration, TimeZone, Utc};
use http_body_util::BodyExt;
use storyplayer_catalog::application::source::StorySource;
use storyplayer_catalog::domain::model::Background;
use storyplayer_catalog::domain::raw::{
    ApiResponse, LocalizedText, RawApp, RawGroup, RawGroupSettings, RawLayerData, RawLocalization,
    RawStory, RawStoryData,
};
use storyplayer_core::context::RequestContext;
use storyplayer_core::error::DomainError;
use storyplayer_test_support::{InMemoryCacheStore, ManualClock, RecordingAnalyticsSink};
use tower::ServiceExt;
use uuid::Uuid;

use storyplayer_api::state::AppState;

/// Fixed start time used across all integration tests.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
}

/// Idle time after which test sessions are evicted.
pub fn session_ttl() -> Duration {
    Duration::minutes(30)
}

/// Catalog served by [`StubSource`]: group A has a regular story and a quiz
/// result story, group B only has an expired story.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub group_a: Uuid,
    pub story_a1: Uuid,
    pub result_story: Uuid,
    pub group_b: Uuid,
}

fn story(id: Uuid, end: Option<DateTime<Utc>>, layer: Option<Uuid>) -> RawStory {
    RawStory {
        id,
        story_data: RawStoryData {
            status: "active".into(),
            start_time: t0() - Duration::days(2),
            end_time: end,
            background: Background::default(),
            widgets: Vec::new(),
        },
        layer_data: layer.map(|id| RawLayerData {
            layers_group_id: Some(id),
        }),
    }
}

fn group(id: Uuid, settings: RawGroupSettings) -> RawGroup {
    RawGroup {
        id,
        app_id: None,
        title: LocalizedText::Plain("Group".into()),
        image_url: None,
        active: true,
        kind: Some("group".into()),
        settings,
    }
}

/// In-memory content API.
pub struct StubSource {
    pub catalog: Catalog,
    result_layer: Uuid,
    fail: AtomicBool,
}

impl StubSource {
    pub fn new() -> Self {
        Self {
            catalog: Catalog {
                group_a: Uuid::new_v4(),
                story_a1: Uuid::new_v4(),
                result_story: Uuid::new_v4(),
                group_b: Uuid::new_v4(),
            },
            result_layer: Uuid::new_v4(),
            fail: AtomicBool::new(false),
        }
    }

    /// Makes every later fetch fail.
    pub fn fail_from_now_on(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), DomainError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(DomainError::FetchFailed("content API unreachable".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl StorySource for StubSource {
    async fn fetch_app(&self, _ctx: &RequestContext) -> Result<ApiResponse<RawApp>, DomainError> {
        self.check()?;
        Ok(ApiResponse::ok(RawApp {
            localization: Some(RawLocalization {
                default: Some("en".into()),
                languages: vec!["en".into(), "de".into()],
            }),
            ..RawApp::default()
        }))
    }

    async fn fetch_groups(
        &self,
        _ctx: &RequestContext,
    ) -> Result<ApiResponse<Vec<RawGroup>>, DomainError> {
        self.check()?;
        let quiz_settings = RawGroupSettings {
            score_result_layers_group_id: Some(self.result_layer),
            ..RawGroupSettings::default()
        };
        Ok(ApiResponse::ok(vec![
            group(self.catalog.group_a, quiz_settings),
            group(self.catalog.group_b, RawGroupSettings::default()),
        ]))
    }

    async fn fetch_stories(
        &self,
        _ctx: &RequestContext,
        group_id: Uuid,
    ) -> Result<ApiResponse<Vec<RawStory>>, DomainError> {
        self.check()?;
        let stories = if group_id == self.catalog.group_a {
            vec![
                story(self.catalog.story_a1, None, None),
                story(self.catalog.result_story, None, Some(self.result_layer)),
            ]
        } else {
            vec![story(Uuid::new_v4(), Some(t0() - Duration::days(1)), None)]
        };
        Ok(ApiResponse::ok(stories))
    }
}

/// A test app and handles on its doubles.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub source: Arc<StubSource>,
    pub sink: Arc<RecordingAnalyticsSink>,
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    pub fn catalog(&self) -> &Catalog {
        &self.source.catalog
    }
}

/// Build the full app router over in-memory doubles. Uses the same route
/// structure as `main.rs`.
pub fn build_test_app() -> TestApp {
    let source = Arc::new(StubSource::new());
    let sink = Arc::new(RecordingAnalyticsSink::new());
    let clock = Arc::new(ManualClock::new(t0()));
    let app_state = AppState::new(
        clock.clone(),
        source.clone(),
        Arc::new(InMemoryCacheStore::new()),
        sink.clone(),
        RequestContext::new("test-token"),
        storyplayer_layout::MOBILE_BREAKPOINT,
        session_ttl(),
    );

    TestApp {
        router: storyplayer_api::router(app_state.clone()),
        state: app_state,
        source,
        sink,
        clock,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    // Extractor rejections answer in plain text.
    let json: serde_json::Value =
        serde_json::from_slice(&body_bytes).unwrap_or(serde_json::Value::Null);

    (status, json)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: &Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// Send a DELETE request and return the response.
pub async fn delete_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// Create a session and return its id.
pub async fn create_session(app: &Router, body: &serde_json::Value) -> Uuid {
    let (status, json) = post_json(app, "/api/v1/sessions", body).await;
    assert_eq!(status, StatusCode::OK, "create failed: {json}");
    json["sessionId"].as_str().unwrap().parse().unwrap()
}
