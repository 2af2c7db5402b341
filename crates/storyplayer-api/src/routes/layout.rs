//! Layout transform endpoint.

use axum::extract::State;
use axum::{Json, Router, routing::post};
use serde::{Deserialize, Serialize};
use storyplayer_core::error::DomainError;
use storyplayer_layout::{
    CanonicalSize, DesktopInsets, LayoutMode, Position, PositionLimits, RenderBox, Viewport,
    scale_factor, stage_height, transform,
};
use tracing::instrument;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /transform.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformRequest {
    /// Widget position in canonical pixels.
    pub position: Position,
    /// Auto-sizing flags.
    #[serde(default)]
    pub position_limits: PositionLimits,
    /// Resolution the position was authored at, as `WxH`.
    pub canonical_size: CanonicalSize,
    /// Viewer's viewport.
    pub viewport: Viewport,
    /// Desktop frame allowances.
    #[serde(default)]
    pub insets: DesktopInsets,
}

/// Response body for POST /transform.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformResponse {
    /// Mode chosen for the viewport, with its insets in desktop mode.
    #[serde(flatten)]
    pub mode: LayoutMode,
    /// Uniform scale factor applied.
    pub scale: f64,
    /// Render box in viewport pixels.
    #[serde(rename = "box")]
    pub render_box: RenderBox,
    /// Stage height, in mobile mode only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_height: Option<f64>,
}

fn validate(viewport: Viewport) -> Result<(), DomainError> {
    let valid = |v: f64| v.is_finite() && v >= 0.0;
    if valid(viewport.width) && valid(viewport.height) {
        Ok(())
    } else {
        Err(DomainError::Validation(format!(
            "viewport must be finite and non-negative, got {}x{}",
            viewport.width, viewport.height
        )))
    }
}

/// POST /transform
#[instrument(skip(state, request), fields(canonical = %request.canonical_size))]
async fn transform_widget(
    State(state): State<AppState>,
    Json(request): Json<TransformRequest>,
) -> Result<Json<TransformResponse>, ApiError> {
    validate(request.viewport)?;

    let mode = LayoutMode::for_viewport(request.viewport, state.mobile_breakpoint, request.insets);
    let scale = scale_factor(request.canonical_size, request.viewport, mode);
    let render_box = transform(
        request.position,
        request.position_limits,
        request.canonical_size,
        request.viewport,
        mode,
    );
    let stage = matches!(mode, LayoutMode::Mobile)
        .then(|| stage_height(request.canonical_size, request.viewport));

    Ok(Json(TransformResponse {
        mode,
        scale,
        render_box,
        stage_height: stage,
    }))
}

/// Returns the router for layout.
pub fn router() -> Router<AppState> {
    Router::new().route("/transform", post(transform_widget))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_viewport_is_rejected() {
        let result = validate(Viewport {
            width: -1.0,
            height: 800.0,
        });

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_non_finite_viewport_is_rejected() {
        let result = validate(Viewport {
            width: 360.0,
            height: f64::INFINITY,
        });

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_response_renames_box() {
        let response = TransformResponse {
            mode: LayoutMode::Mobile,
            scale: 0.5,
            render_box: transform(
                Position {
                    x: 10.0,
                    y: 20.0,
                    width: 30.0,
                    height: 40.0,
                    rotate: 0.0,
                },
                PositionLimits::default(),
                CanonicalSize::new(100, 200).unwrap(),
                Viewport {
                    width: 50.0,
                    height: 100.0,
                },
                LayoutMode::Mobile,
            ),
            stage_height: Some(100.0),
        };

        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["mode"], "mobile");
        assert_eq!(json["box"]["x"], 5.0);
        assert_eq!(json["stageHeight"], 100.0);
    }
}
