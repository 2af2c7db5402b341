//! Coordinate transform from canonical story space to the viewport.

use serde::{Deserialize, Serialize, Serializer};

use crate::geometry::{CanonicalSize, Position, PositionLimits, Viewport};

/// Viewports narrower than this are laid out in mobile mode.
pub const MOBILE_BREAKPOINT: f64 = 768.0;

/// Vertical space the desktop frame reserves around the story.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesktopInsets {
    /// Padding above and below the story frame.
    pub padding: f64,
    /// Gap taken by chrome inside the frame.
    pub inner_height_gap: f64,
}

/// How the story is fitted into the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum LayoutMode {
    /// Fit to viewport width.
    Mobile,
    /// Fit to the height left after insets.
    Desktop(DesktopInsets),
}

impl LayoutMode {
    /// Picks the mode for `viewport` by comparing its width to `breakpoint`.
    #[must_use]
    pub fn for_viewport(viewport: Viewport, breakpoint: f64, insets: DesktopInsets) -> Self {
        if viewport.width < breakpoint {
            Self::Mobile
        } else {
            Self::Desktop(insets)
        }
    }
}

/// One rendered axis: a pixel length, or left to the widget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    /// Fixed length in viewport pixels.
    Px(f64),
    /// The widget sizes itself.
    Auto,
}

impl Serialize for Dimension {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Px(value) => serializer.serialize_f64(*value),
            Self::Auto => serializer.serialize_str("auto"),
        }
    }
}

/// A widget's render-time box in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RenderBox {
    /// Left offset.
    pub x: f64,
    /// Top offset.
    pub y: f64,
    /// Rendered width.
    pub width: Dimension,
    /// Rendered height.
    pub height: Dimension,
    /// Rotation in degrees, never scaled.
    pub rotate: f64,
}

/// Uniform scale from canonical pixels to viewport pixels.
///
/// Desktop mode clamps at zero when the insets exceed the viewport height.
#[must_use]
pub fn scale_factor(canonical: CanonicalSize, viewport: Viewport, mode: LayoutMode) -> f64 {
    match mode {
        LayoutMode::Mobile => viewport.width / f64::from(canonical.width()),
        LayoutMode::Desktop(insets) => {
            let available = viewport.height - insets.padding - insets.inner_height_gap;
            (available / f64::from(canonical.height())).max(0.0)
        }
    }
}

/// Height of the story stage in mobile mode, rounded to whole pixels.
#[must_use]
pub fn stage_height(canonical: CanonicalSize, viewport: Viewport) -> f64 {
    (f64::from(canonical.height()) * scale_factor(canonical, viewport, LayoutMode::Mobile)).round()
}

/// Maps a canonical widget position onto the viewport.
#[must_use]
pub fn transform(
    position: Position,
    limits: PositionLimits,
    canonical: CanonicalSize,
    viewport: Viewport,
    mode: LayoutMode,
) -> RenderBox {
    let s = scale_factor(canonical, viewport, mode);
    RenderBox {
        x: position.x * s,
        y: position.y * s,
        width: if limits.is_auto_width {
            Dimension::Auto
        } else {
            Dimension::Px(position.width * s)
        },
        height: if limits.is_auto_height {
            Dimension::Auto
        } else {
            Dimension::Px(position.height * s)
        },
        rotate: position.rotate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.01
    }

    fn px(d: Dimension) -> f64 {
        match d {
            Dimension::Px(v) => v,
            Dimension::Auto => panic!("expected Px, got Auto"),
        }
    }

    fn portrait() -> CanonicalSize {
        CanonicalSize::new(1080, 1920).unwrap()
    }

    fn widget() -> Position {
        Position {
            x: 100.0,
            y: 200.0,
            width: 200.0,
            height: 50.0,
            rotate: 0.0,
        }
    }

    #[test]
    fn test_mobile_scales_uniformly_by_width() {
        // Arrange
        let viewport = Viewport {
            width: 360.0,
            height: 740.0,
        };

        // Act
        let rendered = transform(
            widget(),
            PositionLimits::default(),
            portrait(),
            viewport,
            LayoutMode::Mobile,
        );

        // Assert
        assert!(approx(rendered.x, 33.33));
        assert!(approx(rendered.y, 66.67));
        assert!(approx(px(rendered.width), 66.67));
        assert!(approx(px(rendered.height), 16.67));
        assert!(approx(rendered.rotate, 0.0));
    }

    #[test]
    fn test_desktop_scales_by_available_height() {
        // Arrange
        let viewport = Viewport {
            width: 1440.0,
            height: 1000.0,
        };
        let mode = LayoutMode::Desktop(DesktopInsets {
            padding: 20.0,
            inner_height_gap: 20.0,
        });

        // Act
        let s = scale_factor(portrait(), viewport, mode);
        let rendered = transform(widget(), PositionLimits::default(), portrait(), viewport, mode);

        // Assert
        assert!(approx(s, 0.5));
        assert!(approx(rendered.x, 50.0));
        assert!(approx(rendered.y, 100.0));
        assert!(approx(px(rendered.width), 100.0));
        assert!(approx(px(rendered.height), 25.0));
    }

    #[test]
    fn test_auto_limits_leave_size_to_widget_but_scale_offsets() {
        let limits = PositionLimits {
            is_auto_width: true,
            is_auto_height: true,
        };
        let viewport = Viewport {
            width: 540.0,
            height: 960.0,
        };

        let rendered = transform(widget(), limits, portrait(), viewport, LayoutMode::Mobile);

        assert_eq!(rendered.width, Dimension::Auto);
        assert_eq!(rendered.height, Dimension::Auto);
        assert!(approx(rendered.x, 50.0));
        assert!(approx(rendered.y, 100.0));
    }

    #[test]
    fn test_rotation_is_not_scaled() {
        let position = Position {
            rotate: 45.0,
            ..widget()
        };
        let viewport = Viewport {
            width: 360.0,
            height: 640.0,
        };

        let rendered = transform(
            position,
            PositionLimits::default(),
            portrait(),
            viewport,
            LayoutMode::Mobile,
        );

        assert!(approx(rendered.rotate, 45.0));
    }

    #[test]
    fn test_transform_is_deterministic() {
        let viewport = Viewport {
            width: 412.0,
            height: 915.0,
        };
        let first = transform(
            widget(),
            PositionLimits::default(),
            portrait(),
            viewport,
            LayoutMode::Mobile,
        );
        let second = transform(
            widget(),
            PositionLimits::default(),
            portrait(),
            viewport,
            LayoutMode::Mobile,
        );
        assert_eq!(first, second);
    }

    #[test]
    fn test_desktop_scale_clamps_when_insets_exceed_height() {
        let viewport = Viewport {
            width: 1200.0,
            height: 100.0,
        };
        let mode = LayoutMode::Desktop(DesktopInsets {
            padding: 80.0,
            inner_height_gap: 80.0,
        });
        assert!(approx(scale_factor(portrait(), viewport, mode), 0.0));
    }

    #[test]
    fn test_mode_selection_uses_breakpoint() {
        let narrow = Viewport {
            width: 767.0,
            height: 900.0,
        };
        let wide = Viewport {
            width: 768.0,
            height: 900.0,
        };
        let insets = DesktopInsets::default();

        assert_eq!(
            LayoutMode::for_viewport(narrow, MOBILE_BREAKPOINT, insets),
            LayoutMode::Mobile
        );
        assert_eq!(
            LayoutMode::for_viewport(wide, MOBILE_BREAKPOINT, insets),
            LayoutMode::Desktop(insets)
        );
    }

    #[test]
    fn test_stage_height_rounds_scaled_canonical_height() {
        let viewport = Viewport {
            width: 360.0,
            height: 700.0,
        };
        assert!(approx(stage_height(portrait(), viewport), 640.0));
    }

    #[test]
    fn test_render_box_serializes_auto_as_keyword() {
        let rendered = RenderBox {
            x: 1.0,
            y: 2.0,
            width: Dimension::Auto,
            height: Dimension::Px(3.0),
            rotate: 0.0,
        };
        let json = serde_json::to_value(rendered).unwrap();
        assert_eq!(json["width"], "auto");
        assert_eq!(json["height"], 3.0);
    }
}
