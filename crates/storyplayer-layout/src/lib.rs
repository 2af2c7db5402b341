//! Storyplayer: widget layout.
//!
//! Maps widget positions authored at a canonical resolution onto the
//! viewer's viewport with a single uniform scale factor.

pub mod geometry;
pub mod transform;

pub use geometry::{CanonicalSize, Position, PositionLimits, Viewport};
pub use transform::{
    DesktopInsets, Dimension, LayoutMode, MOBILE_BREAKPOINT, RenderBox, scale_factor,
    stage_height, transform,
};
