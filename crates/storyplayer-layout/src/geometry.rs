//! Geometry value types shared by stories and the layout transform.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use storyplayer_core::error::DomainError;

/// A widget's box in canonical pixel units. `rotate` is in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Left offset.
    pub x: f64,
    /// Top offset.
    pub y: f64,
    /// Box width.
    pub width: f64,
    /// Box height.
    pub height: f64,
    /// Clockwise rotation in degrees.
    #[serde(default)]
    pub rotate: f64,
}

/// Per-axis self-sizing flags for a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionLimits {
    /// The widget picks its own width.
    #[serde(default, alias = "is_auto_width")]
    pub is_auto_width: bool,
    /// The widget picks its own height.
    #[serde(default, alias = "is_auto_height")]
    pub is_auto_height: bool,
}

/// A resolution a story was authored at, written `WxH` (e.g. `1080x1920`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CanonicalSize {
    width: u32,
    height: u32,
}

impl CanonicalSize {
    /// Creates a canonical size.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if either dimension is zero.
    pub fn new(width: u32, height: u32) -> Result<Self, DomainError> {
        if width == 0 || height == 0 {
            return Err(DomainError::Validation(format!(
                "canonical size must be non-zero, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// Canonical width in pixels.
    #[must_use]
    pub fn width(self) -> u32 {
        self.width
    }

    /// Canonical height in pixels.
    #[must_use]
    pub fn height(self) -> u32 {
        self.height
    }
}

impl fmt::Display for CanonicalSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for CanonicalSize {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::Validation(format!("invalid canonical size key: {s:?}"));
        let (w, h) = s.split_once('x').ok_or_else(invalid)?;
        let width = w.trim().parse().map_err(|_| invalid())?;
        let height = h.trim().parse().map_err(|_| invalid())?;
        Self::new(width, height)
    }
}

impl TryFrom<String> for CanonicalSize {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CanonicalSize> for String {
    fn from(value: CanonicalSize) -> Self {
        value.to_string()
    }
}

/// The viewer's viewport in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Viewport width.
    pub width: f64,
    /// Viewport height.
    pub height: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_size_parses_resolution_key() {
        let size: CanonicalSize = "1080x1920".parse().unwrap();
        assert_eq!(size.width(), 1080);
        assert_eq!(size.height(), 1920);
        assert_eq!(size.to_string(), "1080x1920");
    }

    #[test]
    fn test_canonical_size_rejects_zero_and_garbage() {
        assert!("0x1920".parse::<CanonicalSize>().is_err());
        assert!("1080".parse::<CanonicalSize>().is_err());
        assert!("axb".parse::<CanonicalSize>().is_err());
    }

    #[test]
    fn test_canonical_size_deserializes_from_string() {
        let size: CanonicalSize = serde_json::from_str("\"390x844\"").unwrap();
        assert_eq!(size, CanonicalSize::new(390, 844).unwrap());
    }

    #[test]
    fn test_position_limits_accept_snake_case_keys() {
        let limits: PositionLimits =
            serde_json::from_str(r#"{"is_auto_width": true}"#).unwrap();
        assert!(limits.is_auto_width);
        assert!(!limits.is_auto_height);
    }
}
