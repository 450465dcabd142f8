//! Editor configuration.

use crate::snap::{GRID_SIZE, MAJOR_GRID_EVERY};
use crate::viewport::{MAX_ZOOM, MIN_ZOOM, ZOOM_STEP, ZoomLimits};
use kurbo::{Rect, Size};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pixels per millimetre on the drawing sheet.
pub const MM_TO_PX: f64 = 4.0;

/// Default undo depth.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Physical drawing sheet, in world pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetSize {
    pub width: f64,
    pub height: f64,
    /// Inset of the dashed margin frame from the sheet edge.
    pub margin: f64,
}

impl SheetSize {
    /// A3 landscape drawing area (290 x 150 mm).
    pub const A3: SheetSize = SheetSize {
        width: 290.0 * MM_TO_PX,
        height: 150.0 * MM_TO_PX,
        margin: 10.0 * MM_TO_PX,
    };

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// The frame inside the margin.
    pub fn inner_rect(&self) -> Rect {
        Rect::new(
            self.margin,
            self.margin,
            self.width - self.margin,
            self.height - self.margin,
        )
    }
}

impl Default for SheetSize {
    fn default() -> Self {
        Self::A3
    }
}

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid config data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// Tunables for an [`Editor`](crate::editor::Editor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Minor grid unit used for snapping.
    pub grid_size: f64,
    /// Every n-th grid line is drawn emphasised.
    pub major_grid_every: u32,
    /// Multiplicative zoom per wheel step.
    pub zoom_step: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Maximum number of snapshots kept for undo.
    pub history_limit: usize,
    pub sheet: SheetSize,
    pub grid_visible: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            grid_size: GRID_SIZE,
            major_grid_every: MAJOR_GRID_EVERY,
            zoom_step: ZOOM_STEP,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            history_limit: DEFAULT_HISTORY_LIMIT,
            sheet: SheetSize::default(),
            grid_visible: true,
        }
    }
}

impl EditorConfig {
    /// Parse a (possibly partial) JSON config; missing fields keep their
    /// defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the viewport and snapping math cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, message: String| Err(ConfigError::Invalid { field, message });
        if !(self.grid_size.is_finite() && self.grid_size > 0.0) {
            return invalid("grid_size", format!("{} is not a positive number", self.grid_size));
        }
        if !(self.min_zoom.is_finite() && self.min_zoom > 0.0) {
            return invalid("min_zoom", format!("{} is not a positive number", self.min_zoom));
        }
        if !self.max_zoom.is_finite() || self.max_zoom < self.min_zoom {
            return invalid(
                "max_zoom",
                format!("{} must be at least min_zoom ({})", self.max_zoom, self.min_zoom),
            );
        }
        if !(self.zoom_step.is_finite() && self.zoom_step > 1.0) {
            return invalid("zoom_step", format!("{} must be greater than 1", self.zoom_step));
        }
        Ok(())
    }

    /// Zoom limits for the viewport controller.
    pub fn zoom_limits(&self) -> ZoomLimits {
        ZoomLimits {
            min: self.min_zoom,
            max: self.max_zoom,
            step: self.zoom_step,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a3_dimensions() {
        let sheet = SheetSize::A3;
        assert!((sheet.width - 1160.0).abs() < f64::EPSILON);
        assert!((sheet.height - 600.0).abs() < f64::EPSILON);
        let inner = sheet.inner_rect();
        assert!((inner.x0 - 40.0).abs() < f64::EPSILON);
        assert!((inner.x1 - 1120.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EditorConfig::from_json(r#"{ "grid_size": 20.0 }"#).unwrap();
        assert!((config.grid_size - 20.0).abs() < f64::EPSILON);
        assert_eq!(config.history_limit, DEFAULT_HISTORY_LIMIT);
        assert!(config.grid_visible);
        assert_eq!(config.sheet, SheetSize::A3);
    }

    #[test]
    fn test_inverted_zoom_limits_rejected() {
        let err = EditorConfig::from_json(r#"{ "min_zoom": 3.0, "max_zoom": 2.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "max_zoom", .. }));
    }

    #[test]
    fn test_non_positive_values_rejected() {
        assert!(EditorConfig::from_json(r#"{ "grid_size": 0.0 }"#).is_err());
        assert!(EditorConfig::from_json(r#"{ "min_zoom": -1.0 }"#).is_err());
        assert!(EditorConfig::from_json(r#"{ "zoom_step": 1.0 }"#).is_err());
        assert!(matches!(
            EditorConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_zoom_limits() {
        let limits = EditorConfig::default().zoom_limits();
        assert!((limits.min - 0.25).abs() < f64::EPSILON);
        assert!((limits.max - 2.0).abs() < f64::EPSILON);
    }
}
