//! Viewer and layout configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use storybook::loader::{LoadOptions, LOAD_FAILURE_PLACEHOLDER};

/// Viewport size in CSS-like pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 480,
            height: 800,
        }
    }
}

/// Page metrics consumed by [`crate::HeuristicOracle`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Left margin.
    pub margin_left: i32,
    /// Right margin.
    pub margin_right: i32,
    /// Top margin.
    pub margin_top: i32,
    /// Bottom margin.
    pub margin_bottom: i32,
    /// Body font size.
    pub font_size_px: f32,
    /// Line-height multiplier applied to `font_size_px`.
    pub line_height: f32,
    /// Gap after each paragraph.
    pub paragraph_gap_px: i32,
    /// Height reserved for the story title on a story's first page.
    pub title_block_px: i32,
    /// Height reserved for the cover image on a story's first page.
    pub cover_image_px: i32,
    /// Height reserved for the page-number footer.
    pub page_number_px: i32,
    /// Advance of full-width glyphs (CJK, emoji), in em.
    pub wide_glyph_em: f32,
    /// Advance of every other glyph, in em.
    pub narrow_glyph_em: f32,
    /// Content may exceed the box by this much before it counts as overflow.
    pub overflow_tolerance_px: f32,
}

impl LayoutConfig {
    pub(crate) fn content_width(&self, viewport: Viewport) -> f32 {
        viewport
            .width
            .saturating_sub(self.margin_left)
            .saturating_sub(self.margin_right)
            .max(1) as f32
    }

    pub(crate) fn content_height(&self, viewport: Viewport) -> f32 {
        viewport
            .height
            .saturating_sub(self.margin_top)
            .saturating_sub(self.margin_bottom)
            .saturating_sub(self.page_number_px)
            .max(0) as f32
    }

    /// Pixel fields that must not be negative, by config name.
    fn pixel_fields(&self) -> [(&'static str, i32); 8] {
        [
            ("margin_left", self.margin_left),
            ("margin_right", self.margin_right),
            ("margin_top", self.margin_top),
            ("margin_bottom", self.margin_bottom),
            ("paragraph_gap_px", self.paragraph_gap_px),
            ("title_block_px", self.title_block_px),
            ("cover_image_px", self.cover_image_px),
            ("page_number_px", self.page_number_px),
        ]
    }

    pub(crate) fn line_px(&self) -> f32 {
        (self.font_size_px * self.line_height).max(1.0)
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin_left: 24,
            margin_right: 24,
            margin_top: 32,
            margin_bottom: 24,
            font_size_px: 16.0,
            line_height: 1.8,
            paragraph_gap_px: 12,
            title_block_px: 56,
            cover_image_px: 220,
            page_number_px: 28,
            wide_glyph_em: 1.0,
            narrow_glyph_em: 0.55,
            overflow_tolerance_px: 1.0,
        }
    }
}

/// Top-level viewer configuration. Every field has a default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Page-turn transition duration.
    pub transition_ms: u64,
    /// Quiet period before a resize triggers re-pagination.
    pub resize_debounce_ms: u64,
    /// Minimum horizontal travel for a swipe.
    pub swipe_min_distance: f32,
    /// Horizontal travel must exceed vertical travel times this ratio.
    pub swipe_axis_ratio: f32,
    /// Initial viewport.
    pub viewport: Viewport,
    pub layout: LayoutConfig,
    /// Paragraph shown for stories that fail to load.
    pub placeholder_text: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            transition_ms: 300,
            resize_debounce_ms: 200,
            swipe_min_distance: 50.0,
            swipe_axis_ratio: 2.0,
            viewport: Viewport::default(),
            layout: LayoutConfig::default(),
            placeholder_text: LOAD_FAILURE_PLACEHOLDER.to_string(),
        }
    }
}

impl ViewerConfig {
    /// Parse and validate a JSON config. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.viewport.width <= 0 || self.viewport.height <= 0 {
            return Err(ConfigError::Invalid(format!(
                "viewport must be positive, got {}x{}",
                self.viewport.width, self.viewport.height
            )));
        }
        if !(self.swipe_min_distance.is_finite() && self.swipe_min_distance >= 0.0) {
            return Err(ConfigError::Invalid(
                "swipe_min_distance must be a non-negative number".to_string(),
            ));
        }
        if !(self.swipe_axis_ratio.is_finite() && self.swipe_axis_ratio >= 0.0) {
            return Err(ConfigError::Invalid(
                "swipe_axis_ratio must be a non-negative number".to_string(),
            ));
        }
        let layout = &self.layout;
        if !(layout.font_size_px > 0.0 && layout.line_height > 0.0) {
            return Err(ConfigError::Invalid(
                "font_size_px and line_height must be positive".to_string(),
            ));
        }
        if let Some((name, value)) = layout.pixel_fields().into_iter().find(|(_, v)| *v < 0) {
            return Err(ConfigError::Invalid(format!(
                "{} must not be negative, got {}",
                name, value
            )));
        }
        if !layout.overflow_tolerance_px.is_finite() {
            return Err(ConfigError::Invalid(
                "overflow_tolerance_px must be finite".to_string(),
            ));
        }
        Ok(())
    }

    pub fn transition_duration(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    /// Loader options carrying this config's placeholder text.
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            placeholder: self.placeholder_text.clone(),
            ..LoadOptions::default()
        }
    }
}

/// Viewer configuration error.
#[derive(Debug)]
pub enum ConfigError {
    /// JSON failed to parse.
    Json(serde_json::Error),
    /// A value is out of range.
    Invalid(String),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid viewer config json: {}", err),
            Self::Invalid(msg) => write!(f, "invalid viewer config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = ViewerConfig::from_json_str(
            r#"{"transition_ms": 120, "layout": {"font_size_px": 20.0}}"#,
        )
        .expect("valid config");
        assert_eq!(cfg.transition_ms, 120);
        assert_eq!(cfg.resize_debounce_ms, 200);
        assert_eq!(cfg.layout.font_size_px, 20.0);
        assert_eq!(cfg.layout.overflow_tolerance_px, 1.0);
        assert_eq!(cfg.viewport, Viewport::default());
    }

    #[test]
    fn rejects_non_positive_viewport() {
        let err = ViewerConfig::from_json_str(r#"{"viewport": {"width": 0, "height": 600}}"#)
            .expect_err("zero width");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_negative_layout_metrics() {
        let err = ViewerConfig::from_json_str(r#"{"layout": {"margin_left": -2147483647}}"#)
            .expect_err("negative margin");
        assert!(err.to_string().contains("margin_left"));
        let err = ViewerConfig::from_json_str(r#"{"layout": {"page_number_px": -1}}"#)
            .expect_err("negative footer");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn extreme_metrics_do_not_overflow() {
        let layout = LayoutConfig {
            margin_left: i32::MIN,
            margin_right: i32::MIN,
            margin_top: i32::MIN,
            page_number_px: i32::MIN,
            ..LayoutConfig::default()
        };
        let viewport = Viewport::new(i32::MAX, i32::MAX);
        assert_eq!(layout.content_width(viewport), i32::MAX as f32);
        assert_eq!(layout.content_height(viewport), i32::MAX as f32);
    }

    #[test]
    fn rejects_bad_json() {
        let err = ViewerConfig::from_json_str("[").expect_err("bad json");
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn load_options_carry_placeholder() {
        let cfg = ViewerConfig {
            placeholder_text: "n/a".to_string(),
            ..ViewerConfig::default()
        };
        assert_eq!(cfg.load_options().placeholder, "n/a");
    }
}
