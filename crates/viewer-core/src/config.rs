//! Viewer tuning configuration.
//!
//! Scale bounds, zoom steps and the swipe threshold are plain defaults rather than
//! derived values. They can be overridden programmatically, from a TOML file, or
//! from environment variables.

use crate::fit::FitMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// Tuning knobs for scaling, zooming and gesture recognition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Smallest allowed display scale
    pub min_scale: f64,
    /// Largest allowed display scale
    pub max_scale: f64,
    /// Decimal places scales are rounded to
    pub scale_precision: u32,
    /// Scale changes smaller than this are ignored
    pub zoom_epsilon: f64,
    /// Multiplier for keyboard and button zoom
    pub zoom_step: f64,
    /// Multiplier for one modifier+wheel tick
    pub wheel_zoom_step: f64,
    /// Horizontal travel a touch must exceed to count as a swipe
    pub swipe_threshold: f64,
    /// Fit mode a freshly loaded document starts in
    pub initial_fit_mode: FitMode,
    /// Largest backing surface, in pixels, a single render may allocate
    pub max_backing_pixels: u64,
}

/// Beyond this many decimals `round_scale` no longer fits in an `f64`.
pub const MAX_SCALE_PRECISION: u32 = 12;

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.25,
            max_scale: 8.0,
            scale_precision: 3,
            zoom_epsilon: 0.0001,
            zoom_step: 1.2,
            wheel_zoom_step: 1.12,
            swipe_threshold: 60.0,
            initial_fit_mode: FitMode::Auto,
            max_backing_pixels: 16_777_216,
        }
    }
}

impl ViewerConfig {
    /// Sets the scale bounds.
    pub fn with_scale_bounds(mut self, min_scale: f64, max_scale: f64) -> Self {
        self.min_scale = min_scale;
        self.max_scale = max_scale;
        self
    }

    /// Sets the keyboard/button and wheel zoom multipliers.
    pub fn with_zoom_steps(mut self, zoom_step: f64, wheel_zoom_step: f64) -> Self {
        self.zoom_step = zoom_step;
        self.wheel_zoom_step = wheel_zoom_step;
        self
    }

    pub fn with_swipe_threshold(mut self, swipe_threshold: f64) -> Self {
        self.swipe_threshold = swipe_threshold;
        self
    }

    pub fn with_initial_fit_mode(mut self, mode: FitMode) -> Self {
        self.initial_fit_mode = mode;
        self
    }

    /// Caps the backing surface of one render. Pages that would need more are
    /// rasterized at a lower pixel ratio.
    pub fn with_max_backing_pixels(mut self, max_backing_pixels: u64) -> Self {
        self.max_backing_pixels = max_backing_pixels;
        self
    }

    /// Loads configuration from a TOML file.
    ///
    /// Missing keys keep their defaults:
    /// ```toml
    /// min_scale = 0.5
    /// max_scale = 4.0
    /// initial_fit_mode = "width"
    /// ```
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&contents)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PDF_VIEWER_MIN_SCALE` / `PDF_VIEWER_MAX_SCALE`
    /// - `PDF_VIEWER_ZOOM_STEP` / `PDF_VIEWER_WHEEL_ZOOM_STEP`
    /// - `PDF_VIEWER_SWIPE_THRESHOLD`
    /// - `PDF_VIEWER_FIT_MODE` (`auto`, `width`, `page` or `custom`)
    /// - `PDF_VIEWER_MAX_BACKING_PIXELS`
    ///
    /// # Errors
    /// Returns an error if any variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        let number = |key: &str| -> Result<Option<f64>, ConfigError> {
            lookup(key)
                .map(|value| {
                    value
                        .trim()
                        .parse::<f64>()
                        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
                })
                .transpose()
        };

        if let Some(value) = number("PDF_VIEWER_MIN_SCALE")? {
            config.min_scale = value;
        }
        if let Some(value) = number("PDF_VIEWER_MAX_SCALE")? {
            config.max_scale = value;
        }
        if let Some(value) = number("PDF_VIEWER_ZOOM_STEP")? {
            config.zoom_step = value;
        }
        if let Some(value) = number("PDF_VIEWER_WHEEL_ZOOM_STEP")? {
            config.wheel_zoom_step = value;
        }
        if let Some(value) = number("PDF_VIEWER_SWIPE_THRESHOLD")? {
            config.swipe_threshold = value;
        }
        if let Some(value) = lookup("PDF_VIEWER_MAX_BACKING_PIXELS") {
            config.max_backing_pixels = value.trim().parse().map_err(|_| {
                ConfigError::InvalidValue("PDF_VIEWER_MAX_BACKING_PIXELS".to_string())
            })?;
        }
        if let Some(value) = lookup("PDF_VIEWER_FIT_MODE") {
            config.initial_fit_mode = match value.trim().to_ascii_lowercase().as_str() {
                "auto" => FitMode::Auto,
                "width" => FitMode::Width,
                "page" => FitMode::Page,
                "custom" => FitMode::Custom,
                _ => return Err(ConfigError::InvalidValue("PDF_VIEWER_FIT_MODE".to_string())),
            };
        }

        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the scheduler cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |value: f64| value.is_finite() && value > 0.0;

        if !positive(self.min_scale) {
            return Err(ConfigError::InvalidValue("min_scale".to_string()));
        }
        if !positive(self.max_scale) || self.max_scale < self.min_scale {
            return Err(ConfigError::InvalidValue("max_scale".to_string()));
        }
        if !positive(self.zoom_epsilon) {
            return Err(ConfigError::InvalidValue("zoom_epsilon".to_string()));
        }
        if !(self.zoom_step.is_finite() && self.zoom_step > 1.0) {
            return Err(ConfigError::InvalidValue("zoom_step".to_string()));
        }
        if !(self.wheel_zoom_step.is_finite() && self.wheel_zoom_step > 1.0) {
            return Err(ConfigError::InvalidValue("wheel_zoom_step".to_string()));
        }
        if !positive(self.swipe_threshold) {
            return Err(ConfigError::InvalidValue("swipe_threshold".to_string()));
        }
        if self.scale_precision > MAX_SCALE_PRECISION {
            return Err(ConfigError::InvalidValue("scale_precision".to_string()));
        }
        if self.max_backing_pixels == 0 {
            return Err(ConfigError::InvalidValue("max_backing_pixels".to_string()));
        }

        Ok(())
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {0}")]
    InvalidValue(String),
}
