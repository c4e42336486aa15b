//! Fit-to-viewport scale computation
//!
//! Pure functions deriving a display scale from a page's natural size and the
//! viewport it is shown in. Results are clamped to the configured scale bounds
//! and rounded so that tiny viewport jitter does not produce a new bitmap.

use crate::config::{ViewerConfig, MAX_SCALE_PRECISION};
use pdf_engine::PageSize;
use serde::{Deserialize, Serialize};

/// Policy for deriving the display scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Fit width for pages wider than the viewport's proportions, whole page otherwise.
    #[default]
    Auto,
    /// Page width fills the viewport width.
    Width,
    /// Entire page visible.
    Page,
    /// Whatever the user last zoomed to.
    Custom,
}

impl FitMode {
    pub fn is_fit(self) -> bool {
        !matches!(self, Self::Custom)
    }
}

/// Visible area available to the page, in layout units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub device_pixel_ratio: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height, device_pixel_ratio: 1.0 }
    }

    pub fn with_device_pixel_ratio(mut self, device_pixel_ratio: f64) -> Self {
        self.device_pixel_ratio = device_pixel_ratio;
        self
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Device pixel ratio, treating non-positive values as 1.
    pub fn effective_dpr(&self) -> f64 {
        if self.device_pixel_ratio > 0.0 && self.device_pixel_ratio.is_finite() {
            self.device_pixel_ratio
        } else {
            1.0
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 800.0)
    }
}

pub fn round_scale(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision.min(MAX_SCALE_PRECISION) as i32);
    (value * factor).round() / factor
}

/// Clamps into the configured bounds. Non-finite input collapses to the minimum.
///
/// Never panics, even on bounds `validate()` would reject: the upper bound wins
/// when they are inverted.
pub fn clamp_scale(value: f64, config: &ViewerConfig) -> f64 {
    if !value.is_finite() {
        return config.min_scale;
    }

    value.max(config.min_scale).min(config.max_scale)
}

/// Scale that fits `natural` into `viewport` under `mode`.
///
/// Returns `None` for [`FitMode::Custom`] and when either size is degenerate;
/// callers keep their current scale in that case.
pub fn compute_fit_scale(
    natural: PageSize,
    viewport: &Viewport,
    mode: FitMode,
    config: &ViewerConfig,
) -> Option<f64> {
    if natural.is_empty() || viewport.is_empty() {
        return None;
    }

    let sx = viewport.width / f64::from(natural.width_pt);
    let sy = viewport.height / f64::from(natural.height_pt);

    let raw = match mode {
        FitMode::Width => sx,
        FitMode::Page => sx.min(sy),
        FitMode::Auto if sx < sy => sx,
        FitMode::Auto => sx.min(sy),
        FitMode::Custom => return None,
    };

    Some(clamp_scale(round_scale(raw, config.scale_precision), config))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ViewerConfig {
        ViewerConfig::default()
    }

    #[test]
    fn auto_prefers_whole_page_for_portrait() {
        let scale = compute_fit_scale(
            PageSize::new(600.0, 800.0),
            &Viewport::new(800.0, 600.0),
            FitMode::Auto,
            &config(),
        );
        assert_eq!(scale, Some(0.75));
    }

    #[test]
    fn auto_prefers_width_for_wide_pages() {
        let scale = compute_fit_scale(
            PageSize::new(1200.0, 400.0),
            &Viewport::new(800.0, 600.0),
            FitMode::Auto,
            &config(),
        );
        assert_eq!(scale, Some(0.667));
    }

    #[test]
    fn width_ignores_height() {
        let scale = compute_fit_scale(
            PageSize::new(400.0, 4000.0),
            &Viewport::new(800.0, 600.0),
            FitMode::Width,
            &config(),
        );
        assert_eq!(scale, Some(2.0));
    }

    #[test]
    fn page_uses_smallest_ratio() {
        let scale = compute_fit_scale(
            PageSize::new(500.0, 2000.0),
            &Viewport::new(1000.0, 800.0),
            FitMode::Page,
            &config(),
        );
        assert_eq!(scale, Some(0.4));
    }

    #[test]
    fn custom_mode_is_not_fitted() {
        let scale = compute_fit_scale(
            PageSize::new(600.0, 800.0),
            &Viewport::new(800.0, 600.0),
            FitMode::Custom,
            &config(),
        );
        assert_eq!(scale, None);
    }

    #[test]
    fn degenerate_sizes_yield_nothing() {
        let config = config();
        let viewport = Viewport::new(800.0, 600.0);
        let empty_page = PageSize::new(0.0, 800.0);
        assert_eq!(compute_fit_scale(empty_page, &viewport, FitMode::Page, &config), None);

        let collapsed = Viewport::new(0.0, 600.0);
        let page = PageSize::new(600.0, 800.0);
        assert_eq!(compute_fit_scale(page, &collapsed, FitMode::Page, &config), None);
    }

    #[test]
    fn fit_results_stay_within_bounds() {
        let config = config();
        let pages = [(1.0, 1.0), (10.0, 20_000.0), (20_000.0, 10.0), (612.0, 792.0), (3.0, 5000.0)];
        let viewports = [(1.0, 1.0), (320.0, 480.0), (800.0, 600.0), (10_000.0, 10_000.0)];

        for (pw, ph) in pages {
            for (vw, vh) in viewports {
                for mode in [FitMode::Auto, FitMode::Width, FitMode::Page] {
                    let scale = compute_fit_scale(
                        PageSize::new(pw, ph),
                        &Viewport::new(vw, vh),
                        mode,
                        &config,
                    )
                    .expect("non-degenerate inputs always fit");
                    assert!(
                        (config.min_scale..=config.max_scale).contains(&scale),
                        "{mode:?} {pw}x{ph} in {vw}x{vh} gave {scale}"
                    );
                }
            }
        }
    }

    #[test]
    fn rounding_keeps_three_decimals() {
        assert_eq!(round_scale(0.666_666, 3), 0.667);
        assert_eq!(round_scale(1.2345, 2), 1.23);
    }

    #[test]
    fn clamp_handles_non_finite() {
        let config = config();
        assert_eq!(clamp_scale(f64::NAN, &config), 0.25);
        assert_eq!(clamp_scale(100.0, &config), 8.0);
    }

    #[test]
    fn effective_dpr_defaults_to_one() {
        assert_eq!(Viewport::new(1.0, 1.0).with_device_pixel_ratio(0.0).effective_dpr(), 1.0);
        assert_eq!(Viewport::new(1.0, 1.0).with_device_pixel_ratio(2.0).effective_dpr(), 2.0);
    }

    #[test]
    fn clamping_survives_unvalidated_bounds() {
        let inverted = ViewerConfig::default().with_scale_bounds(4.0, 0.5);
        assert_eq!(clamp_scale(2.0, &inverted), 0.5);

        let nan = ViewerConfig::default().with_scale_bounds(f64::NAN, f64::NAN);
        assert_eq!(clamp_scale(2.0, &nan), 2.0);
        assert_eq!(round_scale(1.23456, u32::MAX), round_scale(1.23456, MAX_SCALE_PRECISION));
    }
}
