use log::debug;
use pdf_engine::PageSize;

/// Sizes for the drawing surface of one rendered page.
///
/// The backing buffer carries `natural × scale × dpr` pixels while the display
/// size stays at `natural × scale`, so high-density screens get a crisp bitmap
/// without changing the page's layout size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceLayout {
    pub backing_width: u32,
    pub backing_height: u32,
    pub display_width: f64,
    pub display_height: f64,
    pub device_pixel_ratio: f64,
}

impl SurfaceLayout {
    pub fn new(natural: PageSize, scale: f64, device_pixel_ratio: f64) -> Self {
        let display_width = f64::from(natural.width_pt) * scale;
        let display_height = f64::from(natural.height_pt) * scale;

        Self {
            backing_width: pixel_extent(display_width * device_pixel_ratio),
            backing_height: pixel_extent(display_height * device_pixel_ratio),
            display_width,
            display_height,
            device_pixel_ratio,
        }
    }

    /// Like [`SurfaceLayout::new`], but lowers the pixel ratio until the backing
    /// buffer holds at most `max_pixels` pixels.
    ///
    /// The display size is unaffected; an oversized page is shown upscaled from
    /// a smaller bitmap instead of allocating one it cannot afford.
    pub fn with_pixel_budget(
        natural: PageSize,
        scale: f64,
        device_pixel_ratio: f64,
        max_pixels: u64,
    ) -> Self {
        let max_pixels = max_pixels.max(1);
        let layout = Self::new(natural, scale, device_pixel_ratio);
        if layout.backing_pixels() <= max_pixels {
            return layout;
        }

        let display_area = layout.display_width * layout.display_height;
        let mut ratio = (max_pixels as f64 / display_area).sqrt();
        if !ratio.is_finite() {
            ratio = 0.0;
        }

        let mut capped = Self::new(natural, scale, ratio);
        // Flooring keeps the area under budget except when the 1px minimum kicks in.
        while capped.backing_pixels() > max_pixels && ratio > 0.0 {
            ratio *= 0.99;
            capped = Self::new(natural, scale, ratio);
        }

        debug!(
            "backing {}x{} exceeds {max_pixels} pixels, rendering at pixel ratio {ratio:.4}",
            layout.backing_width, layout.backing_height
        );
        capped
    }

    pub fn backing_pixels(&self) -> u64 {
        u64::from(self.backing_width) * u64::from(self.backing_height)
    }
}

fn pixel_extent(value: f64) -> u32 {
    if value.is_finite() {
        value.floor().clamp(1.0, f64::from(u32::MAX)) as u32
    } else {
        1
    }
}
