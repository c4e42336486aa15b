use crate::RgbaImage;
use image::Rgba;

/// Drawing target for a rendered page.
///
/// The pixel buffer is sized to the backing resolution (page size × scale ×
/// device pixel ratio). How large it appears on screen is the host's concern.
#[derive(Debug, Clone)]
pub struct Surface {
    pixels: RgbaImage,
}

impl Surface {
    pub fn new(width_px: u32, height_px: u32) -> Self {
        Self { pixels: RgbaImage::new(width_px.max(1), height_px.max(1)) }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Reallocates the backing buffer when the requested size differs.
    ///
    /// Returns `true` if the buffer was replaced.
    pub fn resize(&mut self, width_px: u32, height_px: u32) -> bool {
        let width_px = width_px.max(1);
        let height_px = height_px.max(1);

        if self.pixels.width() == width_px && self.pixels.height() == height_px {
            return false;
        }

        self.pixels = RgbaImage::new(width_px, height_px);
        true
    }

    pub fn fill(&mut self, color: Rgba<u8>) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = color;
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut RgbaImage {
        &mut self.pixels
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::new(1, 1)
    }
}
