//! RGB pixel buffer exchanged with the host.
//!
//! Decoding and encoding belong to the host application; the engine only
//! sees tightly packed 8-bit RGB rows.

use crate::error::{Result, TransformError};

/// An RGB image in row-major order (3 bytes per pixel).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// RGB pixel data, `width * height * 3` bytes.
    pub pixels: Vec<u8>,
}

impl RasterImage {
    /// Create a new RasterImage with the given dimensions and pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * 3,
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Create an image filled with a single colour.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Convert to an image::RgbImage for use with `image::imageops`.
    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// Check that the dimensions are non-zero and match the buffer length.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(TransformError::InvalidImage(format!(
                "dimensions must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        let expected = self.width as usize * self.height as usize * 3;
        if self.pixels.len() != expected {
            return Err(TransformError::InvalidImage(format!(
                "expected {} bytes for {}x{} RGB, got {}",
                expected,
                self.width,
                self.height,
                self.pixels.len()
            )));
        }
        Ok(())
    }

    /// Get the RGB value at (x, y). Caller guarantees bounds.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        [self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2]]
    }
}
