//! Pixel sampling for inverse-mapped transforms.
//!
//! Sample positions use pixel-index coordinates: `(0.0, 0.0)` is the center
//! of the top-left pixel. Positions more than half a pixel outside the
//! image return the background colour.
//!
//! Three filters are available:
//! - **Nearest**: picks the closest pixel, no blending
//! - **Bilinear**: weights the 4 nearest pixels (default, used for preview)
//! - **Lanczos3**: 6x6 windowed sinc, sharper, for final export

use serde::{Deserialize, Serialize};

use crate::raster::RasterImage;

/// Interpolation filter for resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationFilter {
    /// Nearest neighbour - exact pixel copies, blocky under scaling.
    Nearest,
    /// Fast bilinear interpolation - good for preview rendering.
    #[default]
    Bilinear,
    /// High-quality Lanczos3 interpolation - good for export.
    Lanczos3,
}

/// Sample `image` at (x, y) with the given filter.
#[inline]
pub(crate) fn sample(
    image: &RasterImage,
    x: f64,
    y: f64,
    filter: InterpolationFilter,
    background: [u8; 3],
) -> [u8; 3] {
    match filter {
        InterpolationFilter::Nearest => sample_nearest(image, x, y, background),
        InterpolationFilter::Bilinear => sample_bilinear(image, x, y, background),
        InterpolationFilter::Lanczos3 => sample_lanczos3(image, x, y, background),
    }
}

#[inline]
fn outside(image: &RasterImage, x: f64, y: f64) -> bool {
    // Negated comparisons so NaN coordinates count as outside.
    !(x >= -0.5 && x <= image.width as f64 - 0.5 && y >= -0.5 && y <= image.height as f64 - 0.5)
}

/// Get a pixel as [f64; 3] from an image at the given coordinates.
#[inline]
fn get_pixel_f64(image: &RasterImage, px: usize, py: usize) -> [f64; 3] {
    let idx = (py * image.width as usize + px) * 3;
    [
        image.pixels[idx] as f64,
        image.pixels[idx + 1] as f64,
        image.pixels[idx + 2] as f64,
    ]
}

fn sample_nearest(image: &RasterImage, x: f64, y: f64, background: [u8; 3]) -> [u8; 3] {
    if outside(image, x, y) {
        return background;
    }
    let px = (x.round().max(0.0) as u32).min(image.width - 1);
    let py = (y.round().max(0.0) as u32).min(image.height - 1);
    image.pixel(px, py)
}

/// Bilinear interpolation over the 4 nearest pixels. Within half a pixel of
/// the border the edge pixels are extended.
fn sample_bilinear(image: &RasterImage, x: f64, y: f64, background: [u8; 3]) -> [u8; 3] {
    if outside(image, x, y) {
        return background;
    }

    let max_x = (image.width - 1) as f64;
    let max_y = (image.height - 1) as f64;
    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);

    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(image.width as usize - 1);
    let y1 = (y0 + 1).min(image.height as usize - 1);

    // Fractional distances
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = get_pixel_f64(image, x0, y0);
    let p10 = get_pixel_f64(image, x1, y0);
    let p01 = get_pixel_f64(image, x0, y1);
    let p11 = get_pixel_f64(image, x1, y1);

    let mut result = [0u8; 3];
    for i in 0..3 {
        let v = p00[i] * (1.0 - fx) * (1.0 - fy)
            + p10[i] * fx * (1.0 - fy)
            + p01[i] * (1.0 - fx) * fy
            + p11[i] * fx * fy;
        result[i] = v.clamp(0.0, 255.0).round() as u8;
    }

    result
}

/// Lanczos3 over a 6x6 neighbourhood, falling back to bilinear where the
/// kernel would leave the image.
fn sample_lanczos3(image: &RasterImage, x: f64, y: f64, background: [u8; 3]) -> [u8; 3] {
    let (w, h) = (image.width as i64, image.height as i64);

    if !(x >= 2.0 && x < (w - 3) as f64 && y >= 2.0 && y < (h - 3) as f64) {
        return sample_bilinear(image, x, y, background);
    }

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;

    let mut sum = [0.0f64; 3];
    let mut weight_sum = 0.0;

    for ky in -2..=3 {
        for kx in -2..=3 {
            let px = x0 + kx;
            let py = y0 + ky;

            if px >= 0 && px < w && py >= 0 && py < h {
                let weight = lanczos_weight(x - px as f64, 3.0) * lanczos_weight(y - py as f64, 3.0);
                let pixel = get_pixel_f64(image, px as usize, py as usize);
                sum[0] += pixel[0] * weight;
                sum[1] += pixel[1] * weight;
                sum[2] += pixel[2] * weight;
                weight_sum += weight;
            }
        }
    }

    let mut result = [0u8; 3];
    if weight_sum > 0.0 {
        for i in 0..3 {
            result[i] = (sum[i] / weight_sum).clamp(0.0, 255.0).round() as u8;
        }
    }

    result
}

/// Lanczos kernel weight function.
///
/// ```text
/// L(x) = sinc(x) * sinc(x/a)  for |x| < a
/// L(x) = 0                     for |x| >= a
/// ```
fn lanczos_weight(x: f64, a: f64) -> f64 {
    if x.abs() < f64::EPSILON {
        return 1.0;
    }
    if x.abs() >= a {
        return 0.0;
    }

    let pi_x = std::f64::consts::PI * x;
    let pi_x_a = pi_x / a;

    (a * pi_x.sin() * pi_x_a.sin()) / (pi_x * pi_x)
}
