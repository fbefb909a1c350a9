//! Bakes transform parameters into new pixel data.
//!
//! # Algorithm
//!
//! The forward transform takes a source pixel center to the output canvas:
//!
//! ```text
//! p' = Scale * Rotation * Shear * (p - c_src) + c_dst
//! ```
//!
//! Resampling uses inverse mapping: every output pixel center is mapped back
//! into the source and sampled with the configured filter.
//!
//! # Canvas policy
//!
//! - crop disabled: the canvas is the bounding box of the transformed
//!   corners, content centered, uncovered pixels filled with the background
//! - crop enabled: the canvas keeps the source dimensions and everything
//!   outside it is discarded

use log::debug;

use super::affine::Affine2;
use super::resample::{sample, InterpolationFilter};
use crate::config::EngineConfig;
use crate::error::{Result, TransformError};
use crate::geometry::Point;
use crate::params::TransformParameters;
use crate::raster::RasterImage;

/// Applies [`TransformParameters`] to images. Stateless apart from its
/// settings, so the same input always produces the same output.
#[derive(Debug, Clone, PartialEq)]
pub struct Compositor {
    pub filter: InterpolationFilter,
    pub background: [u8; 3],
    pub max_output_dimension: u32,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl Compositor {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            filter: config.filter,
            background: config.background,
            max_output_dimension: config.max_output_dimension,
        }
    }

    pub fn with_filter(mut self, filter: InterpolationFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Transform `image` according to `params`.
    pub fn apply(&self, image: &RasterImage, params: &TransformParameters) -> Result<RasterImage> {
        image.validate()?;
        validate_parameters(params)?;

        // Fast path: nothing to do
        if params.is_identity() {
            return Ok(image.clone());
        }

        let (out_w, out_h) = output_bounds(image.width, image.height, params);
        let limit = self.max_output_dimension as u64;
        if out_w > limit || out_h > limit {
            return Err(TransformError::OutputTooLarge {
                width: out_w,
                height: out_h,
                limit: self.max_output_dimension,
            });
        }
        let (out_w, out_h) = (out_w as u32, out_h as u32);

        let forward = canvas_transform(image.width, image.height, out_w, out_h, params);
        let inverse = forward.inverse().ok_or_else(|| {
            TransformError::InvalidParameters("transform is not invertible".to_string())
        })?;

        debug!(
            "Compositing {}x{} -> {}x{} (scale=({:.3}, {:.3}) shear=({:.3}, {:.3}) rotation={:.2} crop={} filter={:?})",
            image.width,
            image.height,
            out_w,
            out_h,
            params.scale_x(),
            params.scale_y(),
            params.shear_x(),
            params.shear_y(),
            params.rotation(),
            params.crop_enabled(),
            self.filter
        );

        Ok(self.resample(image, &inverse, out_w, out_h))
    }

    fn resample(
        &self,
        image: &RasterImage,
        inverse: &Affine2,
        out_w: u32,
        out_h: u32,
    ) -> RasterImage {
        let mut output = vec![0u8; out_w as usize * out_h as usize * 3];

        for (dst_y, row) in output.chunks_exact_mut(out_w as usize * 3).enumerate() {
            for dst_x in 0..out_w as usize {
                // Pixel centers sit at +0.5 in continuous coordinates.
                let src = inverse.transform_point(Point::new(
                    dst_x as f64 + 0.5,
                    dst_y as f64 + 0.5,
                ));
                let pixel = sample(image, src.x - 0.5, src.y - 0.5, self.filter, self.background);
                row[dst_x * 3..dst_x * 3 + 3].copy_from_slice(&pixel);
            }
        }

        RasterImage {
            width: out_w,
            height: out_h,
            pixels: output,
        }
    }
}

/// Reject parameters that cannot produce an invertible transform.
pub fn validate_parameters(params: &TransformParameters) -> Result<()> {
    let values = [
        ("scale_x", params.scale_x()),
        ("scale_y", params.scale_y()),
        ("shear_x", params.shear_x()),
        ("shear_y", params.shear_y()),
        ("rotation", params.rotation()),
    ];
    if let Some((name, value)) = values.iter().find(|(_, v)| !v.is_finite()) {
        return Err(TransformError::InvalidParameters(format!(
            "{} must be finite, got {}",
            name, value
        )));
    }
    if params.scale_x() <= 0.0 || params.scale_y() <= 0.0 {
        return Err(TransformError::InvalidParameters(format!(
            "scale must be positive, got ({}, {})",
            params.scale_x(),
            params.scale_y()
        )));
    }
    if Affine2::linear_from_parameters(params).inverse().is_none() {
        return Err(TransformError::InvalidParameters(format!(
            "shear ({}, {}) makes the transform singular",
            params.shear_x(),
            params.shear_y()
        )));
    }
    Ok(())
}

/// Output canvas dimensions for `params` applied to a `width` x `height` image.
///
/// With crop enabled this is the source size. Otherwise it is the bounding
/// box of the transformed corners, rounded, at least 1x1.
pub fn output_bounds(width: u32, height: u32, params: &TransformParameters) -> (u64, u64) {
    if params.crop_enabled() {
        return (width as u64, height as u64);
    }

    let linear = Affine2::linear_from_parameters(params);
    let (hw, hh) = (width as f64 / 2.0, height as f64 / 2.0);
    let corners = [
        Point::new(-hw, -hh),
        Point::new(hw, -hh),
        Point::new(-hw, hh),
        Point::new(hw, hh),
    ];

    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for corner in corners {
        let p = linear.transform_point(corner);
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }

    let new_w = ((max_x - min_x).round() as u64).max(1);
    let new_h = ((max_y - min_y).round() as u64).max(1);
    (new_w, new_h)
}

/// Forward map from source pixel space onto the output canvas.
fn canvas_transform(
    src_w: u32,
    src_h: u32,
    dst_w: u32,
    dst_h: u32,
    params: &TransformParameters,
) -> Affine2 {
    Affine2::from_parameters(
        params,
        Point::new(src_w as f64 / 2.0, src_h as f64 / 2.0),
        Point::new(dst_w as f64 / 2.0, dst_h as f64 / 2.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::TransformMode;

    /// Create a test image with a smooth gradient pattern.
    fn test_image(width: u32, height: u32) -> RasterImage {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = ((x + y) * 3) as u8;
                pixels.push(v); // R
                pixels.push(255 - v); // G
                pixels.push(128); // B
            }
        }
        RasterImage::new(width, height, pixels)
    }

    fn params() -> TransformParameters {
        TransformParameters::new(TransformMode::Scale)
    }

    #[test]
    fn test_identity_is_pixel_identical() {
        let img = test_image(37, 21);
        let result = Compositor::default().apply(&img, &params()).unwrap();
        assert_eq!(result, img);

        let mut cropped = params();
        cropped.set_crop_enabled(true);
        let result = Compositor::default().apply(&img, &cropped).unwrap();
        assert_eq!(result, img);
    }

    #[test]
    fn test_identity_resample_path_is_exact() {
        let img = test_image(16, 9);
        let compositor = Compositor::default();
        let inverse = canvas_transform(16, 9, 16, 9, &params()).inverse().unwrap();
        let result = compositor.resample(&img, &inverse, 16, 9);
        assert_eq!(result, img);
    }

    #[test]
    fn test_rotate_90_maps_pixels_clockwise() {
        // A B C
        // D E F
        let img = RasterImage::new(
            3,
            2,
            vec![10, 0, 0, 20, 0, 0, 30, 0, 0, 40, 0, 0, 50, 0, 0, 60, 0, 0],
        );
        let mut p = params();
        p.set_rotation(90.0);
        let result = Compositor::default()
            .with_filter(InterpolationFilter::Nearest)
            .apply(&img, &p)
            .unwrap();

        assert_eq!((result.width, result.height), (2, 3));
        // D A
        // E B
        // F C
        let reds: Vec<u8> = result.pixels.chunks(3).map(|px| px[0]).collect();
        assert_eq!(reds, vec![40, 10, 50, 20, 60, 30]);
    }

    #[test]
    fn test_scale_grows_canvas_without_crop() {
        let img = test_image(10, 20);
        let mut p = params();
        p.set_scale_x(2.0);
        p.set_scale_y(0.5);
        let result = Compositor::default().apply(&img, &p).unwrap();
        assert_eq!((result.width, result.height), (20, 10));
    }

    #[test]
    fn test_crop_keeps_source_size() {
        let img = test_image(30, 20);
        let mut p = params();
        p.set_rotation(30.0);
        p.set_scale_x(2.0);
        p.set_crop_enabled(true);
        let result = Compositor::default().apply(&img, &p).unwrap();
        assert_eq!((result.width, result.height), (30, 20));
    }

    #[test]
    fn test_rotation_fills_corners_with_background() {
        let img = RasterImage::filled(20, 20, [0, 0, 0]);
        let mut p = params();
        p.set_rotation(45.0);
        let compositor = Compositor {
            background: [200, 100, 50],
            ..Compositor::default()
        };
        let result = compositor.apply(&img, &p).unwrap();
        assert!(result.width > 20);
        assert_eq!(result.pixel(0, 0), [200, 100, 50]);
        let c = result.width / 2;
        assert_eq!(result.pixel(c, c), [0, 0, 0]);
    }

    #[test]
    fn test_shear_bounds() {
        let mut p = params();
        p.set_shear_x(0.5);
        // Corners at y = +-10 move +-5 horizontally.
        assert_eq!(output_bounds(40, 20, &p), (50, 20));
    }

    #[test]
    fn test_rotation_bounds_swap_dimensions() {
        let mut p = params();
        p.set_rotation(90.0);
        assert_eq!(output_bounds(100, 50, &p), (50, 100));
        p.set_rotation(180.0);
        assert_eq!(output_bounds(100, 50, &p), (100, 50));
        p.set_rotation(45.0);
        let (w, h) = output_bounds(100, 100, &p);
        assert!(w > 140 && w < 143, "width was {}", w);
        assert!(h > 140 && h < 143, "height was {}", h);
    }

    #[test]
    fn test_rejects_non_positive_scale() {
        let img = test_image(4, 4);
        let mut p = params();
        p.scale_x = 0.0;
        let err = Compositor::default().apply(&img, &p).unwrap_err();
        assert!(matches!(err, TransformError::InvalidParameters(_)));

        p.scale_x = 1.0;
        p.scale_y = -2.0;
        assert!(Compositor::default().apply(&img, &p).is_err());
    }

    #[test]
    fn test_rejects_singular_shear() {
        let mut p = params();
        p.set_shear_x(1.0);
        p.set_shear_y(1.0);
        let err = validate_parameters(&p).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid transform parameters: shear (1, 1) makes the transform singular"
        );
    }

    #[test]
    fn test_rejects_non_finite_parameters() {
        let mut p = params();
        p.rotation = f64::NAN;
        assert!(matches!(
            validate_parameters(&p),
            Err(TransformError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_rejects_invalid_image() {
        let img = RasterImage {
            width: 3,
            height: 3,
            pixels: vec![0; 5],
        };
        assert!(matches!(
            Compositor::default().apply(&img, &params()),
            Err(TransformError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_output_limit() {
        let img = test_image(100, 100);
        let mut p = params();
        p.set_shear_x(1000.0);
        let err = Compositor::default().apply(&img, &p).unwrap_err();
        assert!(matches!(
            err,
            TransformError::OutputTooLarge { limit: 16384, .. }
        ));
    }

    #[test]
    fn test_rotation_round_trip_within_tolerance() {
        let img = test_image(40, 40);
        let compositor = Compositor::default();

        let mut forward = params();
        forward.set_rotation(30.0);
        let rotated = compositor.apply(&img, &forward).unwrap();

        let mut backward = params();
        backward.set_rotation(-30.0);
        let restored = compositor.apply(&rotated, &backward).unwrap();

        // The canvas grew twice; the original sits centered inside it.
        let off_x = (restored.width - img.width) / 2;
        let off_y = (restored.height - img.height) / 2;

        let mut total_err = 0u64;
        let mut max_err = 0u8;
        let mut count = 0u64;
        for y in 8..32 {
            for x in 8..32 {
                let a = img.pixel(x, y);
                let b = restored.pixel(x + off_x, y + off_y);
                for i in 0..3 {
                    let e = a[i].abs_diff(b[i]);
                    total_err += e as u64;
                    max_err = max_err.max(e);
                    count += 1;
                }
            }
        }
        let mean = total_err as f64 / count as f64;
        assert!(max_err <= 8, "max error {}", max_err);
        assert!(mean < 4.0, "mean error {}", mean);
    }

    #[test]
    fn test_apply_is_deterministic() {
        let img = test_image(25, 17);
        let mut p = params();
        p.set_rotation(12.0);
        p.set_shear_y(0.1);
        let compositor = Compositor::default().with_filter(InterpolationFilter::Lanczos3);
        let a = compositor.apply(&img, &p).unwrap();
        let b = compositor.apply(&img, &p).unwrap();
        assert_eq!(a, b);
    }
}
