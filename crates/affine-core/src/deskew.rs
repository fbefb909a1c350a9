//! Automatic rotation (deskew).
//!
//! Angle estimation is delegated to a [`SkewEstimator`]. Hosts with large
//! images may run the estimator on a worker; [`AutoDeskew`] tracks the
//! request so that a result arriving after a manual rotation edit, or after
//! a newer request, is dropped instead of overwriting the user's value.
//!
//! ```text
//! request() ──► ticket ──► (estimator runs) ──► complete(ticket, angle)
//!                  │                                  │
//!   manual edit ───┴── invalidates ──────────────►  Discarded
//! ```
//!
//! The crate also ships [`ProjectionProfileEstimator`], a projection-profile
//! estimator for documents and other images with dominant straight lines.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::DeskewConfig;
use crate::error::{Result, TransformError};
use crate::params::TransformParameters;
use crate::raster::RasterImage;

/// Estimates the rotation that straightens an image.
///
/// The returned angle uses the engine convention: degrees, positive =
/// clockwise on screen, and is the rotation to apply (not the tilt found).
pub trait SkewEstimator {
    fn estimate_skew(&self, image: &RasterImage) -> Result<f64>;
}

impl<F> SkewEstimator for F
where
    F: Fn(&RasterImage) -> Result<f64>,
{
    fn estimate_skew(&self, image: &RasterImage) -> Result<f64> {
        self(image)
    }
}

/// Identifies one estimate request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeskewTicket(u64);

impl DeskewTicket {
    pub fn id(&self) -> u64 {
        self.0
    }

    pub fn from_id(id: u64) -> Self {
        Self(id)
    }
}

/// What happened to a completed estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeskewOutcome {
    /// The (normalized) angle was written to the rotation parameter.
    Applied(f64),
    /// The estimate was stale and has been dropped.
    Discarded,
}

/// Request bookkeeping for automatic rotation.
#[derive(Debug, Default, Clone)]
pub struct AutoDeskew {
    /// Bumped by every request and every invalidation.
    generation: u64,
    pending: Option<DeskewTicket>,
}

impl AutoDeskew {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<DeskewTicket> {
        self.pending
    }

    /// Issue a new request. Fails if one is already in flight.
    pub fn request(&mut self) -> Result<DeskewTicket> {
        if self.pending.is_some() {
            return Err(TransformError::DeskewPending);
        }
        self.generation += 1;
        let ticket = DeskewTicket(self.generation);
        self.pending = Some(ticket);
        debug!("Deskew request {} issued", ticket.0);
        Ok(ticket)
    }

    /// Make any pending estimate stale (manual rotation edit, reset or
    /// cancel).
    pub fn invalidate(&mut self) {
        if let Some(ticket) = self.pending.take() {
            self.generation += 1;
            debug!("Deskew request {} invalidated", ticket.0);
        }
    }

    /// Deliver an estimator result.
    ///
    /// Only the rotation parameter is touched, and only when `ticket` is the
    /// live request. A failure of the live request clears it and is
    /// reported as [`TransformError::EstimationFailed`].
    pub fn complete(
        &mut self,
        ticket: DeskewTicket,
        result: Result<f64>,
        params: &mut TransformParameters,
    ) -> Result<DeskewOutcome> {
        if self.pending != Some(ticket) {
            warn!(
                "Discarding stale deskew estimate {} (current generation {})",
                ticket.0, self.generation
            );
            return Ok(DeskewOutcome::Discarded);
        }
        self.pending = None;

        let angle = match result {
            Ok(angle) if angle.is_finite() => angle,
            Ok(angle) => {
                warn!("Deskew estimator returned non-finite angle {}", angle);
                return Err(TransformError::EstimationFailed(format!(
                    "estimator returned {}",
                    angle
                )));
            }
            Err(TransformError::EstimationFailed(msg)) => {
                warn!("Deskew estimation failed: {}", msg);
                return Err(TransformError::EstimationFailed(msg));
            }
            Err(other) => {
                warn!("Deskew estimation failed: {}", other);
                return Err(TransformError::EstimationFailed(other.to_string()));
            }
        };

        params.set_rotation(angle);
        debug!(
            "Deskew request {} applied rotation {:.2}",
            ticket.0,
            params.rotation()
        );
        Ok(DeskewOutcome::Applied(params.rotation()))
    }

    /// Estimate synchronously and write the angle.
    pub fn run(
        &mut self,
        estimator: &dyn SkewEstimator,
        image: &RasterImage,
        params: &mut TransformParameters,
    ) -> Result<f64> {
        let ticket = self.request()?;
        let result = estimator.estimate_skew(image);
        match self.complete(ticket, result, params)? {
            DeskewOutcome::Applied(angle) => Ok(angle),
            // Cannot be invalidated between request and complete here.
            DeskewOutcome::Discarded => Ok(params.rotation()),
        }
    }
}

/// Projection-profile skew estimator.
///
/// For every candidate angle the pixels inside the inscribed circle are
/// projected onto the rotated vertical axis, and the variance of the
/// per-row mean darkness is measured. Rows of text or other straight
/// features give a sharply peaked profile when the candidate angle undoes
/// the tilt.
#[derive(Debug, Clone, Default)]
pub struct ProjectionProfileEstimator {
    config: DeskewConfig,
}

impl ProjectionProfileEstimator {
    pub fn new(config: DeskewConfig) -> Self {
        Self { config }
    }

    /// Grayscale darkness samples (dx, dy, darkness) relative to the center,
    /// restricted to the inscribed circle, and that circle's radius.
    fn samples(&self, image: &RasterImage) -> Result<(Vec<(f64, f64, f64)>, f64)> {
        let rgb = image
            .to_rgb_image()
            .ok_or_else(|| TransformError::InvalidImage("pixel buffer mismatch".to_string()))?;
        let mut gray = image::DynamicImage::ImageRgb8(rgb).to_luma8();

        let longest = gray.width().max(gray.height());
        let limit = self.config.max_sample_dimension;
        if longest > limit {
            let factor = limit as f64 / longest as f64;
            let w = ((gray.width() as f64 * factor).round() as u32).max(1);
            let h = ((gray.height() as f64 * factor).round() as u32).max(1);
            gray = image::imageops::resize(&gray, w, h, image::imageops::FilterType::Triangle);
        }

        let (w, h) = gray.dimensions();
        let (cx, cy) = (w as f64 / 2.0, h as f64 / 2.0);
        let radius = cx.min(cy);
        let r2 = radius * radius;

        let samples = gray
            .enumerate_pixels()
            .filter_map(|(x, y, luma)| {
                let dx = x as f64 + 0.5 - cx;
                let dy = y as f64 + 0.5 - cy;
                (dx * dx + dy * dy <= r2).then(|| (dx, dy, 255.0 - luma.0[0] as f64))
            })
            .collect();
        Ok((samples, radius))
    }
}

/// Variance of per-row mean darkness after rotating samples by `degrees`.
fn profile_variance(samples: &[(f64, f64, f64)], radius: f64, degrees: f64) -> f64 {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let bins = (2.0 * radius).ceil() as usize + 1;
    let mut sums = vec![0.0f64; bins];
    let mut counts = vec![0u32; bins];

    for &(dx, dy, dark) in samples {
        let row = dx * sin + dy * cos + radius;
        let bin = (row.round().max(0.0) as usize).min(bins - 1);
        sums[bin] += dark;
        counts[bin] += 1;
    }

    let means: Vec<f64> = sums
        .iter()
        .zip(counts.iter())
        .filter(|(_, &c)| c > 0)
        .map(|(&s, &c)| s / c as f64)
        .collect();
    if means.is_empty() {
        return 0.0;
    }
    let mean = means.iter().sum::<f64>() / means.len() as f64;
    means.iter().map(|m| (m - mean).powi(2)).sum::<f64>() / means.len() as f64
}

impl SkewEstimator for ProjectionProfileEstimator {
    fn estimate_skew(&self, image: &RasterImage) -> Result<f64> {
        image.validate()?;
        self.config.validate()?;

        let (samples, radius) = self.samples(image)?;
        if samples.len() < 4 {
            return Err(TransformError::EstimationFailed(
                "image too small to estimate skew".to_string(),
            ));
        }

        let steps = (self.config.max_angle / self.config.angle_step).round() as i64;
        let mut best = (0.0f64, f64::NEG_INFINITY);
        let mut worst = f64::INFINITY;
        for k in -steps..=steps {
            let angle = k as f64 * self.config.angle_step;
            let variance = profile_variance(&samples, radius, angle);
            if variance > best.1 {
                best = (angle, variance);
            }
            worst = worst.min(variance);
        }

        let (angle, variance) = best;
        if variance < self.config.min_variance {
            return Err(TransformError::EstimationFailed(format!(
                "no dominant orientation (profile variance {:.3})",
                variance
            )));
        }
        if worst > 0.0 && variance / worst < self.config.min_peak_ratio {
            return Err(TransformError::EstimationFailed(format!(
                "orientation is ambiguous (peak ratio {:.3})",
                variance / worst
            )));
        }
        debug!(
            "Projection profile estimate {:.2} deg (variance {:.1}, samples {})",
            angle,
            variance,
            samples.len()
        );
        Ok(angle)
    }
}
