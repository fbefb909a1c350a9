//! Engine configuration.
//!
//! Every field has a default, so hosts can deserialize a partial object
//! (`{"handle_size": 16}`) and get sensible values for the rest.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TransformError};
use crate::params::TransformMode;
use crate::transform::InterpolationFilter;

/// Upper bound on `max_angle / angle_step` for the deskew search.
pub const MAX_DESKEW_STEPS: f64 = 10_000.0;

/// Which handles invert the shear sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShearSignConvention {
    /// Top and left handles invert the sign, so the dragged edge follows
    /// the pointer on every side.
    #[default]
    OutwardPositive,
    /// Every handle uses the raw pointer offset.
    Uniform,
}

impl ShearSignConvention {
    /// Sign multiplier for a handle on side `side` (-1 top/left, +1 bottom/right).
    pub fn multiplier(self, side: f64) -> f64 {
        match self {
            ShearSignConvention::OutwardPositive => side,
            ShearSignConvention::Uniform => 1.0,
        }
    }
}

/// Settings for the built-in projection-profile skew estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskewConfig {
    /// Largest correction angle searched, in degrees.
    pub max_angle: f64,
    /// Search step, in degrees.
    pub angle_step: f64,
    /// Best/worst profile variance ratio below which no angle is reported.
    pub min_peak_ratio: f64,
    /// Profile variance below which the image counts as featureless.
    pub min_variance: f64,
    /// Images are downsampled so their longer side is at most this many pixels.
    pub max_sample_dimension: u32,
}

impl Default for DeskewConfig {
    fn default() -> Self {
        Self {
            max_angle: 15.0,
            angle_step: 0.25,
            min_peak_ratio: 1.5,
            min_variance: 1.0,
            max_sample_dimension: 512,
        }
    }
}

/// Settings for one attached engine instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Side length of the square handles, in view pixels.
    pub handle_size: f64,
    /// Mode selected when the engine attaches.
    pub default_mode: TransformMode,
    pub shear_sign: ShearSignConvention,
    pub filter: InterpolationFilter,
    /// Fill colour for canvas areas the transformed image does not cover.
    pub background: [u8; 3],
    /// Largest output width or height the compositor will allocate.
    pub max_output_dimension: u32,
    pub deskew: DeskewConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            handle_size: 12.0,
            default_mode: TransformMode::Scale,
            shear_sign: ShearSignConvention::default(),
            filter: InterpolationFilter::default(),
            background: [255, 255, 255],
            max_output_dimension: 16384,
            deskew: DeskewConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Reject values that would make the engine misbehave.
    pub fn validate(&self) -> Result<()> {
        if !(self.handle_size.is_finite() && self.handle_size > 0.0) {
            return Err(TransformError::InvalidConfig(format!(
                "handle_size must be positive, got {}",
                self.handle_size
            )));
        }
        if self.max_output_dimension == 0 {
            return Err(TransformError::InvalidConfig(
                "max_output_dimension must be positive".to_string(),
            ));
        }
        self.deskew.validate()
    }
}

impl DeskewConfig {
    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(TransformError::InvalidConfig(format!(
                    "deskew.{} must be positive, got {}",
                    name, v
                )))
            }
        };
        positive("max_angle", self.max_angle)?;
        positive("angle_step", self.angle_step)?;
        positive("min_peak_ratio", self.min_peak_ratio)?;
        let steps = self.max_angle / self.angle_step;
        if steps > MAX_DESKEW_STEPS {
            return Err(TransformError::InvalidConfig(format!(
                "deskew.angle_step {} is too fine for max_angle {} (more than {} steps)",
                self.angle_step, self.max_angle, MAX_DESKEW_STEPS
            )));
        }
        if !(self.min_variance.is_finite() && self.min_variance >= 0.0) {
            return Err(TransformError::InvalidConfig(format!(
                "deskew.min_variance must be non-negative, got {}",
                self.min_variance
            )));
        }
        if self.max_sample_dimension < 8 {
            return Err(TransformError::InvalidConfig(format!(
                "deskew.max_sample_dimension must be at least 8, got {}",
                self.max_sample_dimension
            )));
        }
        Ok(())
    }
}
