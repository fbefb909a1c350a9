//! Transform parameter model.
//!
//! Scale, shear and rotation are stored independently; which of them an
//! interactive drag touches depends on the active [`TransformMode`]. All
//! setters are infallible: scale is clamped to [`MIN_SCALE`], rotation is
//! normalized into (-180, 180] and non-finite input is ignored.

use serde::{Deserialize, Serialize};

/// Smallest scale factor the parameter model will hold.
pub const MIN_SCALE: f64 = 0.01;

/// Interaction mode selected in the host toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformMode {
    #[default]
    Scale,
    Rotate,
    Shear,
    /// Handles are inert; pointer drags pan the host view.
    Pan,
}

/// A single numeric-field edit coming from the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum ParameterChange {
    ScaleX(f64),
    ScaleY(f64),
    ShearX(f64),
    ShearY(f64),
    Rotation(f64),
    Crop(bool),
}

impl ParameterChange {
    /// True for edits that overwrite the rotation angle.
    pub fn touches_rotation(&self) -> bool {
        matches!(self, ParameterChange::Rotation(_))
    }
}

/// Affine transform parameters for the attached image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformParameters {
    pub(crate) scale_x: f64,
    pub(crate) scale_y: f64,
    pub(crate) shear_x: f64,
    pub(crate) shear_y: f64,
    /// Degrees, positive = clockwise on screen.
    pub(crate) rotation: f64,
    pub(crate) crop_enabled: bool,
    pub(crate) mode: TransformMode,
}

impl Default for TransformParameters {
    fn default() -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
            shear_x: 0.0,
            shear_y: 0.0,
            rotation: 0.0,
            crop_enabled: false,
            mode: TransformMode::default(),
        }
    }
}

impl TransformParameters {
    /// Identity parameters in the given mode.
    pub fn new(mode: TransformMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn scale_x(&self) -> f64 {
        self.scale_x
    }

    pub fn scale_y(&self) -> f64 {
        self.scale_y
    }

    pub fn shear_x(&self) -> f64 {
        self.shear_x
    }

    pub fn shear_y(&self) -> f64 {
        self.shear_y
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn crop_enabled(&self) -> bool {
        self.crop_enabled
    }

    pub fn mode(&self) -> TransformMode {
        self.mode
    }

    pub fn set_scale_x(&mut self, value: f64) {
        if value.is_finite() {
            self.scale_x = value.max(MIN_SCALE);
        }
    }

    pub fn set_scale_y(&mut self, value: f64) {
        if value.is_finite() {
            self.scale_y = value.max(MIN_SCALE);
        }
    }

    pub fn set_shear_x(&mut self, value: f64) {
        if value.is_finite() {
            self.shear_x = value;
        }
    }

    pub fn set_shear_y(&mut self, value: f64) {
        if value.is_finite() {
            self.shear_y = value;
        }
    }

    pub fn set_rotation(&mut self, degrees: f64) {
        if degrees.is_finite() {
            self.rotation = normalize_degrees(degrees);
        }
    }

    pub fn set_crop_enabled(&mut self, enabled: bool) {
        self.crop_enabled = enabled;
    }

    pub fn set_mode(&mut self, mode: TransformMode) {
        self.mode = mode;
    }

    /// Apply a numeric-field edit.
    pub fn apply_change(&mut self, change: ParameterChange) {
        match change {
            ParameterChange::ScaleX(v) => self.set_scale_x(v),
            ParameterChange::ScaleY(v) => self.set_scale_y(v),
            ParameterChange::ShearX(v) => self.set_shear_x(v),
            ParameterChange::ShearY(v) => self.set_shear_y(v),
            ParameterChange::Rotation(v) => self.set_rotation(v),
            ParameterChange::Crop(enabled) => self.set_crop_enabled(enabled),
        }
    }

    /// Reset scale, shear and rotation to identity. Crop flag and mode stay.
    pub fn reset_geometry(&mut self) {
        *self = Self {
            crop_enabled: self.crop_enabled,
            mode: self.mode,
            ..Self::default()
        };
    }

    /// Check if applying these parameters would leave the image untouched.
    pub fn is_identity(&self) -> bool {
        self.scale_x == 1.0
            && self.scale_y == 1.0
            && self.shear_x == 0.0
            && self.shear_y == 0.0
            && self.rotation == 0.0
    }
}

/// Normalize an angle in degrees into (-180, 180].
pub fn normalize_degrees(degrees: f64) -> f64 {
    let r = degrees % 360.0;
    if r <= -180.0 {
        r + 360.0
    } else if r > 180.0 {
        r - 360.0
    } else {
        r
    }
}
