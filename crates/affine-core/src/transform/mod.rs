//! Affine composition and resampling.
//!
//! # Transform Order
//!
//! Relative to the image center, parameters are applied in this order:
//! 1. Shear (x, y)
//! 2. Rotation
//! 3. Scale (x, y)
//!
//! # Coordinate System
//!
//! - Origin is the top-left corner, y grows downward
//! - Rotation angles are in degrees, positive = clockwise on screen
//! - Pixel centers sit at half-integer positions during resampling

mod affine;
mod compositor;
mod resample;

pub use affine::{Affine2, SINGULAR_EPSILON};
pub use compositor::{output_bounds, validate_parameters, Compositor};
pub use resample::InterpolationFilter;
