//! Error types for the transform engine.
//!
//! Interactive edits (dragging, numeric fields) never fail: out-of-range
//! values are clamped or normalized instead. Only the compositor, the skew
//! estimator and engine construction have real failure outcomes.

use thiserror::Error;

/// Errors reported by the compositor, the deskew path and engine setup.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransformError {
    /// The parameters describe a degenerate or non-invertible transform.
    #[error("Invalid transform parameters: {0}")]
    InvalidParameters(String),

    /// The skew estimator could not find a dominant orientation.
    #[error("Skew estimation failed: {0}")]
    EstimationFailed(String),

    /// The pixel buffer does not describe a usable image.
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// The transformed canvas would exceed the configured size limit.
    #[error("Output canvas {width}x{height} exceeds the {limit}px limit")]
    OutputTooLarge { width: u64, height: u64, limit: u32 },

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An automatic rotation estimate is already in flight.
    #[error("An automatic rotation estimate is already pending")]
    DeskewPending,

    /// Automatic rotation was requested while a handle drag is active.
    #[error("Automatic rotation is unavailable while a drag is in progress")]
    DragInProgress,
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TransformError>;
