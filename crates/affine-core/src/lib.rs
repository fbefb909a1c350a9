//! Affine Core - interactive affine transform engine
//!
//! This crate turns pointer drags on eight resize handles into scale, shear
//! and rotation parameters, estimates skew for automatic straightening, and
//! bakes the final transform into new pixel data.
//!
//! The typical flow is [`attach`] an image, feed [`EngineEvent`]s from the
//! host, render [`TransformEngine::preview`], then [`detach`] with
//! [`DetachAction::Apply`] or [`DetachAction::Cancel`].

pub mod config;
pub mod deskew;
pub mod drag;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod interaction;
pub mod params;
pub mod raster;
pub mod transform;

pub use config::{DeskewConfig, EngineConfig, ShearSignConvention};
pub use deskew::{AutoDeskew, DeskewOutcome, DeskewTicket, ProjectionProfileEstimator, SkewEstimator};
pub use drag::DragInterpreter;
pub use engine::{attach, detach, DetachAction, Detached, EngineEvent, EventOutcome, TransformEngine};
pub use error::{Result, TransformError};
pub use geometry::{Point, Rect, Size};
pub use interaction::{CursorKind, DragSnapshot, Handle, HandleRect, InteractionGeometry};
pub use params::{normalize_degrees, ParameterChange, TransformMode, TransformParameters, MIN_SCALE};
pub use raster::RasterImage;
pub use transform::{Affine2, Compositor, InterpolationFilter};
