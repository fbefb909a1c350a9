//! WASM-compatible wrapper types.
//!
//! Images cross the boundary as [`JsRasterImage`]; parameter sets cross as
//! plain JS objects deserialized into [`JsTransformParameters`].

use affine_core::{CursorKind, RasterImage, TransformMode, TransformParameters};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// An RGB image wrapper for JavaScript.
///
/// The pixel data lives in WASM memory. `pixels()` copies it into a
/// `Uint8Array`, so keep images on the WASM side between operations.
#[wasm_bindgen]
pub struct JsRasterImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsRasterImage {
    /// Create an image from RGB pixel data (3 bytes per pixel, row-major).
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> JsRasterImage {
        JsRasterImage {
            width,
            height,
            pixels,
        }
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns RGB pixel data as Uint8Array (copied).
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    /// Explicitly free WASM memory.
    pub fn free(self) {}
}

impl JsRasterImage {
    pub(crate) fn from_raster(img: RasterImage) -> Self {
        Self {
            width: img.width,
            height: img.height,
            pixels: img.pixels,
        }
    }

    /// Clones the pixel data.
    pub(crate) fn to_raster(&self) -> RasterImage {
        RasterImage {
            width: self.width,
            height: self.height,
            pixels: self.pixels.clone(),
        }
    }
}

/// Transform parameters as seen from JavaScript.
///
/// Missing fields take their identity value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsTransformParameters {
    pub scale_x: f64,
    pub scale_y: f64,
    pub shear_x: f64,
    pub shear_y: f64,
    /// Degrees, positive = clockwise.
    pub rotation: f64,
    pub crop_enabled: bool,
    pub mode: TransformMode,
}

impl Default for JsTransformParameters {
    fn default() -> Self {
        Self::from(&TransformParameters::default())
    }
}

impl From<&TransformParameters> for JsTransformParameters {
    fn from(params: &TransformParameters) -> Self {
        Self {
            scale_x: params.scale_x(),
            scale_y: params.scale_y(),
            shear_x: params.shear_x(),
            shear_y: params.shear_y(),
            rotation: params.rotation(),
            crop_enabled: params.crop_enabled(),
            mode: params.mode(),
        }
    }
}

impl JsTransformParameters {
    /// Convert to core parameters, rejecting values the setters would
    /// otherwise clamp or ignore.
    pub(crate) fn to_core(&self) -> Result<TransformParameters, String> {
        let numeric = [
            ("scale_x", self.scale_x),
            ("scale_y", self.scale_y),
            ("shear_x", self.shear_x),
            ("shear_y", self.shear_y),
            ("rotation", self.rotation),
        ];
        if let Some((name, value)) = numeric.iter().find(|(_, v)| !v.is_finite()) {
            return Err(format!("{} must be finite, got {}", name, value));
        }
        if self.scale_x <= 0.0 || self.scale_y <= 0.0 {
            return Err(format!(
                "scale must be positive, got ({}, {})",
                self.scale_x, self.scale_y
            ));
        }

        let mut params = TransformParameters::new(self.mode);
        params.set_scale_x(self.scale_x);
        params.set_scale_y(self.scale_y);
        params.set_shear_x(self.shear_x);
        params.set_shear_y(self.shear_y);
        params.set_rotation(self.rotation);
        params.set_crop_enabled(self.crop_enabled);
        Ok(params)
    }
}

/// Parse a mode name as used in the toolbar ("scale", "rotate", "shear", "pan").
pub(crate) fn mode_from_str(value: &str) -> Option<TransformMode> {
    match value.to_ascii_lowercase().as_str() {
        "scale" => Some(TransformMode::Scale),
        "rotate" => Some(TransformMode::Rotate),
        "shear" => Some(TransformMode::Shear),
        "pan" => Some(TransformMode::Pan),
        _ => None,
    }
}

pub(crate) fn mode_name(mode: TransformMode) -> &'static str {
    match mode {
        TransformMode::Scale => "scale",
        TransformMode::Rotate => "rotate",
        TransformMode::Shear => "shear",
        TransformMode::Pan => "pan",
    }
}

/// CSS `cursor` value for a cursor kind.
pub(crate) fn css_cursor(kind: CursorKind) -> &'static str {
    match kind {
        CursorKind::Default => "default",
        CursorKind::DiagonalNwSe => "nwse-resize",
        CursorKind::DiagonalNeSw => "nesw-resize",
        CursorKind::Horizontal => "ew-resize",
        CursorKind::Vertical => "ns-resize",
        CursorKind::Rotate => "crosshair",
        CursorKind::Pan => "grab",
    }
}
