//! One-shot transform bindings.
//!
//! For export pipelines that already hold a parameter set and do not need
//! an interactive session.

use affine_core::{Compositor, InterpolationFilter};
use wasm_bindgen::prelude::*;

use crate::types::{JsRasterImage, JsTransformParameters};

/// Apply scale, shear and rotation to an image.
///
/// # Arguments
///
/// * `image` - Source image
/// * `parameters` - Object with `scale_x`, `scale_y`, `shear_x`, `shear_y`,
///   `rotation` (degrees, clockwise) and `crop_enabled`; missing fields
///   default to identity
/// * `use_lanczos` - Use the Lanczos3 filter (slower), otherwise bilinear
///
/// # Example (TypeScript)
///
/// ```typescript
/// const straightened = apply_transform(image, { rotation: -2.5, crop_enabled: true }, true);
/// ```
#[wasm_bindgen]
pub fn apply_transform(
    image: &JsRasterImage,
    parameters: JsValue,
    use_lanczos: bool,
) -> Result<JsRasterImage, JsValue> {
    let parameters: JsTransformParameters = serde_wasm_bindgen::from_value(parameters)
        .map_err(|e| JsValue::from_str(&format!("Invalid transform parameters: {}", e)))?;
    transform_image(image, &parameters, use_lanczos).map_err(|e| JsValue::from_str(&e))
}

fn transform_image(
    image: &JsRasterImage,
    parameters: &JsTransformParameters,
    use_lanczos: bool,
) -> Result<JsRasterImage, String> {
    let params = parameters.to_core()?;
    let filter = if use_lanczos {
        InterpolationFilter::Lanczos3
    } else {
        InterpolationFilter::Bilinear
    };
    Compositor::default()
        .with_filter(filter)
        .apply(&image.to_raster(), &params)
        .map(JsRasterImage::from_raster)
        .map_err(|e| e.to_string())
}
