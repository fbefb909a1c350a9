//! Affine WASM - WebAssembly bindings for the affine transform engine
//!
//! This crate exposes affine-core to JavaScript/TypeScript hosts.
//!
//! # Module Structure
//!
//! - `types` - WASM-compatible wrappers for images and parameter sets
//! - `engine` - The interactive session (`JsTransformEngine`)
//! - `transform` - One-shot `apply_transform` for export pipelines
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsRasterImage, JsTransformEngine } from '@affine/wasm';
//!
//! await init();
//!
//! const image = new JsRasterImage(width, height, rgbBytes);
//! const engine = new JsTransformEngine(image);
//! engine.set_mode('rotate');
//! engine.auto_rotate_builtin();
//! const result = engine.apply();
//! ```

use wasm_bindgen::prelude::*;

mod engine;
mod transform;
mod types;

pub use engine::{JsEventOutcome, JsTransformEngine};
pub use transform::apply_transform;
pub use types::{JsRasterImage, JsTransformParameters};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    // Fails only if a logger is already installed.
    let _ = console_log::init_with_level(log::Level::Debug);
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
