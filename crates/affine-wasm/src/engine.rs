//! WASM bindings for the interactive transform engine.
//!
//! A `JsTransformEngine` is one attached session. Pointer and numeric-field
//! events return a [`JsEventOutcome`]; the host re-renders `preview()` on
//! `ParametersUpdated` and finishes with `apply()` or `cancel()`.
//!
//! # Example (TypeScript)
//!
//! ```typescript
//! const engine = new JsTransformEngine(image, { handle_size: 10 });
//! engine.set_image_rect(rect.x, rect.y, rect.width, rect.height);
//!
//! canvas.onpointerdown = (e) => engine.pointer_down(e.offsetX, e.offsetY);
//! canvas.onpointermove = (e) => {
//!   canvas.style.cursor = engine.cursor_at(e.offsetX, e.offsetY);
//!   if (engine.pointer_move(e.offsetX, e.offsetY) === JsEventOutcome.ParametersUpdated) {
//!     draw(engine.preview());
//!   }
//! };
//! ```

use affine_core::{
    DeskewOutcome, DeskewTicket, DetachAction, Detached, EngineConfig, EngineEvent,
    EventOutcome, ParameterChange, Point, RasterImage, Rect, TransformEngine, TransformError,
};
use wasm_bindgen::prelude::*;

use crate::types::{css_cursor, mode_from_str, mode_name, JsRasterImage, JsTransformParameters};

/// Event outcome as a plain JS enum.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsEventOutcome {
    Ignored = 0,
    DragStarted = 1,
    ParametersUpdated = 2,
    DragEnded = 3,
    PanDelegated = 4,
    Locked = 5,
    GeometryUpdated = 6,
}

impl From<EventOutcome> for JsEventOutcome {
    fn from(outcome: EventOutcome) -> Self {
        match outcome {
            EventOutcome::Ignored => JsEventOutcome::Ignored,
            EventOutcome::DragStarted(_) => JsEventOutcome::DragStarted,
            EventOutcome::ParametersUpdated => JsEventOutcome::ParametersUpdated,
            EventOutcome::DragEnded => JsEventOutcome::DragEnded,
            EventOutcome::PanDelegated => JsEventOutcome::PanDelegated,
            EventOutcome::Locked => JsEventOutcome::Locked,
            EventOutcome::GeometryUpdated => JsEventOutcome::GeometryUpdated,
        }
    }
}

fn to_js_error(err: TransformError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Interactive transform session for JavaScript.
#[wasm_bindgen]
pub struct JsTransformEngine {
    inner: TransformEngine,
}

#[wasm_bindgen]
impl JsTransformEngine {
    /// Attach to `image`. `config` is an optional partial `EngineConfig`
    /// object; missing fields use their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(image: &JsRasterImage, config: JsValue) -> Result<JsTransformEngine, JsValue> {
        let config: EngineConfig = if config.is_undefined() || config.is_null() {
            EngineConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid engine config: {}", e)))?
        };
        Self::with_config(image, config).map_err(to_js_error)
    }

    /// Lay the image out at a new view rectangle.
    pub fn set_image_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> JsEventOutcome {
        self.send(EngineEvent::ImageRectChanged(Rect::new(x, y, width, height)))
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) -> JsEventOutcome {
        self.send(EngineEvent::PointerDown {
            point: Point::new(x, y),
        })
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) -> JsEventOutcome {
        self.send(EngineEvent::PointerMove {
            point: Point::new(x, y),
        })
    }

    pub fn pointer_up(&mut self) -> JsEventOutcome {
        self.send(EngineEvent::PointerUp)
    }

    /// Index of the handle being dragged (0-7), if any.
    #[wasm_bindgen(getter)]
    pub fn active_handle(&self) -> Option<u8> {
        self.inner.active_handle().map(|handle| handle.index() as u8)
    }

    /// Select "scale", "rotate", "shear" or "pan".
    pub fn set_mode(&mut self, mode: &str) -> Result<JsEventOutcome, JsValue> {
        let mode = mode_from_str(mode)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown transform mode: {}", mode)))?;
        Ok(self.send(EngineEvent::ModeSelected(mode)))
    }

    #[wasm_bindgen(getter)]
    pub fn mode(&self) -> String {
        mode_name(self.inner.parameters().mode()).to_string()
    }

    pub fn set_scale_x(&mut self, value: f64) -> JsEventOutcome {
        self.send(EngineEvent::ParameterChanged(ParameterChange::ScaleX(value)))
    }

    pub fn set_scale_y(&mut self, value: f64) -> JsEventOutcome {
        self.send(EngineEvent::ParameterChanged(ParameterChange::ScaleY(value)))
    }

    pub fn set_shear_x(&mut self, value: f64) -> JsEventOutcome {
        self.send(EngineEvent::ParameterChanged(ParameterChange::ShearX(value)))
    }

    pub fn set_shear_y(&mut self, value: f64) -> JsEventOutcome {
        self.send(EngineEvent::ParameterChanged(ParameterChange::ShearY(value)))
    }

    /// Degrees, positive = clockwise.
    pub fn set_rotation(&mut self, degrees: f64) -> JsEventOutcome {
        self.send(EngineEvent::ParameterChanged(ParameterChange::Rotation(degrees)))
    }

    pub fn set_crop_enabled(&mut self, enabled: bool) -> JsEventOutcome {
        self.send(EngineEvent::ParameterChanged(ParameterChange::Crop(enabled)))
    }

    /// CSS cursor name for the pointer at (x, y).
    pub fn cursor_at(&self, x: f64, y: f64) -> String {
        css_cursor(self.inner.cursor_at(Point::new(x, y))).to_string()
    }

    /// Current parameters as a plain object.
    pub fn parameters(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&JsTransformParameters::from(self.inner.parameters()))
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// The eight handle rectangles with their cursors, in index order.
    pub fn handles(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.geometry().handle_rects())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }

    /// Straighten using a JS estimator `(image: JsRasterImage) => number`.
    ///
    /// The function returns the correction angle in degrees; throwing or
    /// returning a non-number leaves the rotation unchanged.
    pub fn auto_rotate(&mut self, estimator: &js_sys::Function) -> Result<f64, JsValue> {
        let estimate = |image: &RasterImage| -> affine_core::Result<f64> {
            let arg = JsValue::from(JsRasterImage::from_raster(image.clone()));
            let value = estimator
                .call1(&JsValue::NULL, &arg)
                .map_err(|e| TransformError::EstimationFailed(format!("{:?}", e)))?;
            value.as_f64().ok_or_else(|| {
                TransformError::EstimationFailed("estimator did not return a number".to_string())
            })
        };
        self.inner.auto_rotate(&estimate).map_err(to_js_error)
    }

    /// Straighten with the built-in projection-profile estimator.
    pub fn auto_rotate_builtin(&mut self) -> Result<f64, JsValue> {
        self.inner.auto_rotate_builtin().map_err(to_js_error)
    }

    /// Start a worker-based estimate. Drags are locked until the returned
    /// ticket is completed or the request is canceled.
    pub fn request_auto_rotate(&mut self) -> Result<f64, JsValue> {
        self.request_ticket().map_err(to_js_error)
    }

    /// Deliver a worker estimate. Pass `undefined` when estimation failed.
    ///
    /// Returns true if the angle was applied, false if it was stale.
    pub fn complete_auto_rotate(&mut self, ticket: f64, angle: Option<f64>) -> Result<bool, JsValue> {
        self.complete_ticket(ticket, angle).map_err(to_js_error)
    }

    pub fn cancel_auto_rotate(&mut self) {
        self.inner.cancel_auto_rotate();
    }

    #[wasm_bindgen(getter)]
    pub fn auto_rotate_pending(&self) -> bool {
        self.inner.is_auto_rotate_pending()
    }

    /// Render the current transform (bilinear by default).
    pub fn preview(&self) -> Result<JsRasterImage, JsValue> {
        self.inner
            .preview()
            .map(JsRasterImage::from_raster)
            .map_err(to_js_error)
    }

    /// Bake the transform and end the session.
    pub fn apply(self) -> Result<JsRasterImage, JsValue> {
        match self.inner.detach(DetachAction::Apply).map_err(to_js_error)? {
            Detached::Applied(image) => Ok(JsRasterImage::from_raster(image)),
            Detached::Canceled => Err(JsValue::from_str("transform was canceled")),
        }
    }

    /// Discard the transform and end the session.
    pub fn cancel(self) {
        // Cancel never fails.
        let _ = self.inner.detach(DetachAction::Cancel);
    }
}

impl JsTransformEngine {
    pub(crate) fn with_config(
        image: &JsRasterImage,
        config: EngineConfig,
    ) -> affine_core::Result<Self> {
        Ok(Self {
            inner: TransformEngine::attach(image.to_raster(), config)?,
        })
    }

    fn send(&mut self, event: EngineEvent) -> JsEventOutcome {
        self.inner.handle_event(event).into()
    }

    fn request_ticket(&mut self) -> affine_core::Result<f64> {
        self.inner
            .request_auto_rotate()
            .map(|ticket| ticket.id() as f64)
    }

    fn complete_ticket(&mut self, ticket: f64, angle: Option<f64>) -> affine_core::Result<bool> {
        let result = angle.ok_or_else(|| {
            TransformError::EstimationFailed("worker reported no angle".to_string())
        });
        let outcome = self
            .inner
            .complete_auto_rotate(DeskewTicket::from_id(ticket as u64), result)?;
        Ok(matches!(outcome, DeskewOutcome::Applied(_)))
    }
}
