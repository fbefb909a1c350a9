//! The attached transform engine.
//!
//! A [`TransformEngine`] owns one source image for the duration of an edit
//! session. The host forwards pointer, resize and numeric-field events via
//! [`TransformEngine::handle_event`], renders [`TransformEngine::preview`]
//! and ends the session with [`detach`], either baking the transform into
//! new pixels or discarding it.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::deskew::{
    AutoDeskew, DeskewOutcome, DeskewTicket, ProjectionProfileEstimator, SkewEstimator,
};
use crate::drag::DragInterpreter;
use crate::error::{Result, TransformError};
use crate::geometry::{Point, Rect};
use crate::interaction::{CursorKind, Handle, InteractionGeometry};
use crate::params::{ParameterChange, TransformMode, TransformParameters};
use crate::raster::RasterImage;
use crate::transform::Compositor;

/// Input from the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EngineEvent {
    /// The image was laid out at a new position or size in the view.
    ImageRectChanged(Rect),
    PointerDown { point: Point },
    PointerMove { point: Point },
    PointerUp,
    ParameterChanged(ParameterChange),
    ModeSelected(TransformMode),
}

/// What the engine did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOutcome {
    Ignored,
    DragStarted(Handle),
    ParametersUpdated,
    DragEnded,
    /// Pan mode: the host should scroll its view.
    PanDelegated,
    /// An automatic rotation estimate is pending; drags are refused.
    Locked,
    GeometryUpdated,
}

/// How to end a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetachAction {
    Apply,
    Cancel,
}

/// Result of [`detach`].
#[derive(Debug, Clone, PartialEq)]
pub enum Detached {
    /// The transformed image, ready to replace the original.
    Applied(RasterImage),
    /// The original image is untouched.
    Canceled,
}

/// Interactive transform session for one image.
#[derive(Debug, Clone)]
pub struct TransformEngine {
    image: RasterImage,
    config: EngineConfig,
    params: TransformParameters,
    geometry: InteractionGeometry,
    drag: DragInterpreter,
    deskew: AutoDeskew,
    compositor: Compositor,
}

/// Start a session on `image`.
pub fn attach(image: RasterImage, config: EngineConfig) -> Result<TransformEngine> {
    TransformEngine::attach(image, config)
}

/// End a session.
pub fn detach(engine: TransformEngine, action: DetachAction) -> Result<Detached> {
    engine.detach(action)
}

impl TransformEngine {
    /// Validate `config` and `image` and start with identity parameters.
    ///
    /// The image rectangle initially matches the pixel size at the origin;
    /// hosts send [`EngineEvent::ImageRectChanged`] once laid out.
    pub fn attach(image: RasterImage, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        image.validate()?;

        let rect = Rect::new(0.0, 0.0, image.width as f64, image.height as f64);
        debug!(
            "Attached to {}x{} image in {:?} mode",
            image.width, image.height, config.default_mode
        );
        Ok(Self {
            geometry: InteractionGeometry::new(rect, config.handle_size),
            params: TransformParameters::new(config.default_mode),
            drag: DragInterpreter::new(config.shear_sign),
            deskew: AutoDeskew::new(),
            compositor: Compositor::from_config(&config),
            image,
            config,
        })
    }

    pub fn handle_event(&mut self, event: EngineEvent) -> EventOutcome {
        match event {
            EngineEvent::ImageRectChanged(rect) => {
                self.geometry.update_rects(rect);
                EventOutcome::GeometryUpdated
            }
            EngineEvent::PointerDown { point } => self.pointer_down(point),
            EngineEvent::PointerMove { point } => self.pointer_move(point),
            EngineEvent::PointerUp => match self.drag.end() {
                Some(_) => EventOutcome::DragEnded,
                None => EventOutcome::Ignored,
            },
            EngineEvent::ParameterChanged(change) => {
                if change.touches_rotation() {
                    self.deskew.invalidate();
                }
                self.params.apply_change(change);
                EventOutcome::ParametersUpdated
            }
            EngineEvent::ModeSelected(mode) => {
                if mode == self.params.mode() {
                    return EventOutcome::Ignored;
                }
                debug!("Mode changed {:?} -> {:?}", self.params.mode(), mode);
                self.params.set_mode(mode);
                EventOutcome::ParametersUpdated
            }
        }
    }

    fn pointer_down(&mut self, point: Point) -> EventOutcome {
        if self.deskew.is_pending() {
            debug!("Pointer down refused while automatic rotation is pending");
            return EventOutcome::Locked;
        }
        if self.params.mode() == TransformMode::Pan {
            return EventOutcome::PanDelegated;
        }
        let Some(handle) = self.geometry.hit_test(point) else {
            return EventOutcome::Ignored;
        };
        let snapshot = self.geometry.capture_initial(handle);
        if self.drag.begin(snapshot, &self.params) {
            EventOutcome::DragStarted(handle)
        } else {
            EventOutcome::Ignored
        }
    }

    fn pointer_move(&mut self, point: Point) -> EventOutcome {
        if !self.drag.update(point, &mut self.params) {
            return EventOutcome::Ignored;
        }
        if self.drag.active_mode() == Some(TransformMode::Rotate) {
            self.deskew.invalidate();
        }
        EventOutcome::ParametersUpdated
    }

    pub fn parameters(&self) -> &TransformParameters {
        &self.params
    }

    pub fn geometry(&self) -> &InteractionGeometry {
        &self.geometry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn image(&self) -> &RasterImage {
        &self.image
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// Handle of the drag in progress.
    pub fn active_handle(&self) -> Option<Handle> {
        self.drag.snapshot().map(|snapshot| snapshot.handle)
    }

    pub fn is_auto_rotate_pending(&self) -> bool {
        self.deskew.is_pending()
    }

    /// Cursor to show with the pointer at `point`.
    pub fn cursor_at(&self, point: Point) -> CursorKind {
        let mode = self.params.mode();
        if mode == TransformMode::Pan {
            return CursorKind::Pan;
        }
        match self.geometry.hit_test(point) {
            Some(_) if mode == TransformMode::Rotate => CursorKind::Rotate,
            Some(handle) => InteractionGeometry::cursor_for(handle),
            None => CursorKind::Default,
        }
    }

    /// Back to identity. Mode and crop flag stay; a pending estimate is
    /// invalidated.
    pub fn reset(&mut self) {
        self.drag.end();
        self.deskew.invalidate();
        self.params.reset_geometry();
        debug!("Transform reset");
    }

    /// Issue a ticket for an estimate computed elsewhere.
    ///
    /// Refused while a drag is active, since the drag would overwrite the
    /// estimate on its next update.
    pub fn request_auto_rotate(&mut self) -> Result<DeskewTicket> {
        self.ensure_not_dragging()?;
        self.deskew.request()
    }

    fn ensure_not_dragging(&self) -> Result<()> {
        if self.drag.is_dragging() {
            debug!("Automatic rotation refused during drag");
            return Err(TransformError::DragInProgress);
        }
        Ok(())
    }

    /// Deliver the estimate for `ticket`.
    pub fn complete_auto_rotate(
        &mut self,
        ticket: DeskewTicket,
        result: Result<f64>,
    ) -> Result<DeskewOutcome> {
        self.deskew.complete(ticket, result, &mut self.params)
    }

    /// Drop a pending estimate without applying it.
    pub fn cancel_auto_rotate(&mut self) {
        self.deskew.invalidate();
    }

    /// Estimate and apply the rotation synchronously.
    pub fn auto_rotate(&mut self, estimator: &dyn SkewEstimator) -> Result<f64> {
        self.ensure_not_dragging()?;
        self.deskew.run(estimator, &self.image, &mut self.params)
    }

    /// [`Self::auto_rotate`] with the built-in projection-profile estimator.
    pub fn auto_rotate_builtin(&mut self) -> Result<f64> {
        let estimator = ProjectionProfileEstimator::new(self.config.deskew.clone());
        self.auto_rotate(&estimator)
    }

    /// Render the current parameters without ending the session.
    pub fn preview(&self) -> Result<RasterImage> {
        self.compositor.apply(&self.image, &self.params)
    }

    pub fn detach(self, action: DetachAction) -> Result<Detached> {
        if self.deskew.is_pending() {
            warn!("Detaching with an automatic rotation estimate still pending");
        }
        match action {
            DetachAction::Apply => {
                let output = self.compositor.apply(&self.image, &self.params)?;
                debug!(
                    "Detached with apply: {}x{} -> {}x{}",
                    self.image.width, self.image.height, output.width, output.height
                );
                Ok(Detached::Applied(output))
            }
            DetachAction::Cancel => {
                debug!("Detached with cancel");
                Ok(Detached::Canceled)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(width: u32, height: u32) -> TransformEngine {
        attach(
            RasterImage::filled(width, height, [10, 20, 30]),
            EngineConfig::default(),
        )
        .unwrap()
    }

    fn down(x: f64, y: f64) -> EngineEvent {
        EngineEvent::PointerDown {
            point: Point::new(x, y),
        }
    }

    fn mv(x: f64, y: f64) -> EngineEvent {
        EngineEvent::PointerMove {
            point: Point::new(x, y),
        }
    }

    #[test]
    fn test_attach_starts_at_identity() {
        let e = engine(100, 50);
        assert!(e.parameters().is_identity());
        assert_eq!(e.parameters().mode(), TransformMode::Scale);
        assert_eq!(e.geometry().image_rect(), Rect::new(0.0, 0.0, 100.0, 50.0));
        assert!(!e.is_dragging());
    }

    #[test]
    fn test_attach_uses_default_mode() {
        let config = EngineConfig {
            default_mode: TransformMode::Shear,
            ..EngineConfig::default()
        };
        let e = attach(RasterImage::filled(4, 4, [0, 0, 0]), config).unwrap();
        assert_eq!(e.parameters().mode(), TransformMode::Shear);
    }

    #[test]
    fn test_attach_rejects_bad_input() {
        let bad_image = RasterImage {
            width: 2,
            height: 2,
            pixels: vec![0; 5],
        };
        assert!(matches!(
            attach(bad_image, EngineConfig::default()),
            Err(TransformError::InvalidImage(_))
        ));

        let bad_config = EngineConfig {
            handle_size: 0.0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            attach(RasterImage::filled(2, 2, [0, 0, 0]), bad_config),
            Err(TransformError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_scale_drag_through_events() {
        let mut e = engine(100, 50);
        assert_eq!(
            e.handle_event(down(100.0, 50.0)),
            EventOutcome::DragStarted(Handle::BottomRight)
        );
        assert_eq!(e.active_handle(), Some(Handle::BottomRight));
        assert_eq!(e.handle_event(mv(150.0, 50.0)), EventOutcome::ParametersUpdated);
        assert!((e.parameters().scale_x() - 1.5).abs() < 1e-9);
        assert_eq!(e.parameters().scale_y(), 1.0);
        assert_eq!(e.handle_event(EngineEvent::PointerUp), EventOutcome::DragEnded);
        assert_eq!(e.active_handle(), None);
        assert_eq!(e.handle_event(EngineEvent::PointerUp), EventOutcome::Ignored);
        assert_eq!(e.handle_event(mv(0.0, 0.0)), EventOutcome::Ignored);
    }

    #[test]
    fn test_pointer_down_off_handle_is_ignored() {
        let mut e = engine(100, 100);
        assert_eq!(e.handle_event(down(50.0, 50.0)), EventOutcome::Ignored);
        assert!(!e.is_dragging());
    }

    #[test]
    fn test_rotate_drag() {
        let mut e = engine(100, 100);
        e.handle_event(EngineEvent::ModeSelected(TransformMode::Rotate));
        assert_eq!(
            e.handle_event(down(100.0, 50.0)),
            EventOutcome::DragStarted(Handle::Right)
        );
        e.handle_event(mv(50.0, 100.0));
        assert!((e.parameters().rotation() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_pan_mode_delegates() {
        let mut e = engine(100, 100);
        e.handle_event(EngineEvent::ModeSelected(TransformMode::Pan));
        assert_eq!(e.handle_event(down(100.0, 100.0)), EventOutcome::PanDelegated);
        assert!(e.parameters().is_identity());
        assert_eq!(e.cursor_at(Point::new(100.0, 100.0)), CursorKind::Pan);
    }

    #[test]
    fn test_mode_switch_mid_drag_keeps_frozen_mode() {
        let mut e = engine(100, 50);
        e.handle_event(down(100.0, 50.0));
        e.handle_event(EngineEvent::ModeSelected(TransformMode::Rotate));
        e.handle_event(mv(150.0, 50.0));
        assert!((e.parameters().scale_x() - 1.5).abs() < 1e-9);
        assert_eq!(e.parameters().rotation(), 0.0);
    }

    #[test]
    fn test_rect_change_during_drag_keeps_snapshot() {
        let mut e = engine(100, 50);
        e.handle_event(down(100.0, 50.0));
        assert_eq!(
            e.handle_event(EngineEvent::ImageRectChanged(Rect::new(0.0, 0.0, 200.0, 100.0))),
            EventOutcome::GeometryUpdated
        );
        e.handle_event(mv(150.0, 50.0));
        assert!((e.parameters().scale_x() - 1.5).abs() < 1e-9);
        assert_eq!(
            e.geometry().handle_position(Handle::BottomRight),
            Point::new(200.0, 100.0)
        );
    }

    #[test]
    fn test_numeric_changes() {
        let mut e = engine(10, 10);
        e.handle_event(EngineEvent::ParameterChanged(ParameterChange::Rotation(190.0)));
        e.handle_event(EngineEvent::ParameterChanged(ParameterChange::ScaleY(-4.0)));
        e.handle_event(EngineEvent::ParameterChanged(ParameterChange::Crop(true)));
        assert!((e.parameters().rotation() + 170.0).abs() < 1e-9);
        assert_eq!(e.parameters().scale_y(), crate::params::MIN_SCALE);
        assert!(e.parameters().crop_enabled());
    }

    #[test]
    fn test_cursor_at() {
        let mut e = engine(100, 100);
        assert_eq!(e.cursor_at(Point::new(0.0, 0.0)), CursorKind::DiagonalNwSe);
        assert_eq!(e.cursor_at(Point::new(100.0, 50.0)), CursorKind::Horizontal);
        assert_eq!(e.cursor_at(Point::new(50.0, 50.0)), CursorKind::Default);
        e.handle_event(EngineEvent::ModeSelected(TransformMode::Rotate));
        assert_eq!(e.cursor_at(Point::new(50.0, 100.0)), CursorKind::Rotate);
        assert_eq!(e.cursor_at(Point::new(50.0, 50.0)), CursorKind::Default);
    }

    #[test]
    fn test_reset_keeps_mode_and_crop() {
        let mut e = engine(100, 50);
        e.handle_event(EngineEvent::ModeSelected(TransformMode::Shear));
        e.handle_event(EngineEvent::ParameterChanged(ParameterChange::Crop(true)));
        e.handle_event(EngineEvent::ParameterChanged(ParameterChange::ShearX(0.4)));
        e.reset();
        assert!(e.parameters().is_identity());
        assert_eq!(e.parameters().mode(), TransformMode::Shear);
        assert!(e.parameters().crop_enabled());
    }

    #[test]
    fn test_pending_deskew_locks_drags() {
        let mut e = engine(100, 100);
        let ticket = e.request_auto_rotate().unwrap();
        assert_eq!(e.handle_event(down(100.0, 100.0)), EventOutcome::Locked);
        assert!(!e.is_dragging());

        let outcome = e.complete_auto_rotate(ticket, Ok(-3.0)).unwrap();
        assert_eq!(outcome, DeskewOutcome::Applied(-3.0));
        assert_eq!(e.parameters().rotation(), -3.0);
        assert_eq!(
            e.handle_event(down(100.0, 100.0)),
            EventOutcome::DragStarted(Handle::BottomRight)
        );
    }

    #[test]
    fn test_deskew_refused_during_drag() {
        let mut e = engine(100, 100);
        e.handle_event(EngineEvent::ModeSelected(TransformMode::Rotate));
        e.handle_event(down(100.0, 50.0));
        e.handle_event(mv(50.0, 100.0));
        assert!((e.parameters().rotation() - 90.0).abs() < 1e-9);

        assert_eq!(e.request_auto_rotate(), Err(TransformError::DragInProgress));
        assert!(!e.is_auto_rotate_pending());
        let estimator = |_: &RasterImage| -> Result<f64> { Ok(-3.0) };
        assert_eq!(
            e.auto_rotate(&estimator),
            Err(TransformError::DragInProgress)
        );
        assert!((e.parameters().rotation() - 90.0).abs() < 1e-9);

        e.handle_event(EngineEvent::PointerUp);
        assert_eq!(e.auto_rotate(&estimator).unwrap(), -3.0);
        assert_eq!(e.handle_event(mv(0.0, 50.0)), EventOutcome::Ignored);
        assert_eq!(e.parameters().rotation(), -3.0);
    }

    #[test]
    fn test_selecting_current_mode_is_ignored() {
        let mut e = engine(10, 10);
        assert_eq!(
            e.handle_event(EngineEvent::ModeSelected(TransformMode::Scale)),
            EventOutcome::Ignored
        );
        assert_eq!(
            e.handle_event(EngineEvent::ModeSelected(TransformMode::Shear)),
            EventOutcome::ParametersUpdated
        );
        assert_eq!(e.parameters().mode(), TransformMode::Shear);
    }

    #[test]
    fn test_manual_rotation_edit_makes_estimate_stale() {
        let mut e = engine(100, 100);
        let ticket = e.request_auto_rotate().unwrap();
        e.handle_event(EngineEvent::ParameterChanged(ParameterChange::Rotation(10.0)));
        assert!(!e.is_auto_rotate_pending());

        let outcome = e.complete_auto_rotate(ticket, Ok(-3.0)).unwrap();
        assert_eq!(outcome, DeskewOutcome::Discarded);
        assert_eq!(e.parameters().rotation(), 10.0);
    }

    #[test]
    fn test_non_rotation_edit_keeps_estimate_live() {
        let mut e = engine(100, 100);
        let ticket = e.request_auto_rotate().unwrap();
        e.handle_event(EngineEvent::ParameterChanged(ParameterChange::ScaleX(2.0)));
        assert_eq!(
            e.complete_auto_rotate(ticket, Ok(4.0)).unwrap(),
            DeskewOutcome::Applied(4.0)
        );
        assert_eq!(e.parameters().scale_x(), 2.0);
    }

    #[test]
    fn test_reset_makes_estimate_stale() {
        let mut e = engine(100, 100);
        let ticket = e.request_auto_rotate().unwrap();
        e.reset();
        assert_eq!(
            e.complete_auto_rotate(ticket, Ok(4.0)).unwrap(),
            DeskewOutcome::Discarded
        );
        assert_eq!(e.parameters().rotation(), 0.0);
    }

    #[test]
    fn test_auto_rotate_with_estimator() {
        let mut e = engine(20, 20);
        let estimator = |_: &RasterImage| -> Result<f64> { Ok(-2.0) };
        assert_eq!(e.auto_rotate(&estimator).unwrap(), -2.0);
        assert_eq!(e.parameters().rotation(), -2.0);
    }

    #[test]
    fn test_auto_rotate_builtin_fails_on_flat_image() {
        let mut e = engine(32, 32);
        e.handle_event(EngineEvent::ParameterChanged(ParameterChange::Rotation(7.0)));
        assert!(matches!(
            e.auto_rotate_builtin(),
            Err(TransformError::EstimationFailed(_))
        ));
        assert_eq!(e.parameters().rotation(), 7.0);
        assert!(!e.is_auto_rotate_pending());
    }

    #[test]
    fn test_preview_does_not_end_session() {
        let mut e = engine(10, 6);
        e.handle_event(EngineEvent::ParameterChanged(ParameterChange::Rotation(90.0)));
        let preview = e.preview().unwrap();
        assert_eq!((preview.width, preview.height), (6, 10));
        assert_eq!(e.parameters().rotation(), 90.0);
    }

    #[test]
    fn test_detach_apply_and_cancel() {
        let mut e = engine(10, 6);
        e.handle_event(EngineEvent::ParameterChanged(ParameterChange::ScaleX(2.0)));
        let expected = e.preview().unwrap();
        match detach(e.clone(), DetachAction::Apply).unwrap() {
            Detached::Applied(img) => {
                assert_eq!(img, expected);
                assert_eq!((img.width, img.height), (20, 6));
            }
            Detached::Canceled => panic!("expected applied image"),
        }
        assert_eq!(detach(e, DetachAction::Cancel).unwrap(), Detached::Canceled);
    }

    #[test]
    fn test_detach_identity_returns_original_pixels() {
        let e = engine(5, 3);
        let original = e.image().clone();
        assert_eq!(
            detach(e, DetachAction::Apply).unwrap(),
            Detached::Applied(original)
        );
    }

    #[test]
    fn test_event_json_shape() {
        let event: EngineEvent =
            serde_json::from_str(r#"{"type":"pointer_down","data":{"point":{"x":1.0,"y":2.0}}}"#).unwrap();
        assert_eq!(event, down(1.0, 2.0));

        let mode: EngineEvent =
            serde_json::from_str(r#"{"type":"mode_selected","data":"rotate"}"#).unwrap();
        assert_eq!(mode, EngineEvent::ModeSelected(TransformMode::Rotate));
    }
}
