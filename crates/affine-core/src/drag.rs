//! Pointer-drag interpretation.
//!
//! A drag starts on a handle, records a [`DragSnapshot`] plus the parameter
//! values at that moment, and turns every subsequent pointer position into
//! new scale, shear or rotation values. The mode is frozen when the drag
//! starts; switching modes mid-drag only affects the next drag.
//!
//! # Rules
//!
//! All offsets are measured from the handle position at drag start.
//!
//! - **Scale**: for each axis the handle drives,
//!   `scale = start * (extent + side * offset) / extent`, where `extent` is
//!   the image size along that axis. The opposite edge is the reference, so
//!   dragging the right edge of a 100px wide image 50px outward gives 1.5.
//! - **Shear**: top/bottom handles drive `shear_x = start + s * dx / height`,
//!   left/right handles drive `shear_y = start + s * dy / width`. Corners
//!   pick whichever edge matches the dominant pointer offset.
//! - **Rotate**: the angle swept around the image center between the handle
//!   and the pointer is added to the starting rotation.

use log::{debug, trace};

use crate::config::ShearSignConvention;
use crate::geometry::Point;
use crate::interaction::DragSnapshot;
use crate::params::{TransformMode, TransformParameters};

#[derive(Debug, Clone, Copy, PartialEq)]
struct ActiveDrag {
    snapshot: DragSnapshot,
    mode: TransformMode,
    start: TransformParameters,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum DragState {
    #[default]
    Idle,
    Dragging(ActiveDrag),
}

/// Turns pointer motion on a handle into parameter updates.
#[derive(Debug, Clone, Default)]
pub struct DragInterpreter {
    state: DragState,
    shear_sign: ShearSignConvention,
}

impl DragInterpreter {
    pub fn new(shear_sign: ShearSignConvention) -> Self {
        Self {
            state: DragState::Idle,
            shear_sign,
        }
    }

    /// Start a drag. Any drag in progress is replaced.
    ///
    /// Returns false in pan mode, where handles do not drive parameters.
    pub fn begin(&mut self, snapshot: DragSnapshot, params: &TransformParameters) -> bool {
        let mode = params.mode();
        if mode == TransformMode::Pan {
            self.state = DragState::Idle;
            return false;
        }
        debug!(
            "Drag started on {:?} in {:?} mode at ({:.1}, {:.1})",
            snapshot.handle, mode, snapshot.initial_point.x, snapshot.initial_point.y
        );
        self.state = DragState::Dragging(ActiveDrag {
            snapshot,
            mode,
            start: *params,
        });
        true
    }

    /// Recompute the mode's parameters for the current pointer position.
    ///
    /// Returns false when no drag is active.
    pub fn update(&self, pointer: Point, params: &mut TransformParameters) -> bool {
        let DragState::Dragging(drag) = &self.state else {
            return false;
        };
        match drag.mode {
            TransformMode::Scale => apply_scale(drag, pointer, params),
            TransformMode::Shear => apply_shear(drag, pointer, params, self.shear_sign),
            TransformMode::Rotate => apply_rotation(drag, pointer, params),
            TransformMode::Pan => return false,
        }
        trace!(
            "Drag update ({:.1}, {:.1}): scale=({:.3}, {:.3}) shear=({:.3}, {:.3}) rotation={:.2}",
            pointer.x,
            pointer.y,
            params.scale_x(),
            params.scale_y(),
            params.shear_x(),
            params.shear_y(),
            params.rotation()
        );
        true
    }

    /// Finish the drag and hand back its snapshot.
    pub fn end(&mut self) -> Option<DragSnapshot> {
        match std::mem::take(&mut self.state) {
            DragState::Dragging(drag) => {
                debug!("Drag on {:?} ended", drag.snapshot.handle);
                Some(drag.snapshot)
            }
            DragState::Idle => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    pub fn snapshot(&self) -> Option<&DragSnapshot> {
        match &self.state {
            DragState::Dragging(drag) => Some(&drag.snapshot),
            DragState::Idle => None,
        }
    }

    /// Mode frozen at drag start.
    pub fn active_mode(&self) -> Option<TransformMode> {
        match &self.state {
            DragState::Dragging(drag) => Some(drag.mode),
            DragState::Idle => None,
        }
    }
}

fn apply_scale(drag: &ActiveDrag, pointer: Point, params: &mut TransformParameters) {
    let snap = &drag.snapshot;
    let spec = snap.handle.spec();
    let (dx, dy) = snap.initial_point.offset_to(pointer);

    if spec.axes.x {
        if let Some(factor) = extent_ratio(snap.initial_size.width, spec.sign.0 * dx) {
            params.set_scale_x(drag.start.scale_x() * factor);
        }
    }
    if spec.axes.y {
        if let Some(factor) = extent_ratio(snap.initial_size.height, spec.sign.1 * dy) {
            params.set_scale_y(drag.start.scale_y() * factor);
        }
    }
}

fn extent_ratio(extent: f64, growth: f64) -> Option<f64> {
    (extent > 0.0).then(|| (extent + growth) / extent)
}

fn apply_shear(
    drag: &ActiveDrag,
    pointer: Point,
    params: &mut TransformParameters,
    convention: ShearSignConvention,
) {
    let snap = &drag.snapshot;
    let spec = snap.handle.spec();
    let (dx, dy) = snap.initial_point.offset_to(pointer);

    // Which edge the handle acts on: horizontal edges slide along x.
    let horizontal_edge = match (spec.axes.x, spec.axes.y) {
        (true, true) => dx.abs() >= dy.abs(),
        (false, true) => true,
        _ => false,
    };

    // The component not driven by this position goes back to its start
    // value, so corner shear depends only on where the pointer is.
    if horizontal_edge {
        params.set_shear_y(drag.start.shear_y());
        let height = snap.initial_size.height;
        if height > 0.0 {
            let s = convention.multiplier(spec.sign.1);
            params.set_shear_x(drag.start.shear_x() + s * dx / height);
        }
    } else {
        params.set_shear_x(drag.start.shear_x());
        let width = snap.initial_size.width;
        if width > 0.0 {
            let s = convention.multiplier(spec.sign.0);
            params.set_shear_y(drag.start.shear_y() + s * dy / width);
        }
    }
}

fn apply_rotation(drag: &ActiveDrag, pointer: Point, params: &mut TransformParameters) {
    let snap = &drag.snapshot;
    let swept = swept_angle(snap.initial_center, snap.initial_point, pointer);
    params.set_rotation(drag.start.rotation() + swept);
}

/// Angle in degrees from `center -> from` to `center -> to`, clockwise on
/// screen being positive.
pub fn swept_angle(center: Point, from: Point, to: Point) -> f64 {
    let (fx, fy) = center.offset_to(from);
    let (tx, ty) = center.offset_to(to);
    (ty.atan2(tx) - fy.atan2(fx)).to_degrees()
}
