//! Interaction handles around the image bounding rectangle.
//!
//! Eight square handles sit on the four corners and four edge midpoints of
//! the image rectangle. Everything a drag needs to know about a handle (where
//! it sits, which axes it drives, which side of the center it is on and
//! which cursor it shows) lives in one lookup table, [`HANDLE_TABLE`], keyed
//! by handle index.
//!
//! # Index order
//!
//! ```text
//! 0 ---- 6 ---- 2
//! |             |
//! 4      c      5
//! |             |
//! 1 ---- 7 ---- 3
//! ```

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect, Size};

/// Smallest image rectangle extent used for handle placement.
const MIN_RECT_EXTENT: f64 = 1.0;

/// One of the eight interaction handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handle {
    TopLeft,
    BottomLeft,
    TopRight,
    BottomRight,
    Left,
    Right,
    Top,
    Bottom,
}

impl Handle {
    /// All handles in hit-test order.
    pub const ALL: [Handle; 8] = [
        Handle::TopLeft,
        Handle::BottomLeft,
        Handle::TopRight,
        Handle::BottomRight,
        Handle::Left,
        Handle::Right,
        Handle::Top,
        Handle::Bottom,
    ];

    /// Position of this handle in [`Handle::ALL`] and [`HANDLE_TABLE`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Handle> {
        Handle::ALL.get(index).copied()
    }

    pub fn spec(self) -> &'static HandleSpec {
        &HANDLE_TABLE[self.index()]
    }

    pub fn is_corner(self) -> bool {
        let spec = self.spec();
        spec.axes.x && spec.axes.y
    }
}

/// Pointer cursor identity reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorKind {
    /// Regular arrow.
    Default,
    /// Diagonal resize, top-left to bottom-right.
    DiagonalNwSe,
    /// Diagonal resize, top-right to bottom-left.
    DiagonalNeSw,
    Horizontal,
    Vertical,
    Rotate,
    Pan,
}

/// Which axes a handle drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisMask {
    pub x: bool,
    pub y: bool,
}

/// Static description of a handle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleSpec {
    /// Fractional position on the image rectangle.
    pub anchor: (f64, f64),
    pub axes: AxisMask,
    /// Side of the center the handle sits on: -1 left/top, +1 right/bottom,
    /// 0 for the axis a midpoint handle does not drive.
    pub sign: (f64, f64),
    pub cursor: CursorKind,
}

const BOTH: AxisMask = AxisMask { x: true, y: true };
const X_ONLY: AxisMask = AxisMask { x: true, y: false };
const Y_ONLY: AxisMask = AxisMask { x: false, y: true };

/// Handle table, indexed by [`Handle::index`].
pub const HANDLE_TABLE: [HandleSpec; 8] = [
    HandleSpec {
        anchor: (0.0, 0.0),
        axes: BOTH,
        sign: (-1.0, -1.0),
        cursor: CursorKind::DiagonalNwSe,
    },
    HandleSpec {
        anchor: (0.0, 1.0),
        axes: BOTH,
        sign: (-1.0, 1.0),
        cursor: CursorKind::DiagonalNeSw,
    },
    HandleSpec {
        anchor: (1.0, 0.0),
        axes: BOTH,
        sign: (1.0, -1.0),
        cursor: CursorKind::DiagonalNeSw,
    },
    HandleSpec {
        anchor: (1.0, 1.0),
        axes: BOTH,
        sign: (1.0, 1.0),
        cursor: CursorKind::DiagonalNwSe,
    },
    HandleSpec {
        anchor: (0.0, 0.5),
        axes: X_ONLY,
        sign: (-1.0, 0.0),
        cursor: CursorKind::Horizontal,
    },
    HandleSpec {
        anchor: (1.0, 0.5),
        axes: X_ONLY,
        sign: (1.0, 0.0),
        cursor: CursorKind::Horizontal,
    },
    HandleSpec {
        anchor: (0.5, 0.0),
        axes: Y_ONLY,
        sign: (0.0, -1.0),
        cursor: CursorKind::Vertical,
    },
    HandleSpec {
        anchor: (0.5, 1.0),
        axes: Y_ONLY,
        sign: (0.0, 1.0),
        cursor: CursorKind::Vertical,
    },
];

/// Drag-start reference geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragSnapshot {
    pub handle: Handle,
    /// Handle position at drag start.
    pub initial_point: Point,
    /// Image rectangle size at drag start.
    pub initial_size: Size,
    pub initial_center: Point,
}

/// A handle rectangle as drawn by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandleRect {
    pub handle: Handle,
    pub rect: Rect,
    pub cursor: CursorKind,
}

/// Handle rectangles and center derived from the image rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionGeometry {
    image_rect: Rect,
    handle_size: f64,
    handles: [Rect; 8],
    center: Point,
}

impl InteractionGeometry {
    pub fn new(image_rect: Rect, handle_size: f64) -> Self {
        let mut geometry = Self {
            image_rect,
            handle_size,
            handles: [Rect::default(); 8],
            center: Point::default(),
        };
        geometry.update_rects(image_rect);
        geometry
    }

    /// Recompute handles and center for a new image rectangle.
    ///
    /// The rectangle is clamped to at least 1x1 so handles never collapse
    /// onto a single point.
    pub fn update_rects(&mut self, image_rect: Rect) {
        let rect = image_rect.with_min_size(MIN_RECT_EXTENT);
        for (slot, spec) in self.handles.iter_mut().zip(HANDLE_TABLE.iter()) {
            let anchor = rect.point_at(spec.anchor.0, spec.anchor.1);
            *slot = Rect::centered_square(anchor, self.handle_size);
        }
        self.image_rect = rect;
        self.center = rect.center();
    }

    pub fn image_rect(&self) -> Rect {
        self.image_rect
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn handle_rect(&self, handle: Handle) -> Rect {
        self.handles[handle.index()]
    }

    /// Center of a handle, i.e. the corner or midpoint it is anchored to.
    pub fn handle_position(&self, handle: Handle) -> Point {
        let (fx, fy) = handle.spec().anchor;
        self.image_rect.point_at(fx, fy)
    }

    /// All handles with their rectangles and cursors, in index order.
    pub fn handle_rects(&self) -> Vec<HandleRect> {
        Handle::ALL
            .iter()
            .map(|&handle| HandleRect {
                handle,
                rect: self.handle_rect(handle),
                cursor: Self::cursor_for(handle),
            })
            .collect()
    }

    /// First handle whose rectangle contains `point`.
    pub fn hit_test(&self, point: Point) -> Option<Handle> {
        Handle::ALL
            .iter()
            .copied()
            .find(|&handle| self.handles[handle.index()].contains(point))
    }

    /// Directional resize cursor for a handle.
    pub fn cursor_for(handle: Handle) -> CursorKind {
        handle.spec().cursor
    }

    /// Record the drag-start reference for `handle`.
    pub fn capture_initial(&self, handle: Handle) -> DragSnapshot {
        DragSnapshot {
            handle,
            initial_point: self.handle_position(handle),
            initial_size: self.image_rect.size(),
            initial_center: self.center,
        }
    }
}
