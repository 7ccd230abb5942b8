//! Pointer-driven text placement.
//!
//! The controller keeps the text anchor in canvas pixel coordinates and
//! interprets a stream of pointer events in arrival order. Dragging moves the
//! anchor by the grab offset captured on press, clamped to the canvas, so the
//! text never jumps under the pointer and never leaves the visible area.

use kurbo::{Point, Vec2};

use crate::foundation::core::Canvas;
use crate::foundation::error::{UnderlayError, UnderlayResult};

/// Drag interaction state.
///
/// The grab offset exists only inside the `Dragging` arm, so a finished drag
/// leaves nothing behind to leak into the next one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DragState {
    /// No pointer interaction in progress.
    Idle,
    /// A drag is live.
    Dragging {
        /// Vector from the pointer to the text anchor, captured at press.
        offset: Vec2,
    },
}

impl DragState {
    /// Return `true` while a drag is live.
    pub fn is_dragging(self) -> bool {
        matches!(self, DragState::Dragging { .. })
    }
}

/// Tracks the text anchor and the drag state machine for one canvas.
#[derive(Clone, Debug)]
pub struct PlacementController {
    canvas: Canvas,
    position: Point,
    drag: DragState,
}

impl PlacementController {
    /// Controller with the anchor at the canvas center.
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            position: canvas.center(),
            drag: DragState::Idle,
        }
    }

    /// Controller with an explicit starting anchor, clamped to the canvas.
    pub fn with_position(canvas: Canvas, position: Point) -> Self {
        Self {
            canvas,
            position: clamp_to_canvas(position, canvas),
            drag: DragState::Idle,
        }
    }

    /// The canvas this controller clamps against.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Current text anchor in canvas pixel coordinates.
    pub fn position(&self) -> Point {
        self.position
    }

    /// Current interaction state.
    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    /// Return `true` while a drag is live.
    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// Move the anchor programmatically, clamped. Returns `true` on change.
    pub fn set_position(&mut self, position: Point) -> bool {
        let clamped = clamp_to_canvas(position, self.canvas);
        if clamped == self.position {
            return false;
        }
        self.position = clamped;
        true
    }

    /// Pointer press in canvas coordinates.
    ///
    /// Begins a drag anchored at the current position. A press while a drag
    /// is already live is ignored rather than re-anchoring.
    pub fn pointer_down(&mut self, pointer: Point) {
        if self.drag.is_dragging() {
            return;
        }
        self.drag = DragState::Dragging {
            offset: self.position - pointer,
        };
    }

    /// Pointer movement in canvas coordinates. Returns `true` when the
    /// anchor moved.
    ///
    /// Outside a drag this is a no-op.
    pub fn pointer_move(&mut self, pointer: Point) -> bool {
        let DragState::Dragging { offset } = self.drag else {
            return false;
        };
        self.set_position(pointer + offset)
    }

    /// Pointer release: the drag ends, the anchor stays put.
    pub fn pointer_up(&mut self) {
        self.drag = DragState::Idle;
    }

    /// Pointer left the canvas: same as a release.
    pub fn pointer_leave(&mut self) {
        self.pointer_up();
    }
}

fn clamp_to_canvas(p: Point, canvas: Canvas) -> Point {
    Point::new(
        p.x.clamp(0.0, f64::from(canvas.width)),
        p.y.clamp(0.0, f64::from(canvas.height)),
    )
}

/// Maps display-space pointer coordinates into canvas pixel space.
///
/// Hosts usually show the canvas scaled to fit; pointer events arrive in
/// display pixels and must be mapped before they reach the controller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewScale {
    sx: f64,
    sy: f64,
}

impl ViewScale {
    /// No scaling: display pixels are canvas pixels.
    pub const IDENTITY: ViewScale = ViewScale { sx: 1.0, sy: 1.0 };

    /// Scale for a canvas shown at `display_width` x `display_height`.
    pub fn from_display_size(
        canvas: Canvas,
        display_width: f64,
        display_height: f64,
    ) -> UnderlayResult<Self> {
        if !display_width.is_finite()
            || !display_height.is_finite()
            || display_width <= 0.0
            || display_height <= 0.0
        {
            return Err(UnderlayError::validation(
                "display size must be finite and > 0",
            ));
        }
        Ok(Self {
            sx: f64::from(canvas.width) / display_width,
            sy: f64::from(canvas.height) / display_height,
        })
    }

    /// Map one display-space point into canvas space.
    pub fn to_canvas(self, display_point: Point) -> Point {
        Point::new(display_point.x * self.sx, display_point.y * self.sy)
    }
}
