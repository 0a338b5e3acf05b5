//! Pointer drag state machine shared by mouse and touch input.
//!
//! ```text
//! Idle --Start--> Dragging --Move--> Dragging --End--> Idle
//! ```

use crate::foundation::core::{Point, Vec2};

use super::state::PhotoTransform;

/// Phase of a pointer event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerPhase {
    /// Pointer pressed (mouse down or first touch).
    Start,
    /// Pointer moved while pressed.
    Move,
    /// Pointer released.
    End,
}

/// Device-independent pointer event in display pixels.
///
/// Touch input supplies only its first touch point.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PointerEvent {
    /// Pointer x in display pixels.
    pub x: f64,
    /// Pointer y in display pixels.
    pub y: f64,
    /// Event phase.
    pub phase: PointerPhase,
}

impl PointerEvent {
    /// Pointer pressed at `(x, y)`.
    pub fn start(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            phase: PointerPhase::Start,
        }
    }

    /// Pointer moved to `(x, y)`.
    pub fn moved(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            phase: PointerPhase::Move,
        }
    }

    /// Pointer released at `(x, y)`.
    pub fn end(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            phase: PointerPhase::End,
        }
    }

    fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Drag lifecycle state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum DragState {
    /// No pointer is pressed.
    #[default]
    Idle,
    /// A drag is in progress.
    Dragging {
        /// Pointer position when the drag started.
        pointer_origin: Point,
        /// Position of the dragged object when the drag started.
        position_origin: Vec2,
    },
}

/// What one pointer event did to the drag.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DragOutcome {
    /// Event had no effect (move or end while idle, or non-finite coordinates).
    Ignored,
    /// A drag began; the position is unchanged.
    Started,
    /// The dragged object moved to this position.
    Moved(Vec2),
    /// The drag finished at this position.
    Ended(Vec2),
}

impl DragOutcome {
    /// New position, if the event produced one.
    pub fn position(self) -> Option<Vec2> {
        match self {
            Self::Moved(p) | Self::Ended(p) => Some(p),
            Self::Ignored | Self::Started => None,
        }
    }
}

/// Single-pointer drag tracker for one draggable object.
///
/// Each draggable (the photo, a floating panel) owns its own gesture, so two drags never share
/// state.
#[derive(Clone, Copy, Debug, Default)]
pub struct DragGesture {
    state: DragState,
}

impl DragGesture {
    /// An idle gesture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DragState {
        self.state
    }

    /// Whether a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Advance the state machine. `current_position` is where the dragged object is now.
    pub fn handle(&mut self, event: PointerEvent, current_position: Vec2) -> DragOutcome {
        let pointer = event.point();
        if !pointer.is_finite() {
            return DragOutcome::Ignored;
        }

        match (event.phase, self.state) {
            (PointerPhase::Start, _) => {
                self.state = DragState::Dragging {
                    pointer_origin: pointer,
                    position_origin: current_position,
                };
                DragOutcome::Started
            }
            (
                PointerPhase::Move,
                DragState::Dragging {
                    pointer_origin,
                    position_origin,
                },
            ) => DragOutcome::Moved(position_origin + (pointer - pointer_origin)),
            (
                PointerPhase::End,
                DragState::Dragging {
                    pointer_origin,
                    position_origin,
                },
            ) => {
                self.state = DragState::Idle;
                DragOutcome::Ended(position_origin + (pointer - pointer_origin))
            }
            (PointerPhase::Move | PointerPhase::End, DragState::Idle) => DragOutcome::Ignored,
        }
    }

    /// Drive the photo offset from a pointer event; returns the updated transform.
    pub fn drag_photo(&mut self, event: PointerEvent, transform: &PhotoTransform) -> PhotoTransform {
        let mut next = *transform;
        if let Some(offset) = self.handle(event, transform.offset()).position() {
            next.set_offset(offset);
        }
        next
    }
}
