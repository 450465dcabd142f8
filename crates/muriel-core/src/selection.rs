//! Selection and manipulation state machine.

use crate::drawable::Placement;
use crate::element::Element;
use crate::snap::{snap_length, snap_to_grid};
use crate::surface::DrawableHandle;
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Handle size in screen pixels.
pub const HANDLE_SIZE: f64 = 10.0;
/// Handle hit tolerance in screen pixels.
pub const HANDLE_HIT_TOLERANCE: f64 = 8.0;

/// Smallest live scale a resize preview may reach.
const MIN_LIVE_SCALE: f64 = 0.05;

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    /// Unit direction of the corner from the centre.
    fn sign(self) -> Vec2 {
        match self {
            Corner::TopLeft => Vec2::new(-1.0, -1.0),
            Corner::TopRight => Vec2::new(1.0, -1.0),
            Corner::BottomLeft => Vec2::new(-1.0, 1.0),
            Corner::BottomRight => Vec2::new(1.0, 1.0),
        }
    }
}

/// A resize handle with its position.
#[derive(Debug, Clone, Copy)]
pub struct Handle {
    /// Position in world coordinates.
    pub position: Point,
    pub corner: Corner,
}

impl Handle {
    /// Create a new handle.
    pub fn new(position: Point, corner: Corner) -> Self {
        Self { position, corner }
    }

    /// Check if a point (in world coordinates) hits this handle.
    /// `tolerance` should be adjusted for viewport zoom.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let dx = point.x - self.position.x;
        let dy = point.y - self.position.y;
        dx * dx + dy * dy <= tolerance * tolerance
    }
}

/// Corner handles of a placed drawable, following its rotation.
pub fn corner_handles(placement: &Placement) -> Vec<Handle> {
    let center = placement.center;
    let half_w = placement.size.width / 2.0;
    let half_h = placement.size.height / 2.0;
    let (sin_r, cos_r) = placement.rotation.to_radians().sin_cos();
    let rotate_point = |dx: f64, dy: f64| -> Point {
        Point::new(
            center.x + dx * cos_r - dy * sin_r,
            center.y + dx * sin_r + dy * cos_r,
        )
    };

    [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ]
    .into_iter()
    .map(|corner| {
        let s = corner.sign();
        Handle::new(rotate_point(s.x * half_w, s.y * half_h), corner)
    })
    .collect()
}

/// Find which corner handle (if any) is hit at the given point.
pub fn hit_test_handles(placement: &Placement, point: Point, tolerance: f64) -> Option<Corner> {
    corner_handles(placement)
        .into_iter()
        .find(|handle| handle.hit_test(point, tolerance))
        .map(|handle| handle.corner)
}

/// Unrotated selection frame around a placement.
pub fn selection_frame(placement: &Placement) -> Rect {
    Rect::from_center_size(placement.center, placement.size)
}

/// What lies under the pointer on press.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Background,
    Drawable {
        element_id: String,
        handle: DrawableHandle,
        placement: Placement,
    },
    ResizeHandle {
        element_id: String,
        handle: DrawableHandle,
        placement: Placement,
        corner: Corner,
    },
}

/// An in-progress move.
#[derive(Debug, Clone)]
pub struct DragState {
    pub element_id: String,
    pub handle: DrawableHandle,
    pub start_point: Point,
    pub current_point: Point,
    pub original: Placement,
    /// Last grid-snapped centre shown.
    pub snapped_center: Point,
}

impl DragState {
    /// Get the drag delta.
    pub fn delta(&self) -> Vec2 {
        self.current_point - self.start_point
    }
}

/// An in-progress resize.
#[derive(Debug, Clone)]
pub struct ResizeState {
    pub element_id: String,
    pub handle: DrawableHandle,
    pub corner: Corner,
    pub start_point: Point,
    pub current_point: Point,
    pub original: Placement,
    /// Live scale relative to the original size.
    pub scale: Vec2,
}

impl ResizeState {
    /// Get the drag delta.
    pub fn delta(&self) -> Vec2 {
        self.current_point - self.start_point
    }
}

/// Interaction state.
#[derive(Debug, Clone, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Dragging(DragState),
    Resizing(ResizeState),
    Panning {
        /// Last pointer position in screen space.
        last: Point,
    },
}

/// What the editor has to do in response to pointer input.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Selection changed.
    SelectionChanged,
    /// Pan the viewport by a screen-space delta.
    Pan(Vec2),
    /// Show a drawable at a transient placement and scale; not an edit.
    Preview {
        handle: DrawableHandle,
        placement: Placement,
        scale: Vec2,
    },
    /// Commit a finished move.
    CommitMove { element_id: String, position: Point },
    /// Commit a finished resize with absolute dimensions.
    CommitResize { element_id: String, size: Size },
}

/// Drives selection, move, resize and pan from pointer events.
#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    state: InteractionState,
    /// Selected element ids. Holds at most one entry today.
    selection: Vec<String>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, InteractionState::Idle)
    }

    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    pub fn is_selected(&self, element_id: &str) -> bool {
        self.selection.iter().any(|id| id == element_id)
    }

    /// Select a single element. Returns true if the selection changed.
    pub fn select(&mut self, element_id: &str) -> bool {
        if self.selection.len() == 1 && self.selection[0] == element_id {
            return false;
        }
        self.selection = vec![element_id.to_string()];
        true
    }

    /// Returns true if anything was selected.
    pub fn clear_selection(&mut self) -> bool {
        let changed = !self.selection.is_empty();
        self.selection.clear();
        changed
    }

    /// Drop selected ids that no longer exist. Returns true on change.
    pub fn retain_existing(&mut self, elements: &[Element]) -> bool {
        let before = self.selection.len();
        self.selection
            .retain(|id| elements.iter().any(|element| &element.id == id));
        if self.selection.len() != before {
            self.state = InteractionState::Idle;
            return true;
        }
        false
    }

    /// Pointer pressed. `pan` is true when the button/modifier combination
    /// starts a pan gesture.
    pub fn pointer_down(
        &mut self,
        world: Point,
        screen: Point,
        target: Target,
        pan: bool,
    ) -> Vec<Effect> {
        if pan {
            self.state = InteractionState::Panning { last: screen };
            return Vec::new();
        }

        let mut effects = Vec::new();
        match target {
            Target::Background => {
                if self.clear_selection() {
                    effects.push(Effect::SelectionChanged);
                }
                self.state = InteractionState::Idle;
            }
            Target::Drawable {
                element_id,
                handle,
                placement,
            } => {
                if self.select(&element_id) {
                    effects.push(Effect::SelectionChanged);
                }
                self.state = InteractionState::Dragging(DragState {
                    element_id,
                    handle,
                    start_point: world,
                    current_point: world,
                    original: placement,
                    snapped_center: placement.center,
                });
            }
            Target::ResizeHandle {
                element_id,
                handle,
                placement,
                corner,
            } => {
                if self.select(&element_id) {
                    effects.push(Effect::SelectionChanged);
                }
                self.state = InteractionState::Resizing(ResizeState {
                    element_id,
                    handle,
                    corner,
                    start_point: world,
                    current_point: world,
                    original: placement,
                    scale: Vec2::new(1.0, 1.0),
                });
            }
        }
        effects
    }

    /// Pointer moved.
    pub fn pointer_move(&mut self, world: Point, screen: Point, grid_size: f64) -> Option<Effect> {
        match &mut self.state {
            InteractionState::Idle => None,
            InteractionState::Panning { last } => {
                let delta = screen - *last;
                *last = screen;
                Some(Effect::Pan(delta))
            }
            InteractionState::Dragging(drag) => {
                drag.current_point = world;
                let snapped = snap_to_grid(drag.original.center + drag.delta(), grid_size);
                if snapped == drag.snapped_center {
                    return None;
                }
                drag.snapped_center = snapped;
                Some(Effect::Preview {
                    handle: drag.handle,
                    placement: Placement {
                        center: snapped,
                        ..drag.original
                    },
                    scale: Vec2::new(1.0, 1.0),
                })
            }
            InteractionState::Resizing(resize) => {
                resize.current_point = world;
                let (sin_r, cos_r) = (-resize.original.rotation.to_radians()).sin_cos();
                let d = resize.delta();
                let local = Vec2::new(d.x * cos_r - d.y * sin_r, d.x * sin_r + d.y * cos_r);
                let sign = resize.corner.sign();
                let size = resize.original.size;
                let width = size.width + 2.0 * local.x * sign.x;
                let height = size.height + 2.0 * local.y * sign.y;
                resize.scale = Vec2::new(
                    scale_factor(width, size.width),
                    scale_factor(height, size.height),
                );
                Some(Effect::Preview {
                    handle: resize.handle,
                    placement: resize.original,
                    scale: resize.scale,
                })
            }
        }
    }

    /// Pointer released.
    pub fn pointer_up(&mut self, grid_size: f64) -> Option<Effect> {
        match std::mem::take(&mut self.state) {
            InteractionState::Idle | InteractionState::Panning { .. } => None,
            InteractionState::Dragging(drag) => {
                if drag.snapped_center == drag.original.center {
                    return None;
                }
                Some(Effect::CommitMove {
                    element_id: drag.element_id,
                    position: drag.snapped_center,
                })
            }
            InteractionState::Resizing(resize) => {
                let original = resize.original.size;
                let size = Size::new(
                    snap_length(original.width * resize.scale.x, grid_size),
                    snap_length(original.height * resize.scale.y, grid_size),
                );
                if size == original {
                    return Some(Effect::Preview {
                        handle: resize.handle,
                        placement: resize.original,
                        scale: Vec2::new(1.0, 1.0),
                    });
                }
                Some(Effect::CommitResize {
                    element_id: resize.element_id,
                    size,
                })
            }
        }
    }

    /// Abort any gesture, returning the preview that restores the drawable.
    pub fn cancel(&mut self) -> Option<Effect> {
        match std::mem::take(&mut self.state) {
            InteractionState::Dragging(DragState {
                handle, original, ..
            })
            | InteractionState::Resizing(ResizeState {
                handle, original, ..
            }) => Some(Effect::Preview {
                handle,
                placement: original,
                scale: Vec2::new(1.0, 1.0),
            }),
            _ => None,
        }
    }
}

fn scale_factor(new: f64, original: f64) -> f64 {
    if original <= 0.0 {
        return 1.0;
    }
    (new / original).max(MIN_LIVE_SCALE)
}
