//! Canvas surface abstraction.

use crate::decorations::Decoration;
use crate::drawable::{Drawable, Placement};
use kurbo::{Point, Size, Vec2};
use std::collections::BTreeMap;

/// Opaque handle to a drawable living on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DrawableHandle(u64);

impl DrawableHandle {
    /// Wrap a surface-assigned id.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Something element drawables and sheet decorations can be placed on.
///
/// Drawables are kept in insertion order; later drawables paint on top.
pub trait Surface: Send {
    /// Add a drawable, returning its handle.
    fn insert(&mut self, drawable: Drawable) -> DrawableHandle;

    /// Move/rotate/resize an existing drawable in place. Returns false when
    /// the handle is unknown.
    fn update(&mut self, handle: DrawableHandle, placement: Placement) -> bool;

    /// Set the live resize scale of a drawable.
    fn set_scale(&mut self, handle: DrawableHandle, scale: Vec2) -> bool;

    /// Drop a drawable.
    fn remove(&mut self, handle: DrawableHandle) -> Option<Drawable>;

    fn get(&self, handle: DrawableHandle) -> Option<&Drawable>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drawables bottom to top.
    fn drawables(&self) -> Vec<(DrawableHandle, &Drawable)>;

    /// Topmost drawable containing a world point.
    fn hit_test(&self, point: Point) -> Option<DrawableHandle> {
        self.drawables()
            .into_iter()
            .rev()
            .find(|(_, drawable)| drawable.contains(point))
            .map(|(handle, _)| handle)
    }

    /// Replace the decoration layer.
    fn set_decorations(&mut self, decorations: Vec<Decoration>);

    fn decorations(&self) -> &[Decoration];

    /// Viewport size in screen pixels.
    fn set_viewport_size(&mut self, size: Size);

    fn viewport_size(&self) -> Size;

    /// Dispose every drawable and decoration.
    fn clear(&mut self);
}

/// Running totals of surface mutations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceStats {
    pub inserted: u64,
    pub updated: u64,
    pub removed: u64,
}

/// In-memory retained scene.
#[derive(Debug, Default)]
pub struct SceneSurface {
    drawables: BTreeMap<DrawableHandle, Drawable>,
    decorations: Vec<Decoration>,
    next_handle: u64,
    viewport_size: Size,
    stats: SurfaceStats,
}

impl SceneSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> SurfaceStats {
        self.stats
    }
}

impl Surface for SceneSurface {
    fn insert(&mut self, drawable: Drawable) -> DrawableHandle {
        self.next_handle += 1;
        let handle = DrawableHandle(self.next_handle);
        self.drawables.insert(handle, drawable);
        self.stats.inserted += 1;
        handle
    }

    fn update(&mut self, handle: DrawableHandle, placement: Placement) -> bool {
        let Some(drawable) = self.drawables.get_mut(&handle) else {
            return false;
        };
        if drawable.placement != placement || drawable.scale != Vec2::new(1.0, 1.0) {
            drawable.normalize_scale(placement.size);
            drawable.placement = placement;
            self.stats.updated += 1;
        }
        true
    }

    fn set_scale(&mut self, handle: DrawableHandle, scale: Vec2) -> bool {
        match self.drawables.get_mut(&handle) {
            Some(drawable) => {
                drawable.scale = scale;
                true
            }
            None => false,
        }
    }

    fn remove(&mut self, handle: DrawableHandle) -> Option<Drawable> {
        let removed = self.drawables.remove(&handle);
        if removed.is_some() {
            self.stats.removed += 1;
        }
        removed
    }

    fn get(&self, handle: DrawableHandle) -> Option<&Drawable> {
        self.drawables.get(&handle)
    }

    fn len(&self) -> usize {
        self.drawables.len()
    }

    fn drawables(&self) -> Vec<(DrawableHandle, &Drawable)> {
        self.drawables.iter().map(|(h, d)| (*h, d)).collect()
    }

    fn set_decorations(&mut self, decorations: Vec<Decoration>) {
        self.decorations = decorations;
    }

    fn decorations(&self) -> &[Decoration] {
        &self.decorations
    }

    fn set_viewport_size(&mut self, size: Size) {
        self.viewport_size = size;
    }

    fn viewport_size(&self) -> Size {
        self.viewport_size
    }

    fn clear(&mut self) {
        self.stats.removed += self.drawables.len() as u64;
        self.drawables.clear();
        self.decorations.clear();
    }
}
