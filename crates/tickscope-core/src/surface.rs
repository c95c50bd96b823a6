//! Drawing-surface contract and a retained, in-memory implementation.
//!
//! A drawable is a container of vector shapes with its own position, rotation and depth. Shapes
//! are expressed in the drawable's local frame. Clearing a drawable drops its shapes but keeps
//! the drawable (and its depth) alive for the next redraw.

use std::collections::BTreeMap;

use tracing::warn;

use crate::math::{Rgba, ScreenPoint, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DrawableId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// Closed outline through the points.
    Polygon(Vec<ScreenPoint>),
    /// Rectangle with its top-left corner at the local origin.
    Rect { width: f32, height: f32 },
    /// Open line through the points.
    Polyline(Vec<ScreenPoint>),
    Circle { center: ScreenPoint, radius: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Rgba,
    pub width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Style {
    pub fill: Option<Rgba>,
    pub stroke: Option<Stroke>,
}

impl Style {
    pub fn fill(color: Rgba) -> Self {
        Self {
            fill: Some(color),
            stroke: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub primitive: Primitive,
    pub style: Style,
}

impl Shape {
    pub fn new(primitive: Primitive, style: Style) -> Self {
        Self { primitive, style }
    }
}

/// What the reconciler needs from a rendering backend.
pub trait DrawingSurface {
    /// Current pixel size; queried on demand, never cached by callers.
    fn viewport(&self) -> Viewport;

    /// Creates an empty drawable at the origin, depth 0.
    fn create(&mut self) -> DrawableId;

    fn set_position(&mut self, id: DrawableId, position: ScreenPoint);

    /// Radians, clockwise on screen.
    fn set_rotation(&mut self, id: DrawableId, radians: f32);

    /// Larger depth draws in front.
    fn set_depth(&mut self, id: DrawableId, depth: i32);

    /// Removes every shape, keeping the drawable.
    fn clear(&mut self, id: DrawableId);

    fn draw(&mut self, id: DrawableId, shape: Shape);

    fn destroy(&mut self, id: DrawableId);
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Drawable {
    pub position: ScreenPoint,
    pub rotation: f32,
    pub depth: i32,
    pub shapes: Vec<Shape>,
}

impl Drawable {
    /// Maps a point from this drawable's local frame to screen space.
    pub fn to_screen(&self, local: ScreenPoint) -> ScreenPoint {
        self.position + local.rotated(self.rotation)
    }
}

/// Keeps every drawable in memory. Backends that redraw each frame read it back to front.
#[derive(Debug, Clone, Default)]
pub struct RetainedSurface {
    viewport: Viewport,
    next_id: u64,
    drawables: BTreeMap<DrawableId, Drawable>,
}

impl RetainedSurface {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            next_id: 0,
            drawables: BTreeMap::new(),
        }
    }

    /// Follows the size of the container the surface is shown in.
    ///
    /// Existing drawables keep their pixel positions until the next tick recomputes them.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn get(&self, id: DrawableId) -> Option<&Drawable> {
        self.drawables.get(&id)
    }

    pub fn contains(&self, id: DrawableId) -> bool {
        self.drawables.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.drawables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawables.is_empty()
    }

    /// Drawables in paint order: ascending depth, then creation order.
    pub fn back_to_front(&self) -> Vec<(DrawableId, &Drawable)> {
        let mut ordered: Vec<_> = self.drawables.iter().map(|(id, d)| (*id, d)).collect();
        ordered.sort_by_key(|(id, drawable)| (drawable.depth, *id));
        ordered
    }

    fn drawable_mut(&mut self, id: DrawableId, op: &'static str) -> Option<&mut Drawable> {
        let drawable = self.drawables.get_mut(&id);
        if drawable.is_none() {
            warn!(drawable = id.0, op, "unknown drawable");
        }
        drawable
    }
}

impl DrawingSurface for RetainedSurface {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn create(&mut self) -> DrawableId {
        let id = DrawableId(self.next_id);
        self.next_id += 1;
        self.drawables.insert(id, Drawable::default());
        id
    }

    fn set_position(&mut self, id: DrawableId, position: ScreenPoint) {
        if let Some(drawable) = self.drawable_mut(id, "set_position") {
            drawable.position = position;
        }
    }

    fn set_rotation(&mut self, id: DrawableId, radians: f32) {
        if let Some(drawable) = self.drawable_mut(id, "set_rotation") {
            drawable.rotation = radians;
        }
    }

    fn set_depth(&mut self, id: DrawableId, depth: i32) {
        if let Some(drawable) = self.drawable_mut(id, "set_depth") {
            drawable.depth = depth;
        }
    }

    fn clear(&mut self, id: DrawableId) {
        if let Some(drawable) = self.drawable_mut(id, "clear") {
            drawable.shapes.clear();
        }
    }

    fn draw(&mut self, id: DrawableId, shape: Shape) {
        if let Some(drawable) = self.drawable_mut(id, "draw") {
            drawable.shapes.push(shape);
        }
    }

    fn destroy(&mut self, id: DrawableId) {
        if self.drawables.remove(&id).is_none() {
            warn!(drawable = id.0, op = "destroy", "unknown drawable");
        }
    }
}
