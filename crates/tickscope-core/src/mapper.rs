use crate::math::{ScreenPoint, ScreenRect, SimPoint, Viewport};

pub const DEFAULT_WORLD_EXTENT: f64 = 100.0;

/// Maps simulation coordinates onto a viewport of the given pixel size.
///
/// `world_extent` is the simulation length spanning the full viewport on both axes. No clamping:
/// points outside `[0, world_extent)` land outside the viewport and are left for the surface to
/// clip.
pub fn map_to_screen(
    sim_x: f64,
    sim_z: f64,
    viewport_width: f32,
    viewport_height: f32,
    world_extent: f64,
) -> ScreenPoint {
    ScreenPoint::new(
        ((sim_x / world_extent) * viewport_width as f64) as f32,
        ((sim_z / world_extent) * viewport_height as f64) as f32,
    )
}

/// [`map_to_screen`] bound to one deployment's world extent.
///
/// The viewport is passed on every call: the surface may be resized at any time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    world_extent: f64,
}

impl Default for CoordinateMapper {
    fn default() -> Self {
        Self::new(DEFAULT_WORLD_EXTENT)
    }
}

impl CoordinateMapper {
    pub fn new(world_extent: f64) -> Self {
        assert!(
            world_extent.is_finite() && world_extent > 0.0,
            "world_extent must be > 0"
        );
        Self { world_extent }
    }

    pub fn world_extent(&self) -> f64 {
        self.world_extent
    }

    pub fn map(&self, point: SimPoint, viewport: Viewport) -> ScreenPoint {
        map_to_screen(
            point.x,
            point.z,
            viewport.width,
            viewport.height,
            self.world_extent,
        )
    }

    /// Maps an axis-aligned box given by two opposite corners in any order.
    pub fn map_bounds(&self, a: SimPoint, b: SimPoint, viewport: Viewport) -> ScreenRect {
        let min = SimPoint::new(a.x.min(b.x), a.z.min(b.z));
        let max = SimPoint::new(a.x.max(b.x), a.z.max(b.z));
        let origin = self.map(min, viewport);
        let far = self.map(max, viewport);
        ScreenRect {
            origin,
            width: far.x - origin.x,
            height: far.y - origin.y,
        }
    }
}
