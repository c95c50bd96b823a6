use crate::surface::{DrawableId, DrawingSurface};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Obstacles,
    PathLines,
    WaypointMarkers,
    Agents,
}

/// Layers from back to front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerOrder([Layer; 4]);

impl Default for LayerOrder {
    fn default() -> Self {
        Self([
            Layer::Obstacles,
            Layer::PathLines,
            Layer::WaypointMarkers,
            Layer::Agents,
        ])
    }
}

impl LayerOrder {
    /// Waypoint markers drawn over the agents instead of under them.
    pub fn markers_over_agents() -> Self {
        Self([
            Layer::Obstacles,
            Layer::PathLines,
            Layer::Agents,
            Layer::WaypointMarkers,
        ])
    }

    fn index(&self, layer: Layer) -> usize {
        self.0
            .iter()
            .position(|l| *l == layer)
            .unwrap_or(self.0.len())
    }
}

/// Owns draw order: every drawable is placed on a layer, and layers map to explicit depths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SceneComposer {
    order: LayerOrder,
}

impl SceneComposer {
    pub fn new(order: LayerOrder) -> Self {
        Self { order }
    }

    pub fn depth(&self, layer: Layer) -> i32 {
        self.order.index(layer) as i32
    }

    pub fn place(&self, surface: &mut dyn DrawingSurface, id: DrawableId, layer: Layer) {
        surface.set_depth(id, self.depth(layer));
    }

    /// Creates a drawable already placed on `layer`.
    pub fn create(&self, surface: &mut dyn DrawingSurface, layer: Layer) -> DrawableId {
        let id = surface.create();
        self.place(surface, id, layer);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_order_puts_obstacles_back_and_agents_front() {
        let composer = SceneComposer::default();
        assert!(composer.depth(Layer::Obstacles) < composer.depth(Layer::PathLines));
        assert!(composer.depth(Layer::PathLines) < composer.depth(Layer::WaypointMarkers));
        assert!(composer.depth(Layer::WaypointMarkers) < composer.depth(Layer::Agents));
    }

    #[test]
    fn marker_variant_puts_markers_over_agents() {
        let composer = SceneComposer::new(LayerOrder::markers_over_agents());
        assert!(composer.depth(Layer::WaypointMarkers) > composer.depth(Layer::Agents));
        assert!(composer.depth(Layer::Agents) > composer.depth(Layer::PathLines));
        assert_eq!(composer.depth(Layer::Obstacles), 0);
    }
}
