//! Per-agent route overlay: a polyline from the agent through its waypoints, plus one marker per
//! waypoint.
//!
//! Both drawables are created lazily the first time a route shows up and are reused afterwards
//! (cleared and redrawn), so their depth never churns.

use crate::composer::{Layer, SceneComposer};
use crate::math::{Rgba, ScreenPoint};
use crate::surface::{DrawableId, DrawingSurface, Primitive, Shape, Stroke, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerClass {
    /// First waypoint of the remaining route.
    Start,
    Intermediate,
    /// Destination. A single-waypoint route is just a destination.
    Final,
}

impl MarkerClass {
    pub fn classify(index: usize, len: usize) -> Self {
        if index + 1 >= len {
            MarkerClass::Final
        } else if index == 0 {
            MarkerClass::Start
        } else {
            MarkerClass::Intermediate
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    pub color: Rgba,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub line: Stroke,
    pub start: MarkerStyle,
    pub intermediate: MarkerStyle,
    pub destination: MarkerStyle,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            line: Stroke {
                color: Rgba::rgb(0x44aaff),
                width: 1.0,
            },
            start: MarkerStyle {
                color: Rgba::rgb(0x33dd66),
                radius: 3.0,
            },
            intermediate: MarkerStyle {
                color: Rgba::rgb(0xaaaaaa),
                radius: 2.0,
            },
            destination: MarkerStyle {
                color: Rgba::rgb(0xff3366),
                radius: 5.0,
            },
        }
    }
}

impl OverlayStyle {
    pub fn marker(&self, class: MarkerClass) -> MarkerStyle {
        match class {
            MarkerClass::Start => self.start,
            MarkerClass::Intermediate => self.intermediate,
            MarkerClass::Final => self.destination,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathOverlay {
    line: Option<DrawableId>,
    markers: Option<DrawableId>,
}

impl PathOverlay {
    pub fn line(&self) -> Option<DrawableId> {
        self.line
    }

    pub fn markers(&self) -> Option<DrawableId> {
        self.markers
    }

    /// Redraws the route from `anchor` through `waypoints` (screen space).
    ///
    /// An empty route clears the markers only; the line keeps whatever it showed last.
    pub fn update(
        &mut self,
        surface: &mut dyn DrawingSurface,
        composer: &SceneComposer,
        style: &OverlayStyle,
        anchor: ScreenPoint,
        waypoints: &[ScreenPoint],
    ) {
        if waypoints.is_empty() {
            if let Some(markers) = self.markers {
                surface.clear(markers);
            }
            return;
        }

        let line = *self
            .line
            .get_or_insert_with(|| composer.create(surface, Layer::PathLines));
        surface.clear(line);
        let mut points = Vec::with_capacity(waypoints.len() + 1);
        points.push(anchor);
        points.extend_from_slice(waypoints);
        surface.draw(
            line,
            Shape::new(
                Primitive::Polyline(points),
                Style {
                    fill: None,
                    stroke: Some(style.line),
                },
            ),
        );

        let markers = *self
            .markers
            .get_or_insert_with(|| composer.create(surface, Layer::WaypointMarkers));
        surface.clear(markers);
        for (index, center) in waypoints.iter().enumerate() {
            let marker = style.marker(MarkerClass::classify(index, waypoints.len()));
            surface.draw(
                markers,
                Shape::new(
                    Primitive::Circle {
                        center: *center,
                        radius: marker.radius,
                    },
                    Style::fill(marker.color),
                ),
            );
        }
    }

    pub fn release(&self, surface: &mut dyn DrawingSurface) {
        for id in [self.line, self.markers].into_iter().flatten() {
            surface.destroy(id);
        }
    }
}
