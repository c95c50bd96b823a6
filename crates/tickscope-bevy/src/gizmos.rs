//! Gizmo presentation of the retained scene.
//!
//! Gizmos only draw outlines: filled shapes are outlined in their fill colour and stroke widths
//! are ignored. Draw calls are issued back to front.

use bevy_app::{App, Plugin, Update};
use bevy_color::Color;
use bevy_ecs::prelude::*;
use bevy_gizmos::gizmos::Gizmos;
use bevy_math::{Isometry2d, Vec2};
use tickscope_core::{Drawable, DrawingSurface, Primitive, Rgba, ScreenPoint, Shape, Viewport};

use crate::{ScopeSurface, TickscopeSet};

/// Adds [`draw_scene`]. Requires Bevy's gizmo plugin (part of `DefaultPlugins`).
#[derive(Debug, Clone, Copy, Default)]
pub struct TickscopeGizmoPlugin;

impl Plugin for TickscopeGizmoPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, draw_scene.in_set(TickscopeSet::Present));
    }
}

/// Pixel space (top-left origin, y down) to 2D world space (centre origin, y up).
pub fn screen_to_world(point: ScreenPoint, viewport: Viewport) -> Vec2 {
    Vec2::new(
        point.x - viewport.width / 2.0,
        viewport.height / 2.0 - point.y,
    )
}

fn color_from_rgba(rgba: Rgba) -> Color {
    Color::srgba_u8(rgba.r, rgba.g, rgba.b, rgba.a)
}

pub fn draw_scene(surface: Res<ScopeSurface>, mut gizmos: Gizmos) {
    let viewport = surface.0.viewport();
    for (_, drawable) in surface.0.back_to_front() {
        for shape in &drawable.shapes {
            draw_shape(&mut gizmos, drawable, shape, viewport);
        }
    }
}

fn draw_shape(gizmos: &mut Gizmos, drawable: &Drawable, shape: &Shape, viewport: Viewport) {
    let Some(rgba) = shape
        .style
        .stroke
        .map(|stroke| stroke.color)
        .or(shape.style.fill)
    else {
        return;
    };
    let color = color_from_rgba(rgba);
    let world = |local: ScreenPoint| screen_to_world(drawable.to_screen(local), viewport);

    match &shape.primitive {
        Primitive::Polygon(points) => {
            let closed = points.iter().chain(points.first()).map(|p| world(*p));
            gizmos.linestrip_2d(closed, color);
        }
        Primitive::Rect { width, height } => {
            let corners = [
                ScreenPoint::ZERO,
                ScreenPoint::new(*width, 0.0),
                ScreenPoint::new(*width, *height),
                ScreenPoint::new(0.0, *height),
                ScreenPoint::ZERO,
            ];
            gizmos.linestrip_2d(corners.into_iter().map(world), color);
        }
        Primitive::Polyline(points) => {
            gizmos.linestrip_2d(points.iter().map(|p| world(*p)), color);
        }
        Primitive::Circle { center, radius } => {
            gizmos.circle_2d(Isometry2d::from_translation(world(*center)), *radius, color);
        }
    }
}
