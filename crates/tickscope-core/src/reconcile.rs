//! Per-snapshot reconciliation: one pass creates, updates, and retires visual handles.

use tracing::trace;

use crate::composer::{Layer, LayerOrder, SceneComposer};
use crate::config::{Palette, ScopeConfig};
use crate::error::{ConfigError, RegistryError};
use crate::interpolate::Interpolator;
use crate::mapper::CoordinateMapper;
use crate::math::{Rgba, ScreenPoint, ScreenRect, SimPoint, Viewport};
use crate::overlay::{MarkerStyle, OverlayStyle, PathOverlay};
use crate::registry::{EntityKind, EntityRegistry, VisualHandle};
use crate::snapshot::{AgentDelta, EntityDelta, ObstacleDelta, WorldSnapshot};
use crate::surface::{DrawableId, DrawingSurface, Primitive, Shape, Stroke, Style};

/// Agent glyph in its local frame: a triangle around the pivot, tip pointing up (-y).
pub const AGENT_GLYPH: [ScreenPoint; 3] = [
    ScreenPoint::new(0.0, -5.0),
    ScreenPoint::new(-5.0, 5.0),
    ScreenPoint::new(5.0, 5.0),
];

/// Ticks an entity may be missing before it is retired: one second at the producer's 50 ms tick.
/// The producer only re-sends agents that moved, so idle agents go quiet for a while.
pub const DEFAULT_GRACE_TICKS: u64 = 20;

/// What happens to handles whose entity stops appearing in snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetirePolicy {
    /// Handles live for the whole session.
    Keep,
    /// Retire a handle once it was missing from more than `grace_ticks` completed ticks.
    ///
    /// A tick is complete when a message with a later tick arrives; the producer may split one
    /// tick over several messages, so nothing is judged before then.
    Sweep { grace_ticks: u64 },
}

impl Default for RetirePolicy {
    fn default() -> Self {
        RetirePolicy::Sweep {
            grace_ticks: DEFAULT_GRACE_TICKS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneStyle {
    pub agent: Rgba,
    pub agent_stalled: Rgba,
    pub obstacle: Rgba,
    pub overlay: OverlayStyle,
}

impl Default for SceneStyle {
    fn default() -> Self {
        Self::from_palette(&Palette::default())
    }
}

impl SceneStyle {
    pub fn from_palette(palette: &Palette) -> Self {
        let radii = OverlayStyle::default();
        Self {
            agent: palette.agent,
            agent_stalled: palette.agent_stalled,
            obstacle: palette.obstacle,
            overlay: OverlayStyle {
                line: Stroke {
                    color: palette.path_line,
                    width: radii.line.width,
                },
                start: MarkerStyle {
                    color: palette.marker_start,
                    radius: radii.start.radius,
                },
                intermediate: MarkerStyle {
                    color: palette.marker_intermediate,
                    radius: radii.intermediate.radius,
                },
                destination: MarkerStyle {
                    color: palette.marker_final,
                    radius: radii.destination.radius,
                },
            },
        }
    }

    fn agent_color(&self, stalled: bool) -> Rgba {
        if stalled {
            self.agent_stalled
        } else {
            self.agent
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentHandle {
    pub drawable: DrawableId,
    /// Smoothed screen position.
    pub position: ScreenPoint,
    pub rotation: f32,
    pub stalled: bool,
    pub overlay: PathOverlay,
    pub last_seen: u64,
}

impl VisualHandle for AgentHandle {
    fn release(&self, surface: &mut dyn DrawingSurface) {
        surface.destroy(self.drawable);
        self.overlay.release(surface);
    }
}

/// Static geometry: never changes after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct ObstacleHandle {
    pub drawable: DrawableId,
    pub rect: ScreenRect,
    pub last_seen: u64,
}

impl VisualHandle for ObstacleHandle {
    fn release(&self, surface: &mut dyn DrawingSurface) {
        surface.destroy(self.drawable);
    }
}

trait Sighted {
    fn last_seen(&self) -> u64;
}

impl Sighted for AgentHandle {
    fn last_seen(&self) -> u64 {
        self.last_seen
    }
}

impl Sighted for ObstacleHandle {
    fn last_seen(&self) -> u64 {
        self.last_seen
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileReport {
    pub tick: u64,
    pub agents_created: usize,
    pub agents_updated: usize,
    pub obstacles_created: usize,
    pub entries_ignored: usize,
    pub retired: usize,
}

/// Single writer of the scene: owns both registries and every handle in them.
#[derive(Debug)]
pub struct Reconciler {
    mapper: CoordinateMapper,
    interpolator: Interpolator,
    composer: SceneComposer,
    style: SceneStyle,
    retire: RetirePolicy,
    agents: EntityRegistry<AgentHandle>,
    obstacles: EntityRegistry<ObstacleHandle>,
    /// Highest tick seen so far.
    current_tick: Option<u64>,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(
            CoordinateMapper::default(),
            Interpolator::default(),
            SceneComposer::default(),
            SceneStyle::default(),
            RetirePolicy::default(),
        )
    }
}

impl Reconciler {
    pub fn new(
        mapper: CoordinateMapper,
        interpolator: Interpolator,
        composer: SceneComposer,
        style: SceneStyle,
        retire: RetirePolicy,
    ) -> Self {
        Self {
            mapper,
            interpolator,
            composer,
            style,
            retire,
            agents: EntityRegistry::new(EntityKind::Agent),
            obstacles: EntityRegistry::new(EntityKind::Obstacle),
            current_tick: None,
        }
    }

    pub fn from_config(config: &ScopeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let order = if config.layers.markers_over_agents {
            LayerOrder::markers_over_agents()
        } else {
            LayerOrder::default()
        };
        Ok(Self::new(
            CoordinateMapper::new(config.world_extent),
            Interpolator::new(config.smoothing),
            SceneComposer::new(order),
            SceneStyle::from_palette(&config.palette),
            config.retire_policy(),
        ))
    }

    pub fn agents(&self) -> &EntityRegistry<AgentHandle> {
        &self.agents
    }

    pub fn obstacles(&self) -> &EntityRegistry<ObstacleHandle> {
        &self.obstacles
    }

    pub fn composer(&self) -> &SceneComposer {
        &self.composer
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    pub fn apply(
        &mut self,
        snapshot: &WorldSnapshot,
        surface: &mut dyn DrawingSurface,
    ) -> Result<ReconcileReport, RegistryError> {
        let mut report = ReconcileReport {
            tick: snapshot.tick,
            entries_ignored: snapshot.ignored,
            ..ReconcileReport::default()
        };
        let viewport = surface.viewport();

        for delta in &snapshot.entities {
            match delta {
                EntityDelta::Agent(agent) => {
                    if self.apply_agent(agent, snapshot.tick, viewport, surface)? {
                        report.agents_created += 1;
                    } else {
                        report.agents_updated += 1;
                    }
                }
                EntityDelta::Obstacle(obstacle) => {
                    if self.apply_obstacle(obstacle, snapshot.tick, viewport, surface)? {
                        report.obstacles_created += 1;
                    }
                }
            }
        }

        // Sweep once per tick, when the first message of a newer tick closes the previous one.
        let completed = self.current_tick.filter(|current| snapshot.tick > *current);
        if self.current_tick.map_or(true, |current| snapshot.tick > current) {
            self.current_tick = Some(snapshot.tick);
        }
        if let (RetirePolicy::Sweep { grace_ticks }, Some(completed)) = (self.retire, completed) {
            report.retired = sweep(&mut self.agents, completed, grace_ticks, surface)
                + sweep(&mut self.obstacles, completed, grace_ticks, surface);
        }

        Ok(report)
    }

    /// Returns `true` when the agent was seen for the first time.
    fn apply_agent(
        &mut self,
        delta: &AgentDelta,
        tick: u64,
        viewport: Viewport,
        surface: &mut dyn DrawingSurface,
    ) -> Result<bool, RegistryError> {
        let target = self.mapper.map(delta.position, viewport);
        let heading = delta.heading as f32;

        if let Some(handle) = self.agents.get_mut(&delta.id) {
            handle.rotation = heading;
            handle.position = self.interpolator.step(handle.position, target);
            handle.last_seen = handle.last_seen.max(tick);
            surface.set_rotation(handle.drawable, handle.rotation);
            surface.set_position(handle.drawable, handle.position);
            if handle.stalled != delta.stalled {
                handle.stalled = delta.stalled;
                draw_agent_glyph(surface, handle.drawable, self.style.agent_color(delta.stalled));
            }
            update_route(
                &mut handle.overlay,
                surface,
                &self.composer,
                &self.style.overlay,
                &self.mapper,
                viewport,
                target,
                delta.path.as_deref(),
            );
            return Ok(false);
        }

        let drawable = self.composer.create(surface, Layer::Agents);
        draw_agent_glyph(surface, drawable, self.style.agent_color(delta.stalled));
        surface.set_position(drawable, target);
        surface.set_rotation(drawable, heading);

        let mut handle = AgentHandle {
            drawable,
            position: target,
            rotation: heading,
            stalled: delta.stalled,
            overlay: PathOverlay::default(),
            last_seen: tick,
        };
        update_route(
            &mut handle.overlay,
            surface,
            &self.composer,
            &self.style.overlay,
            &self.mapper,
            viewport,
            target,
            delta.path.as_deref(),
        );
        trace!(agent = %delta.id, x = target.x, y = target.y, "agent created");
        self.agents.insert(delta.id.clone(), handle)?;
        Ok(true)
    }

    /// Returns `true` when the obstacle was created. Known obstacles are never redrawn.
    fn apply_obstacle(
        &mut self,
        delta: &ObstacleDelta,
        tick: u64,
        viewport: Viewport,
        surface: &mut dyn DrawingSurface,
    ) -> Result<bool, RegistryError> {
        if let Some(handle) = self.obstacles.get_mut(&delta.id) {
            handle.last_seen = handle.last_seen.max(tick);
            return Ok(false);
        }

        let rect = self
            .mapper
            .map_bounds(delta.bounds_min, delta.bounds_max, viewport);
        let drawable = self.composer.create(surface, Layer::Obstacles);
        surface.set_position(drawable, rect.origin);
        surface.draw(
            drawable,
            Shape::new(
                Primitive::Rect {
                    width: rect.width,
                    height: rect.height,
                },
                Style::fill(self.style.obstacle),
            ),
        );
        trace!(obstacle = %delta.id, "obstacle created");
        self.obstacles.insert(
            delta.id.clone(),
            ObstacleHandle {
                drawable,
                rect,
                last_seen: tick,
            },
        )?;
        Ok(true)
    }
}

fn draw_agent_glyph(surface: &mut dyn DrawingSurface, drawable: DrawableId, color: Rgba) {
    surface.clear(drawable);
    surface.draw(
        drawable,
        Shape::new(Primitive::Polygon(AGENT_GLYPH.to_vec()), Style::fill(color)),
    );
}

#[allow(clippy::too_many_arguments)]
fn update_route(
    overlay: &mut PathOverlay,
    surface: &mut dyn DrawingSurface,
    composer: &SceneComposer,
    style: &OverlayStyle,
    mapper: &CoordinateMapper,
    viewport: Viewport,
    anchor: ScreenPoint,
    path: Option<&[SimPoint]>,
) {
    let waypoints: Vec<ScreenPoint> = path
        .unwrap_or_default()
        .iter()
        .map(|point| mapper.map(*point, viewport))
        .collect();
    overlay.update(surface, composer, style, anchor, &waypoints);
}

/// Retires every handle last seen more than `grace_ticks` ticks before `completed`.
fn sweep<H: VisualHandle + Sighted>(
    registry: &mut EntityRegistry<H>,
    completed: u64,
    grace_ticks: u64,
    surface: &mut dyn DrawingSurface,
) -> usize {
    let mut retired = 0;
    for id in registry.all_ids() {
        let stale = registry
            .get(&id)
            .is_some_and(|handle| handle.last_seen().saturating_add(grace_ticks) < completed);
        if stale && registry.remove_if_present(&id, surface) {
            trace!(kind = %registry.kind(), id = %id, "retired");
            retired += 1;
        }
    }
    retired
}
