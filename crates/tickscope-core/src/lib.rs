//! Incremental scene reconciliation for streamed 2D world snapshots.
//!
//! A state stream emits partial world-state messages (one per tick, sometimes several per tick).
//! This crate turns that sequence into a persistent scene:
//! - every entity keeps exactly one visual handle, keyed by its stable identity,
//! - agents glide toward their latest position (per-tick exponential smoothing),
//! - planned routes are drawn as a line plus start/intermediate/final waypoint markers,
//! - obstacles are placed once and never touched again,
//! - entities that stop appearing are retired (configurable).
//!
//! Rendering is behind the [`DrawingSurface`] trait. [`RetainedSurface`] is an in-memory
//! implementation used by headless tools, tests, and engine adapters that redraw a retained scene
//! every frame.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod composer;
pub mod config;
pub mod error;
pub mod interpolate;
pub mod mapper;
pub mod math;
pub mod overlay;
pub mod protocol;
pub mod reconcile;
pub mod registry;
pub mod session;
pub mod snapshot;
pub mod surface;

pub use composer::{Layer, LayerOrder, SceneComposer};
pub use config::{Palette, RetireConfig, ScopeConfig, StreamConfig};
pub use error::{ConfigError, DecodeError, ParseRgbaError, RegistryError};
pub use interpolate::{Interpolator, DEFAULT_SMOOTHING};
pub use mapper::{map_to_screen, CoordinateMapper, DEFAULT_WORLD_EXTENT};
pub use math::{Rgba, ScreenPoint, ScreenRect, SimPoint, Viewport};
pub use overlay::{MarkerClass, MarkerStyle, OverlayStyle, PathOverlay};
pub use protocol::EntityId;
pub use reconcile::{
    AgentHandle, ObstacleHandle, ReconcileReport, Reconciler, RetirePolicy, SceneStyle,
    DEFAULT_GRACE_TICKS,
};
pub use registry::{EntityKind, EntityRegistry, VisualHandle};
pub use session::{MessageOutcome, Session, SessionStats};
pub use snapshot::{AgentDelta, EntityDelta, ObstacleDelta, WorldSnapshot};
pub use surface::{
    Drawable, DrawableId, DrawingSurface, Primitive, RetainedSurface, Shape, Stroke, Style,
};
