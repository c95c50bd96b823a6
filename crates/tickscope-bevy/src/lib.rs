//! Bevy adapter for `tickscope-core`.
//!
//! The plugin owns one [`Session`] and one [`RetainedSurface`] as resources and feeds them from a
//! [`StateStream`] once per frame:
//! - every pending message is reconciled synchronously, in arrival order, before anything draws,
//! - the surface viewport follows the primary window,
//! - the tick readout is written to the primary window title.
//!
//! Presentation is separate: [`TickscopeGizmoPlugin`] (feature `gizmos`) redraws the retained scene
//! with 2D gizmos every frame, whether or not a message arrived.
//!
//! ## Scheduling
//!
//! Everything runs in [`bevy_app::Update`]: [`TickscopeSet::Ingest`] then
//! [`TickscopeSet::Present`]. Messages are not tied to the fixed timestep; the producer's tick
//! rate drives the scene, the frame rate only drives presentation.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

use std::sync::{Mutex, MutexGuard, PoisonError};

use bevy_app::{App, Plugin, Update};
use bevy_ecs::prelude::{Resource, SystemSet};
use bevy_ecs::schedule::IntoScheduleConfigs;
use tickscope_core::{RetainedSurface, ScopeConfig, Session};
use tickscope_stream::StateStream;
use tracing::error;

mod systems;

#[cfg(feature = "gizmos")]
#[cfg_attr(docsrs, doc(cfg(feature = "gizmos")))]
pub mod gizmos;

#[cfg(feature = "gizmos")]
#[cfg_attr(docsrs, doc(cfg(feature = "gizmos")))]
pub use gizmos::{screen_to_world, TickscopeGizmoPlugin};

pub use systems::{pump_state_stream, sync_viewport, update_window_title};

/// The visualization session. Single writer: only [`pump_state_stream`] mutates it.
#[derive(Resource, Debug, Default)]
pub struct ScopeSession(pub Session);

/// Retained scene the session draws into and the presenter reads from.
#[derive(Resource, Debug, Default)]
pub struct ScopeSurface(pub RetainedSurface);

/// Open state stream. Absent means idle; removed once the stream closes.
#[derive(Resource, Debug)]
pub struct ScopeStream(Mutex<StateStream>);

impl ScopeStream {
    pub fn new(stream: StateStream) -> Self {
        Self(Mutex::new(stream))
    }

    pub fn lock(&self) -> MutexGuard<'_, StateStream> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Idle,
    Open,
    Closed {
        reason: String,
    },
}

#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamStatus {
    pub connection: ConnectionState,
    /// Messages received, including ones that were dropped.
    pub messages: u64,
}

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum TickscopeSet {
    Ingest,
    Present,
}

#[derive(Debug, Clone, Default)]
pub struct TickscopePlugin {
    config: ScopeConfig,
}

impl TickscopePlugin {
    pub fn new(config: ScopeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScopeConfig {
        &self.config
    }
}

impl Plugin for TickscopePlugin {
    fn build(&self, app: &mut App) {
        let session = Session::from_config(&self.config).unwrap_or_else(|err| {
            error!(error = %err, "invalid tickscope config; falling back to defaults");
            Session::default()
        });

        app.insert_resource(ScopeSession(session));
        app.insert_resource(ScopeSurface(RetainedSurface::new(self.config.viewport)));
        app.init_resource::<StreamStatus>();

        app.configure_sets(Update, (TickscopeSet::Ingest, TickscopeSet::Present).chain());
        app.add_systems(
            Update,
            (sync_viewport, pump_state_stream, update_window_title)
                .chain()
                .in_set(TickscopeSet::Ingest),
        );
    }
}
